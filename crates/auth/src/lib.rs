//! Login and signup logic for UserAuth
//!
//! Front ends drive a [`LoginViewModel`] or [`SignupViewModel`] with field
//! edits and submits, and render whatever the holder's observable state says.
//! The holders own validation, the at-most-one-in-flight submit rule, and the
//! calls into the injected [`user_store::UserStore`] and
//! [`identity::IdentityProvider`].

pub mod error;
pub mod login;
pub mod observable;
pub mod result;
pub mod signup;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::AuthError;
pub use login::{LoginField, LoginState, LoginViewModel};
pub use observable::Observable;
pub use result::{AsyncResult, SubmitOutcome};
pub use signup::{SignupField, SignupState, SignupViewModel};
