//! External identity collaborator for UserAuth
//!
//! The login and signup screens only see [`IdentityProvider`]: a sign-in
//! exchange with three terminal outcomes, sign-out, and a signed-in check.
//! [`GoogleIdentity`] implements it with Google's OAuth 2.0 flow.

pub mod constants;
pub mod flow;
pub mod google;
pub mod storage;
pub mod tokens;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use flow::{CallbackResult, OAuthFlow};
pub use google::GoogleIdentity;
pub use storage::{SessionStorage, StoredSession};
pub use tokens::TokenPair;

/// Profile of a federated user after a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    /// Provider-side stable user id
    pub provider_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
}

/// Terminal outcome of a sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Success(SignedInUser),
    Failure(String),
    /// The user backed out; not an error
    Cancelled,
}

/// Remote sign-in exchange, injected into the state holders
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> SignInOutcome;

    async fn sign_out(&self) -> anyhow::Result<()>;

    fn is_signed_in(&self) -> bool;
}
