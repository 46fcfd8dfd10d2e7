use thiserror::Error;
use user_store::StoreError;

/// Failures a submit can end in. The display text is what the screen shows.
///
/// Field validation never produces one of these; it only sets the form's
/// per-field error flags.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login lookup miss
    #[error("Invalid email or password")]
    NotFound,

    #[error("An account with this email or phone number already exists")]
    DuplicateConstraint,

    /// The identity provider did not sign the user in
    #[error("Google sign-in failed: {0}")]
    RemoteFailure(String),

    #[error("Something went wrong, please try again ({0})")]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateConstraint => AuthError::DuplicateConstraint,
            other => AuthError::Store(other),
        }
    }
}
