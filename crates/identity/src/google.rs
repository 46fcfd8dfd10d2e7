//! Google implementation of [`IdentityProvider`]

use anyhow::Result;
use async_trait::async_trait;
use common::GoogleConfig;
use tracing::{info, warn};

use crate::flow::{CallbackResult, OAuthFlow};
use crate::storage::SessionStorage;
use crate::tokens::{fetch_user_profile, revoke_token};
use crate::{IdentityProvider, SignInOutcome, SignedInUser};

/// Signs users in with their Google account through the system browser
pub struct GoogleIdentity {
    config: GoogleConfig,
    storage: SessionStorage,
    client: reqwest::Client,
}

impl GoogleIdentity {
    pub fn new(config: GoogleConfig, storage: SessionStorage) -> Self {
        Self {
            config,
            storage,
            client: reqwest::Client::new(),
        }
    }

    /// The persisted signed-in user, if any
    pub fn current_user(&self) -> Option<SignedInUser> {
        match self.storage.load() {
            Ok(session) => session.map(|s| s.user),
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                None
            }
        }
    }

    async fn run_flow(&self) -> Result<SignInOutcome> {
        let flow = OAuthFlow::new(&self.config);
        let url = flow.authorization_url();

        info!("Opening browser for Google sign-in");
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser ({}); visit this URL to continue: {}", e, url);
        }

        let code = match flow.wait_for_callback().await? {
            CallbackResult::Code(code) => code,
            CallbackResult::Denied => return Ok(SignInOutcome::Cancelled),
        };

        let tokens = flow.exchange_code(&self.client, &code).await?;
        let user = fetch_user_profile(&self.client, &tokens.access_token).await?;
        self.storage.save(&user, &tokens)?;

        info!("Successfully signed in as {}", user.email);
        Ok(SignInOutcome::Success(user))
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    async fn sign_in(&self) -> SignInOutcome {
        if let Some(user) = self.current_user() {
            info!("Already signed in as {}", user.email);
            return SignInOutcome::Success(user);
        }

        if !self.config.is_configured() {
            return SignInOutcome::Failure("Google sign-in is not configured".to_string());
        }

        match self.run_flow().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Google sign-in failed: {:#}", e);
                SignInOutcome::Failure(e.to_string())
            }
        }
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.storage.load()? {
            if let Err(e) = revoke_token(&self.client, &session.tokens.access_token).await {
                warn!("Could not revoke Google token: {}", e);
            }
            info!("Signing out {}", session.user.email);
        }

        self.storage.clear()?;
        Ok(())
    }

    fn is_signed_in(&self) -> bool {
        self.current_user().is_some()
    }
}
