//! OAuth 2.0 Authorization Code flow with PKCE
//!
//! Implements Google sign-in for a desktop client:
//! 1. Generate PKCE code verifier/challenge
//! 2. Open browser for user authorization
//! 3. Listen for OAuth callback on localhost
//! 4. Exchange authorization code for tokens

use anyhow::{anyhow, Result};
use axum::{
    extract::Query,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::GoogleConfig;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

use crate::constants::*;
use crate::tokens::TokenPair;

/// Generates a cryptographically secure state parameter
fn generate_state() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn pkce_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generates PKCE code verifier and challenge
///
/// Returns (verifier, challenge) tuple
fn generate_pkce() -> (String, String) {
    let verifier: [u8; 32] = rand::thread_rng().gen();
    let verifier_str = URL_SAFE_NO_PAD.encode(verifier);
    let challenge = pkce_challenge(&verifier_str);
    (verifier_str, challenge)
}

/// What the browser redirect carried back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    /// Authorization code to exchange for tokens
    Code(String),
    /// The user closed or declined the consent screen
    Denied,
}

/// Stops the callback server when dropped, including when the waiting
/// future is dropped before the redirect arrives
struct ServerGuard(tokio::task::JoinHandle<()>);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Manages the OAuth 2.0 authorization flow
pub struct OAuthFlow {
    config: GoogleConfig,
    state: String,
    code_verifier: String,
    code_challenge: String,
}

impl OAuthFlow {
    /// Creates a new OAuth flow with fresh PKCE parameters
    pub fn new(config: &GoogleConfig) -> Self {
        let (verifier, challenge) = generate_pkce();
        Self {
            config: config.clone(),
            state: generate_state(),
            code_verifier: verifier,
            code_challenge: challenge,
        }
    }

    /// Returns the authorization URL to open in the browser
    pub fn authorization_url(&self) -> String {
        let scopes = self.config.scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&prompt=select_account",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri()),
            urlencoding::encode(&scopes),
            &self.state,
            &self.code_challenge,
        )
    }

    /// Starts the local callback server and waits for the OAuth redirect
    ///
    /// A temporary HTTP server runs on the configured callback port until
    /// Google redirects the user back, or the wait times out.
    pub async fn wait_for_callback(&self) -> Result<CallbackResult> {
        let expected_state = self.state.clone();
        let (tx, rx) = oneshot::channel::<Result<CallbackResult>>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new().route(
            CALLBACK_PATH,
            get({
                let tx = tx.clone();
                move |Query(params): Query<CallbackParams>| {
                    let tx = tx.clone();
                    let expected_state = expected_state.clone();
                    async move {
                        let (result, page) = resolve_callback(params, &expected_state);
                        if let Some(tx) = tx.lock().await.take() {
                            let _ = tx.send(result);
                        }
                        Html(page).into_response()
                    }
                }
            }),
        );

        let port = self.config.callback_port;
        let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
            .await
            .map_err(|e| {
                anyhow!("Failed to bind OAuth callback port {}: {}. Is another instance running?", port, e)
            })?;

        info!("OAuth callback server listening on port {}", port);

        let server = ServerGuard(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("OAuth callback server error: {}", e);
            }
        }));

        let result = tokio::time::timeout(std::time::Duration::from_secs(CALLBACK_TIMEOUT_SECS), rx).await;
        drop(server);

        result
            .map_err(|_| anyhow!("Sign-in timed out - no callback received within 5 minutes"))?
            .map_err(|_| anyhow!("OAuth callback channel closed unexpectedly"))?
    }

    /// Exchanges the authorization code for tokens
    pub async fn exchange_code(&self, client: &reqwest::Client, code: &str) -> Result<TokenPair> {
        info!("Exchanging authorization code for tokens");

        let redirect_uri = self.config.redirect_uri();
        let response = client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("code_verifier", self.code_verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Token exchange failed: {}", error_text));
        }

        let token_response: TokenResponse = response.json().await?;
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(token_response.expires_in);

        Ok(TokenPair {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            id_token: token_response.id_token,
            expires_at,
        })
    }
}

/// Turns the redirect query into a flow result plus the page to show the user
fn resolve_callback(params: CallbackParams, expected_state: &str) -> (Result<CallbackResult>, &'static str) {
    if params.state.as_deref() != Some(expected_state) {
        warn!("OAuth callback received with invalid state");
        return (Err(anyhow!("Invalid OAuth state - possible CSRF attack")), ERROR_HTML);
    }

    if let Some(error) = params.error {
        if error == ACCESS_DENIED {
            info!("User cancelled Google sign-in");
            return (Ok(CallbackResult::Denied), CANCELLED_HTML);
        }
        error!("OAuth error: {}", error);
        return (Err(anyhow!("OAuth error: {}", error)), ERROR_HTML);
    }

    match params.code {
        Some(code) => {
            info!("OAuth callback received successfully");
            (Ok(CallbackResult::Code(code)), SUCCESS_HTML)
        }
        None => (Err(anyhow!("No authorization code in callback")), ERROR_HTML),
    }
}

/// Query parameters from OAuth callback
#[derive(serde::Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Token endpoint response
#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    expires_in: i64,
}

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>UserAuth - Signed In</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 20vh;">
    <h1>Signed in</h1>
    <p>You can close this window and return to UserAuth.</p>
</body>
</html>"#;

const CANCELLED_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>UserAuth - Sign-in Cancelled</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 20vh;">
    <h1>Sign-in cancelled</h1>
    <p>No account was connected. You can close this window.</p>
</body>
</html>"#;

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>UserAuth - Sign-in Failed</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 20vh;">
    <h1>Sign-in failed</h1>
    <p>An error occurred during authentication. Please try again.</p>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123.apps.googleusercontent.com".into(),
            ..GoogleConfig::default()
        }
    }

    fn params(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(String::from),
            state: state.map(String::from),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_authorization_url() {
        let flow = OAuthFlow::new(&config());
        let url = flow.authorization_url();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains(&format!("state={}", flow.state)));
        assert!(url.contains(&format!("code_challenge={}", flow.code_challenge)));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A51121%2Foauth-callback"));
    }

    #[test]
    fn test_pkce_challenge_matches_verifier() {
        let flow = OAuthFlow::new(&config());
        assert_eq!(pkce_challenge(&flow.code_verifier), flow.code_challenge);
        assert_ne!(flow.code_verifier, OAuthFlow::new(&config()).code_verifier);
    }

    #[test]
    fn test_callback_with_code() {
        let (result, _) = resolve_callback(params(Some("abc"), Some("s1"), None), "s1");
        assert_eq!(result.unwrap(), CallbackResult::Code("abc".into()));
    }

    #[test]
    fn test_callback_access_denied_is_cancel() {
        let (result, page) = resolve_callback(params(None, Some("s1"), Some(ACCESS_DENIED)), "s1");
        assert_eq!(result.unwrap(), CallbackResult::Denied);
        assert_eq!(page, CANCELLED_HTML);
    }

    #[test]
    fn test_callback_rejects_wrong_state() {
        let (result, _) = resolve_callback(params(Some("abc"), Some("other"), None), "s1");
        assert!(result.is_err());

        let (result, _) = resolve_callback(params(Some("abc"), None, None), "s1");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dropped_wait_releases_port() {
        let port = 51987;
        let flow = OAuthFlow::new(&GoogleConfig {
            callback_port: port,
            ..config()
        });

        let task = tokio::spawn(async move { flow.wait_for_callback().await });
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!task.is_finished());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let mut rebound = None;
        for _ in 0..40 {
            if let Ok(listener) = tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
                rebound = Some(listener);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        assert!(rebound.is_some(), "callback port still bound after the wait was dropped");
    }

    #[test]
    fn test_callback_other_error() {
        let (result, page) = resolve_callback(params(None, Some("s1"), Some("server_error")), "s1");
        assert!(result.is_err());
        assert_eq!(page, ERROR_HTML);
    }
}
