//! Token types and the Google profile/revocation calls

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{GOOGLE_REVOKE_URL, GOOGLE_USERINFO_URL};
use crate::SignedInUser;

/// Tokens returned by the authorization code exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// OAuth access token (short-lived, ~1 hour)
    pub access_token: String,

    /// Only present when offline access was granted
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// OpenID Connect ID token
    #[serde(default)]
    pub id_token: Option<String>,

    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

/// Response from Google's userinfo endpoint
#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfo> for SignedInUser {
    fn from(info: UserInfo) -> Self {
        Self {
            provider_id: info.id,
            email: info.email,
            display_name: info.name,
            picture_url: info.picture,
        }
    }
}

/// Fetches the signed-in user's profile with an access token
pub async fn fetch_user_profile(client: &reqwest::Client, access_token: &str) -> Result<SignedInUser> {
    let response = client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("Userinfo request failed: {}", response.status()));
    }

    let info: UserInfo = response.json().await?;
    debug!("Fetched Google profile for {}", info.email);
    Ok(info.into())
}

/// Revokes a token at Google; a token that is already invalid counts as revoked
pub async fn revoke_token(client: &reqwest::Client, token: &str) -> Result<()> {
    let response = client
        .post(GOOGLE_REVOKE_URL)
        .form(&[("token", token)])
        .send()
        .await?;

    let status = response.status();
    if status.is_success() || status == reqwest::StatusCode::BAD_REQUEST {
        return Ok(());
    }

    warn!("Token revocation returned {}", status);
    Err(anyhow!("Token revocation failed: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_userinfo_into_user() {
        let info: UserInfo = serde_json::from_str(
            r#"{"id":"1234","email":"alice@gmail.com","name":"Alice","verified_email":true}"#,
        )
        .unwrap();

        let user = SignedInUser::from(info);
        assert_eq!(user.provider_id, "1234");
        assert_eq!(user.email, "alice@gmail.com");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        assert!(user.picture_url.is_none());
    }

    #[test]
    fn test_token_pair_optional_fields() {
        let pair: TokenPair = serde_json::from_str(
            r#"{"access_token":"a","expires_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert!(pair.refresh_token.is_none());
        assert!(pair.id_token.is_none());
    }
}
