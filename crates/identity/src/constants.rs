//! Google OAuth endpoints used by the sign-in flow

/// Google OAuth authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token exchange endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google userinfo endpoint for the signed-in profile
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Token revocation endpoint, hit on sign-out
pub const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Path the loopback server listens on for the redirect
pub const CALLBACK_PATH: &str = "/oauth-callback";

/// How long to wait for the user to finish in the browser
pub const CALLBACK_TIMEOUT_SECS: u64 = 300;

/// OAuth error code Google sends when the user dismisses the consent screen
pub const ACCESS_DENIED: &str = "access_denied";
