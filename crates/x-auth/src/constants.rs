//! X (Twitter) OAuth 2.0 constants
//!
//! Fixed provider endpoints and the scope set this integration requests.
//! Client id and secret are per-application and come from the environment;
//! only the endpoint URLs can be overridden (for staging or tests).

use std::time::Duration;

/// Authorization endpoint the user visits to grant access.
pub const AUTHORIZE_ENDPOINT: &str = "https://x.com/i/oauth2/authorize";

/// Token endpoint for code exchange and token refresh.
pub const TOKEN_ENDPOINT: &str = "https://api.x.com/2/oauth2/token";

/// Redirect URI registered for the app. Nothing listens here; the user copies
/// the URL the browser lands on back into the terminal.
pub const REDIRECT_URI: &str = "http://localhost:3000/callback";

/// Requested scopes, in the order they appear in the authorization URL.
/// `offline.access` is what makes the provider issue a refresh token.
pub const SCOPES: &[&str] = &[
    "tweet.read",
    "tweet.write",
    "users.read",
    "like.write",
    "dm.read",
    "dm.write",
    "offline.access",
];

/// PKCE challenge method: SHA-256 of the verifier.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// A stored access token is only used if it stays valid for at least this long.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Default `token_type` when the provider omits it.
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";
