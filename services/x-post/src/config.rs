//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! OAuth client credentials and tokens come only from the environment and
//! are never read from the TOML file.

use common::{Secret, env_secret, env_var};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when nothing else is named.
pub const DEFAULT_CONFIG_FILE: &str = "x-post.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub endpoints: EndpointsConfig,
    pub oauth: OAuthConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

/// Outbound HTTP settings shared by every request
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: x_client::USER_AGENT.to_string(),
        }
    }
}

/// File locations
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub token_file: PathBuf,
    pub audit_log: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from(".x-oauth2-tokens.json"),
            audit_log: PathBuf::from("x-posts-log.json"),
        }
    }
}

/// Provider endpoints (overridable for staging or local mocks)
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub token_url: String,
    pub authorize_url: String,
    pub api_base: String,
    pub upload_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            token_url: x_auth::TOKEN_ENDPOINT.to_string(),
            authorize_url: x_auth::AUTHORIZE_ENDPOINT.to_string(),
            api_base: x_client::API_BASE.to_string(),
            upload_url: x_client::UPLOAD_ENDPOINT.to_string(),
        }
    }
}

/// OAuth flow settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub redirect_uri: String,
    pub refresh_margin_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            redirect_uri: x_auth::REDIRECT_URI.to_string(),
            refresh_margin_secs: x_auth::REFRESH_MARGIN.as_secs(),
        }
    }
}

/// Secrets from the environment
#[derive(Debug, Default)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
    pub access_token: Option<Secret<String>>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            client_id: env_var("X_OAUTH2_CLIENT_ID"),
            client_secret: env_secret("X_OAUTH2_CLIENT_SECRET"),
            refresh_token: env_secret("X_OAUTH2_REFRESH_TOKEN"),
            access_token: env_secret("X_OAUTH2_ACCESS_TOKEN"),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then overlay
    /// environment variables and validate.
    ///
    /// `None` means built-in defaults; a named file that does not exist is an
    /// error.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let mut config = match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p).map_err(|e| {
                    common::Error::Config(format!("failed to read {}: {e}", p.display()))
                })?;
                toml::from_str::<Config>(&contents)?
            }
            None => Config::default(),
        };

        config.credentials = Credentials::from_env();
        if let Some(token_file) = env_var("X_TOKEN_FILE") {
            config.storage.token_file = PathBuf::from(token_file);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }

        for (name, url) in [
            ("endpoints.token_url", &self.endpoints.token_url),
            ("endpoints.authorize_url", &self.endpoints.authorize_url),
            ("endpoints.api_base", &self.endpoints.api_base),
            ("endpoints.upload_url", &self.endpoints.upload_url),
            ("oauth.redirect_uri", &self.oauth.redirect_uri),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(common::Error::Config("http.user_agent must not be empty".into()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.oauth.refresh_margin_secs)
    }

    /// Resolve config file path from CLI arg, CONFIG_PATH env var, or the
    /// default file if it exists in the working directory.
    pub fn resolve_path(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(p.to_path_buf());
        }
        if let Some(p) = env_var("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    }
}
