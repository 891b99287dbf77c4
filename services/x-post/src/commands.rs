//! Command implementations
//!
//! Each command returns the JSON value printed on stdout. Diagnostics go
//! through tracing (stderr); the interactive authorize prompt writes to
//! whatever sink it is given, stderr in the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use common::Secret;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use x_auth::{
    AuthorizationRequest, TokenManager, TokenSet, TokenState, TokenStore, now_millis,
    parse_callback, verify_state,
};
use x_client::{ApiClient, ApiEndpoints, PostDraft, PostedTweet, upload_media};

use crate::audit::{AuditEntry, AuditLog, AuditStatus};
use crate::cli::MAX_MEDIA;
use crate::config::Config;
use crate::provider_impl::{select_provider, token_manager};

/// Characters of a token shown when confirming which one is in use.
const TOKEN_PREVIEW_CHARS: usize = 20;

/// Loaded configuration plus the one HTTP client every component shares.
pub struct App {
    pub config: Config,
    http: reqwest::Client,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.http.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { config, http })
    }

    /// Request client authenticated by whichever provider the credentials allow.
    pub fn api_client(&self) -> Result<ApiClient> {
        let provider = select_provider(&self.config, &self.http)?;
        let endpoints = ApiEndpoints {
            api_base: self.config.endpoints.api_base.clone(),
            upload_url: self.config.endpoints.upload_url.clone(),
        };
        Ok(ApiClient::new(self.http.clone(), provider, endpoints)
            .with_user_agent(self.config.http.user_agent.clone()))
    }

    pub fn token_manager(&self) -> Result<TokenManager> {
        Ok(token_manager(&self.config, &self.http)?)
    }

    pub fn token_store(&self) -> TokenStore {
        TokenStore::new(&self.config.storage.token_file)
    }

    pub fn audit_log(&self) -> AuditLog {
        AuditLog::new(&self.config.storage.audit_log)
    }
}

/// Interactive authorization: print the URL, read the pasted callback,
/// exchange the code, and persist the first token set.
pub async fn authorize<R, W>(
    manager: &TokenManager,
    skip_state_check: bool,
    mut input: R,
    mut prompt: W,
) -> Result<Value>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = AuthorizationRequest::new(manager.client())?;
    let instructions = format!(
        "Open this URL in your browser and authorize the app:\n\n{}\n\n\
         You will be redirected to {}?code=...&state=...\n\
         The page will not load; copy the full URL from the address bar.\n\n\
         Paste the callback URL: ",
        request.url,
        manager.client().redirect_uri
    );
    prompt.write_all(instructions.as_bytes()).await?;
    prompt.flush().await?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .context("failed to read callback URL")?;
    complete_authorization(manager, request, &line, skip_state_check).await
}

/// Finish an authorization attempt from the pasted callback.
pub async fn complete_authorization(
    manager: &TokenManager,
    request: AuthorizationRequest,
    callback: &str,
    skip_state_check: bool,
) -> Result<Value> {
    let params = parse_callback(callback)?;
    if skip_state_check {
        if params.state.as_deref() != Some(request.state.as_str()) {
            warn!("callback state does not match the request, continuing (--skip-state-check)");
        }
    } else {
        verify_state(&request.state, params.state.as_deref())?;
    }

    let verifier = request.pkce.into_verifier();
    let response = manager
        .exchange_authorization_code(&params.code, &verifier)
        .await
        .context("token exchange failed")?;
    let tokens = TokenSet::from_exchange(response, now_millis())?;
    manager
        .store()
        .save(&tokens)
        .await
        .context("failed to save tokens")?;
    info!(path = %manager.store().path().display(), "tokens saved");

    Ok(json!({
        "authorized": true,
        "token_file": manager.store().path().display().to_string(),
        "expires_at": tokens.expires_at,
        "scope": tokens.scope,
        "refresh_token": preview(&tokens.refresh_token),
    }))
}

/// Confirm the credentials work and report the account they belong to.
pub async fn verify(client: &ApiClient) -> Result<Value> {
    let user = client.me().await.context("credential check failed")?;
    info!(username = %user.username, "authenticated");
    Ok(json!({
        "authenticated": true,
        "auth_method": client.provider_id(),
        "user": user,
    }))
}

pub async fn refresh(manager: &TokenManager) -> Result<Value> {
    let tokens = manager
        .force_refresh()
        .await
        .context("token refresh failed")?;
    Ok(json!({
        "refreshed": true,
        "expires_at": tokens.expires_at,
        "expires_in_secs": tokens.remaining_millis(now_millis()) / 1000,
        "access_token": preview(&tokens.access_token),
    }))
}

/// Token state from the store alone.
pub async fn status(store: &TokenStore, margin: Duration) -> Value {
    let tokens = store.load().await;
    let state = TokenState::classify(tokens.as_ref(), margin, now_millis());

    let mut out = json!({
        "state": state.label(),
        "token_file": store.path().display().to_string(),
    });
    if let TokenState::Valid { remaining } = state {
        out["remaining_secs"] = json!(remaining.as_secs());
    }
    if let Some(tokens) = tokens {
        out["expires_at"] = json!(tokens.expires_at);
        out["scope"] = json!(tokens.scope);
        out["has_refresh_token"] = json!(!tokens.refresh_token.is_empty());
    }
    out
}

/// Upload any media, create the post, and record the attempt.
pub async fn publish(
    client: &ApiClient,
    audit: &AuditLog,
    mut draft: PostDraft,
    media: &[PathBuf],
) -> Result<Value> {
    if media.len() > MAX_MEDIA {
        bail!("at most {MAX_MEDIA} media files per post, got {}", media.len());
    }

    let result = upload_and_post(client, &mut draft, media).await;

    let entry = audit_entry(client, &draft, media, &result);
    if let Err(e) = audit.append(&entry).await {
        warn!(path = %audit.path().display(), error = %e, "failed to write audit log");
    }

    let posted = result?;
    Ok(serde_json::to_value(posted)?)
}

async fn upload_and_post(
    client: &ApiClient,
    draft: &mut PostDraft,
    media: &[PathBuf],
) -> Result<PostedTweet> {
    for path in media {
        let uploaded = upload_media(client, path)
            .await
            .with_context(|| format!("media upload failed for {}", path.display()))?;
        draft.media_ids.push(uploaded.media_id);
    }
    let posted = client
        .create_post(draft)
        .await
        .with_context(|| format!("{} failed", draft.command()))?;
    Ok(posted)
}

fn audit_entry(
    client: &ApiClient,
    draft: &PostDraft,
    media: &[PathBuf],
    result: &Result<PostedTweet>,
) -> AuditEntry {
    let (status, posted, error) = match result {
        Ok(p) => (AuditStatus::Posted, Some(p), None),
        Err(e) => (AuditStatus::Failed, None, Some(common::excerpt(&format!("{e:#}")))),
    };
    AuditEntry {
        timestamp: now_millis(),
        command: draft.command().to_string(),
        tweet_id: posted.map(|p| p.id.clone()),
        in_reply_to: draft.target_id().map(str::to_owned),
        text: posted.map_or_else(|| draft.text.clone(), |p| p.text.clone()),
        url: posted.map(|p| p.url.clone()),
        media: media.iter().map(|p| file_name(p)).collect(),
        status,
        error,
        auth_method: client.provider_id().to_string(),
    }
}

pub async fn like(client: &ApiClient, tweet_id: &str) -> Result<Value> {
    let outcome = client
        .like(tweet_id)
        .await
        .with_context(|| format!("failed to like {tweet_id}"))?;
    Ok(serde_json::to_value(outcome)?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn preview(token: &str) -> String {
    Secret::new(token.to_string()).preview(TOKEN_PREVIEW_CHARS)
}
