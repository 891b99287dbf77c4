//! x-post
//!
//! Command-line client for posting to X with OAuth 2.0 (Authorization Code
//! + PKCE) credentials:
//! 1. `authorize` runs the one-time browser flow and stores the token set
//! 2. Every other command goes through a provider selected from the
//!    available credentials; the OAuth 2.0 provider refreshes and re-persists
//!    the token set whenever it is close to expiry
//! 3. Results are printed to stdout as JSON, logs go to stderr

mod audit;
mod cli;
mod commands;
mod config;
mod provider_impl;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use x_client::PostDraft;

use crate::cli::{Cli, Command};
use crate::commands::App;
use crate::config::Config;

/// Initialize tracing on stderr with LOG_LEVEL / RUST_LOG support.
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let json = common::env_var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config_path = Config::resolve_path(cli.config.as_deref());
    match &config_path {
        Some(path) => info!(path = %path.display(), "loading configuration"),
        None => debug!("no config file, using defaults"),
    }
    let config = Config::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load configuration".to_string(),
    })?;
    let app = App::new(config)?;

    let output = run(&app, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(app: &App, command: Command) -> Result<Value> {
    match command {
        Command::Authorize { skip_state_check } => {
            let manager = app.token_manager()?;
            commands::authorize(
                &manager,
                skip_state_check,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stderr(),
            )
            .await
        }
        Command::Verify => commands::verify(&app.api_client()?).await,
        Command::Refresh => commands::refresh(&app.token_manager()?).await,
        Command::Status => {
            Ok(commands::status(&app.token_store(), app.config.refresh_margin()).await)
        }
        Command::Post(post) => {
            let client = app.api_client()?;
            commands::publish(&client, &app.audit_log(), PostDraft::new(post.text), &post.media)
                .await
        }
        Command::Reply { tweet_id, post } => {
            let client = app.api_client()?;
            let draft = PostDraft::reply(tweet_id, post.text);
            commands::publish(&client, &app.audit_log(), draft, &post.media).await
        }
        Command::Quote { tweet_id, post } => {
            let client = app.api_client()?;
            let draft = PostDraft::quote(tweet_id, post.text);
            commands::publish(&client, &app.audit_log(), draft, &post.media).await
        }
        Command::Like { tweet_id } => commands::like(&app.api_client()?, &tweet_id).await,
    }
}
