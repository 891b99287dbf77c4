//! CLI argument definitions using clap
//!
//! - x-post authorize             # one-time OAuth 2.0 setup (interactive)
//! - x-post verify                # check credentials, show the account
//! - x-post refresh               # force a token refresh
//! - x-post status                # token state, no network
//! - x-post post "text"           # new post (optionally --media file)
//! - x-post reply <id> "text"     # reply to a post
//! - x-post quote <id> "text"     # quote a post
//! - x-post like <id>             # like a post
//!
//! Results go to stdout as JSON; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Most media attachments a single post accepts.
pub const MAX_MEDIA: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "x-post")]
#[command(about = "Post to X with OAuth 2.0 (PKCE) credentials that refresh themselves")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (default: CONFIG_PATH, then ./x-post.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the OAuth 2.0 authorization flow and store the resulting tokens
    Authorize {
        /// Accept a callback whose state does not match (or is missing)
        #[arg(long)]
        skip_state_check: bool,
    },

    /// Check credentials and show the authenticated account
    Verify,

    /// Refresh the access token now, regardless of expiry
    Refresh,

    /// Show the stored token state without contacting the API
    Status,

    /// Create a post
    Post(PostArgs),

    /// Reply to a post
    Reply {
        /// Id of the post being replied to
        tweet_id: String,
        #[command(flatten)]
        post: PostArgs,
    },

    /// Quote a post
    Quote {
        /// Id of the post being quoted
        tweet_id: String,
        #[command(flatten)]
        post: PostArgs,
    },

    /// Like a post
    Like {
        /// Id of the post to like
        tweet_id: String,
    },
}

#[derive(Debug, Args)]
pub struct PostArgs {
    /// Post text
    pub text: String,

    /// Media file to attach (.png, .jpg, .jpeg, .gif, .webp, .mp4); repeatable
    #[arg(long = "media", value_name = "PATH")]
    pub media: Vec<PathBuf>,
}
