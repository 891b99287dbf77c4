//! Shared types for the x-post workspace

mod env;
mod error;
mod secret;
mod text;

pub use env::{env_secret, env_var};
pub use error::{Error, Result};
pub use secret::Secret;
pub use text::{BODY_EXCERPT_LIMIT, excerpt};
