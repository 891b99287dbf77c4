//! X API client built on a pluggable auth `Provider`
//!
//! - `ApiClient` issues authenticated requests and returns a uniform
//!   `ApiResponse` (it never fails on non-2xx; callers check `ok`)
//! - `media` hand-encodes the multipart upload body and performs the upload
//! - `posting` implements the command-level operations: who-am-I, create
//!   post/reply/quote, and like

pub mod error;
pub mod media;
pub mod posting;
pub mod request;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use media::{
    MediaCategory, MediaType, MultipartBody, UploadedMedia, encode_multipart, media_type_for,
    upload_media,
};
pub use posting::{LikeOutcome, PostDraft, PostKind, PostedTweet, User};
pub use request::{API_BASE, ApiClient, ApiEndpoints, ApiResponse, Payload, UPLOAD_ENDPOINT, USER_AGENT};
