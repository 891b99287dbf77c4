//! Media upload
//!
//! The upload endpoint takes `multipart/form-data` with the file as a
//! base64 text field. The body is encoded by hand so that it is byte-exact
//! and testable without a server:
//!
//! ```text
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="media_data"\r\n
//! \r\n
//! {base64 bytes}\r\n
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="media_category"\r\n
//! \r\n
//! {category}\r\n
//! --{boundary}--\r\n
//! ```

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::request::ApiClient;

/// Maximum size for still and animated images.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Maximum size for video.
pub const MAX_VIDEO_BYTES: u64 = 512 * 1024 * 1024;

/// Upload category understood by the media endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    AnimatedImage,
    Video,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Image => "tweet_image",
            MediaCategory::AnimatedImage => "tweet_gif",
            MediaCategory::Video => "tweet_video",
        }
    }

    pub fn max_bytes(self) -> u64 {
        match self {
            MediaCategory::Video => MAX_VIDEO_BYTES,
            MediaCategory::Image | MediaCategory::AnimatedImage => MAX_IMAGE_BYTES,
        }
    }
}

/// A supported file extension and what it uploads as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType {
    pub extension: &'static str,
    pub mime: &'static str,
    pub category: MediaCategory,
}

const MEDIA_TYPES: &[MediaType] = &[
    MediaType { extension: "png", mime: "image/png", category: MediaCategory::Image },
    MediaType { extension: "jpg", mime: "image/jpeg", category: MediaCategory::Image },
    MediaType { extension: "jpeg", mime: "image/jpeg", category: MediaCategory::Image },
    MediaType { extension: "webp", mime: "image/webp", category: MediaCategory::Image },
    MediaType { extension: "gif", mime: "image/gif", category: MediaCategory::AnimatedImage },
    MediaType { extension: "mp4", mime: "video/mp4", category: MediaCategory::Video },
];

/// Look up the media type for a path by its extension (case-insensitive).
pub fn media_type_for(path: &Path) -> Result<&'static MediaType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    MEDIA_TYPES
        .iter()
        .find(|t| t.extension == extension)
        .ok_or_else(|| {
            let shown = if extension.is_empty() {
                path.display().to_string()
            } else {
                format!(".{extension}")
            };
            Error::UnsupportedMedia(shown)
        })
}

/// An encoded multipart body and the boundary that delimits it.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl MultipartBody {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encode `data` for upload with a fresh random boundary.
///
/// The boundary is dashes plus hex, and the payload is standard base64
/// (no `-` in its alphabet), so the delimiter can never occur in the data.
pub fn encode_multipart(data: &[u8], category: MediaCategory) -> MultipartBody {
    let boundary = format!("----XPostMedia{}", Uuid::new_v4().simple());
    encode_multipart_with_boundary(data, category, boundary)
}

fn encode_multipart_with_boundary(data: &[u8], category: MediaCategory, boundary: String) -> MultipartBody {
    let encoded = STANDARD.encode(data);
    let mut body = String::with_capacity(encoded.len() + 4 * boundary.len() + 256);
    push_field(&mut body, &boundary, "media_data", &encoded);
    push_field(&mut body, &boundary, "media_category", category.as_str());
    body.push_str(&format!("--{boundary}--\r\n"));
    MultipartBody {
        boundary,
        body: body.into_bytes(),
    }
}

fn push_field(out: &mut String, boundary: &str, name: &str, value: &str) {
    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"));
    out.push_str(value);
    out.push_str("\r\n");
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedMedia {
    pub media_id: String,
    pub mime: &'static str,
    pub size: u64,
}

/// Upload a local file and return its media id.
///
/// Unsupported extensions and oversized files are rejected before any
/// network traffic.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn upload_media(client: &ApiClient, path: &Path) -> Result<UploadedMedia> {
    let media_type = media_type_for(path)?;

    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?
        .len();
    let max = media_type.category.max_bytes();
    if size > max {
        return Err(Error::MediaTooLarge { size, max });
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    let multipart = encode_multipart(&data, media_type.category);

    let upload_url = client.endpoints().upload_url.clone();
    let response = client
        .send_bytes(Method::POST, &upload_url, &multipart.content_type(), multipart.body)
        .await?;
    if !response.ok {
        return Err(Error::Upload {
            status: response.status,
            body: response.data.excerpt(),
        });
    }

    let media_id = response
        .data
        .as_json()
        .and_then(|v| v.get("media_id_string"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::Protocol(format!(
                "upload response has no media_id_string: {}",
                response.data.excerpt()
            ))
        })?
        .to_string();

    info!(media_id, mime = media_type.mime, size, "media uploaded");
    Ok(UploadedMedia {
        media_id,
        mime: media_type.mime,
        size,
    })
}
