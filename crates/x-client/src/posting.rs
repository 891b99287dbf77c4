//! Posting operations: who am I, create post/reply/quote, like
//!
//! Successful resource responses arrive wrapped in a `{"data": {...}}`
//! envelope. Any non-2xx becomes `Error::Request` with a bounded body
//! excerpt, except a 403 on like whose body says the tweet is already
//! liked, which is reported as success.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::request::{ApiClient, ApiResponse};

/// Public URL prefix for a post id.
const STATUS_URL_PREFIX: &str = "https://x.com/i/status/";

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

/// What a new post is in relation to existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKind {
    Standalone,
    Reply { in_reply_to: String },
    Quote { quoted: String },
}

/// Text plus optional context and attached media for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub kind: PostKind,
    pub media_ids: Vec<String>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: PostKind::Standalone,
            media_ids: Vec::new(),
        }
    }

    pub fn reply(in_reply_to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: PostKind::Reply {
                in_reply_to: in_reply_to.into(),
            },
            ..Self::new(text)
        }
    }

    pub fn quote(quoted: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: PostKind::Quote {
                quoted: quoted.into(),
            },
            ..Self::new(text)
        }
    }

    pub fn with_media(mut self, media_id: impl Into<String>) -> Self {
        self.media_ids.push(media_id.into());
        self
    }

    /// Command name for logs and audit entries.
    pub fn command(&self) -> &'static str {
        match self.kind {
            PostKind::Standalone => "post",
            PostKind::Reply { .. } => "reply",
            PostKind::Quote { .. } => "quote",
        }
    }

    /// The referenced post id, if any.
    pub fn target_id(&self) -> Option<&str> {
        match &self.kind {
            PostKind::Standalone => None,
            PostKind::Reply { in_reply_to } => Some(in_reply_to),
            PostKind::Quote { quoted } => Some(quoted),
        }
    }

    /// JSON request body for the create-post endpoint.
    pub fn to_body(&self) -> Value {
        let mut body = json!({ "text": self.text });
        match &self.kind {
            PostKind::Standalone => {}
            PostKind::Reply { in_reply_to } => {
                body["reply"] = json!({ "in_reply_to_tweet_id": in_reply_to });
            }
            PostKind::Quote { quoted } => {
                body["quote_tweet_id"] = json!(quoted);
            }
        }
        if !self.media_ids.is_empty() {
            body["media"] = json!({ "media_ids": self.media_ids });
        }
        body
    }
}

/// A post that was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedTweet {
    pub id: String,
    pub text: String,
    pub url: String,
}

/// Result of a like request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub tweet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct LikeData {
    #[serde(default)]
    liked: bool,
}

impl ApiClient {
    /// The account the current credentials belong to.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User> {
        let url = self.api_url("/users/me");
        let response = self.request(Method::GET, &url, None).await?;
        envelope_data(&response)
    }

    /// Create a post, reply, or quote.
    #[instrument(skip_all, fields(command = draft.command(), media = draft.media_ids.len()))]
    pub async fn create_post(&self, draft: &PostDraft) -> Result<PostedTweet> {
        let url = self.api_url("/tweets");
        let response = self.request(Method::POST, &url, Some(&draft.to_body())).await?;
        let created: CreatedPost = envelope_data(&response)?;
        info!(id = %created.id, "post created");
        Ok(PostedTweet {
            url: format!("{STATUS_URL_PREFIX}{}", created.id),
            text: if created.text.is_empty() {
                draft.text.clone()
            } else {
                created.text
            },
            id: created.id,
        })
    }

    /// Like a post as the authenticated account.
    #[instrument(skip(self))]
    pub async fn like(&self, tweet_id: &str) -> Result<LikeOutcome> {
        let user = self.me().await?;
        let url = self.api_url(&format!("/users/{}/likes", user.id));
        let response = self
            .request(Method::POST, &url, Some(&json!({ "tweet_id": tweet_id })))
            .await?;

        if is_already_liked(&response) {
            info!(tweet_id, "tweet was already liked");
            return Ok(LikeOutcome {
                liked: true,
                tweet_id: tweet_id.to_string(),
                note: Some("already liked".to_string()),
            });
        }

        let data: LikeData = envelope_data(&response)?;
        Ok(LikeOutcome {
            liked: data.liked,
            tweet_id: tweet_id.to_string(),
            note: None,
        })
    }
}

fn is_already_liked(response: &ApiResponse) -> bool {
    response.status == 403
        && response
            .data
            .to_text()
            .to_ascii_lowercase()
            .contains("already liked")
}

/// Fail on non-2xx, then decode the `data` member of the envelope.
fn envelope_data<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    if !response.ok {
        return Err(Error::Request {
            status: response.status,
            body: response.data.excerpt(),
        });
    }
    let value = response
        .data
        .as_json()
        .ok_or_else(|| Error::Protocol(format!("expected JSON, got: {}", response.data.excerpt())))?;
    serde_json::from_value::<Envelope<T>>(value.clone())
        .map(|e| e.data)
        .map_err(|e| Error::Protocol(format!("unexpected response shape ({e}): {}", response.data.excerpt())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockApi, static_client};

    const ME: &str = r#"{"data":{"id":"2244994945","name":"Watson","username":"watson"}}"#;

    #[test]
    fn standalone_body_is_text_only() {
        assert_eq!(PostDraft::new("hello").to_body(), json!({"text": "hello"}));
    }

    #[test]
    fn reply_body_nests_target() {
        let body = PostDraft::reply("111", "agreed").to_body();
        assert_eq!(
            body,
            json!({"text": "agreed", "reply": {"in_reply_to_tweet_id": "111"}})
        );
    }

    #[test]
    fn quote_body_sets_quote_id() {
        let body = PostDraft::quote("222", "look").to_body();
        assert_eq!(body, json!({"text": "look", "quote_tweet_id": "222"}));
    }

    #[test]
    fn media_ids_are_attached() {
        let body = PostDraft::new("pic").with_media("m1").with_media("m2").to_body();
        assert_eq!(body["media"], json!({"media_ids": ["m1", "m2"]}));
    }

    #[test]
    fn draft_command_and_target() {
        assert_eq!(PostDraft::new("a").command(), "post");
        assert_eq!(PostDraft::new("a").target_id(), None);
        let reply = PostDraft::reply("9", "a");
        assert_eq!(reply.command(), "reply");
        assert_eq!(reply.target_id(), Some("9"));
        assert_eq!(PostDraft::quote("8", "a").command(), "quote");
    }

    #[tokio::test]
    async fn me_returns_user() {
        let api = MockApi::start().await;
        api.respond("GET", "/2/users/me", 200, "application/json", ME);
        let client = static_client(&api, "at");

        let user = client.me().await.unwrap();
        assert_eq!(user.id, "2244994945");
        assert_eq!(user.username, "watson");
    }

    #[tokio::test]
    async fn me_unauthorized_is_request_error() {
        let api = MockApi::start().await;
        api.respond("GET", "/2/users/me", 401, "application/json", r#"{"title":"Unauthorized"}"#);
        let client = static_client(&api, "expired");

        let err = client.me().await.unwrap_err();
        match err {
            Error::Request { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Unauthorized"));
            }
            other => panic!("expected Request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_post_returns_id_and_url() {
        let api = MockApi::start().await;
        api.respond(
            "POST",
            "/2/tweets",
            201,
            "application/json",
            r#"{"data":{"id":"1445880548472328192","text":"hello"}}"#,
        );
        let client = static_client(&api, "at");

        let posted = client.create_post(&PostDraft::new("hello")).await.unwrap();
        assert_eq!(posted.id, "1445880548472328192");
        assert_eq!(posted.text, "hello");
        assert_eq!(posted.url, "https://x.com/i/status/1445880548472328192");

        let sent: Value = serde_json::from_slice(&api.requests()[0].body).unwrap();
        assert_eq!(sent, json!({"text": "hello"}));
    }

    #[tokio::test]
    async fn create_reply_sends_reply_body() {
        let api = MockApi::start().await;
        api.respond("POST", "/2/tweets", 201, "application/json", r#"{"data":{"id":"5","text":"ok"}}"#);
        let client = static_client(&api, "at");

        client
            .create_post(&PostDraft::reply("4", "ok").with_media("m9"))
            .await
            .unwrap();

        let sent: Value = serde_json::from_slice(&api.requests()[0].body).unwrap();
        assert_eq!(sent["reply"]["in_reply_to_tweet_id"], "4");
        assert_eq!(sent["media"]["media_ids"][0], "m9");
    }

    #[tokio::test]
    async fn duplicate_post_is_request_error() {
        let api = MockApi::start().await;
        api.respond(
            "POST",
            "/2/tweets",
            403,
            "application/json",
            r#"{"detail":"You are not allowed to create a Tweet with duplicate content."}"#,
        );
        let client = static_client(&api, "at");

        let err = client.create_post(&PostDraft::new("again")).await.unwrap_err();
        assert!(matches!(err, Error::Request { status: 403, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn success_without_envelope_is_protocol_error() {
        let api = MockApi::start().await;
        api.respond("POST", "/2/tweets", 201, "application/json", r#"{"id":"5"}"#);
        let client = static_client(&api, "at");

        let err = client.create_post(&PostDraft::new("x")).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn like_resolves_user_then_posts() {
        let api = MockApi::start().await;
        api.respond("GET", "/2/users/me", 200, "application/json", ME);
        api.respond(
            "POST",
            "/2/users/2244994945/likes",
            200,
            "application/json",
            r#"{"data":{"liked":true}}"#,
        );
        let client = static_client(&api, "at");

        let outcome = client.like("777").await.unwrap();
        assert_eq!(
            outcome,
            LikeOutcome {
                liked: true,
                tweet_id: "777".into(),
                note: None
            }
        );

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        let sent: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(sent, json!({"tweet_id": "777"}));
    }

    #[tokio::test]
    async fn already_liked_403_is_success_with_note() {
        let api = MockApi::start().await;
        api.respond("GET", "/2/users/me", 200, "application/json", ME);
        api.respond(
            "POST",
            "/2/users/2244994945/likes",
            403,
            "application/json",
            r#"{"detail":"You have already liked this Tweet."}"#,
        );
        let client = static_client(&api, "at");

        let outcome = client.like("777").await.unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.note.as_deref(), Some("already liked"));
    }

    #[tokio::test]
    async fn other_403_on_like_is_error() {
        let api = MockApi::start().await;
        api.respond("GET", "/2/users/me", 200, "application/json", ME);
        api.respond(
            "POST",
            "/2/users/2244994945/likes",
            403,
            "application/json",
            r#"{"detail":"You are not permitted to perform this action."}"#,
        );
        let client = static_client(&api, "at");

        let err = client.like("777").await.unwrap_err();
        assert!(matches!(err, Error::Request { status: 403, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn already_liked_text_on_other_status_is_error() {
        let api = MockApi::start().await;
        api.respond("GET", "/2/users/me", 200, "application/json", ME);
        api.respond(
            "POST",
            "/2/users/2244994945/likes",
            400,
            "text/plain",
            "already liked",
        );
        let client = static_client(&api, "at");

        let err = client.like("777").await.unwrap_err();
        assert!(matches!(err, Error::Request { status: 400, .. }), "got {err:?}");
    }

    #[test]
    fn like_outcome_omits_empty_note() {
        let outcome = LikeOutcome {
            liked: true,
            tweet_id: "1".into(),
            note: None,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"liked": true, "tweet_id": "1"})
        );
    }
}
