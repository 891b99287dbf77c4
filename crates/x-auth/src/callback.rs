//! Parsing the redirect the user pastes back after authorizing
//!
//! No listener runs on the redirect URI. The browser lands on an error page
//! at `REDIRECT_URI?code=...&state=...` and the user copies that URL into the
//! terminal, so input may be a full URL or a mangled fragment of one.

use reqwest::Url;

use crate::error::{Error, Result};

/// Parameters carried by the authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: Option<String>,
}

/// Extract `code` (required) and `state` (optional) from a pasted redirect.
///
/// Falls back to scanning for `code=`/`state=` pairs when the input does
/// not parse as an absolute URL. An `error=` parameter from the provider
/// (e.g. the user clicked "cancel") is reported as a callback error.
pub fn parse_callback(input: &str) -> Result<CallbackParams> {
    let input = input.trim();
    let pairs: Vec<(String, String)> = match Url::parse(input) {
        Ok(url) => url.query_pairs().into_owned().collect(),
        Err(_) => scan_pairs(input),
    };

    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.clone())
    };

    if let Some(error) = get("error") {
        return Err(Error::Callback(format!("authorization denied: {error}")));
    }

    let code = get("code")
        .ok_or_else(|| Error::Callback("no authorization code in callback URL".into()))?;

    Ok(CallbackParams {
        code,
        state: get("state"),
    })
}

/// Check the returned `state` against the one generated for this attempt.
pub fn verify_state(expected: &str, returned: Option<&str>) -> Result<()> {
    match returned {
        Some(state) if state == expected => Ok(()),
        _ => Err(Error::StateMismatch),
    }
}

/// Split on `?`/`&`/`#` and keep `key=value` pieces. Values are taken
/// verbatim; authorization codes are URL-safe.
fn scan_pairs(input: &str) -> Vec<(String, String)> {
    input
        .split(['?', '&', '#'])
        .filter_map(|piece| piece.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}
