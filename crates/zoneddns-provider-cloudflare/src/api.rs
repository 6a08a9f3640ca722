//! Cloudflare API v4 wire types
//!
//! Every response is wrapped in the same envelope:
//!
//! ```json
//! { "success": true, "errors": [], "messages": [], "result": ..., "result_info": {...} }
//! ```

use reqwest::StatusCode;
use serde::Deserialize;
use zoneddns_core::Error;

use crate::PROVIDER_NAME;

/// Records requested per list page (Cloudflare's maximum is 5000, default 100)
pub const PER_PAGE: u32 = 100;

/// Response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(default)]
    pub errors: Vec<ApiMessage>,

    pub result: Option<T>,

    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

/// One entry of `errors[]`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Pagination block of list responses
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResultInfo {
    #[serde(default = "first_page")]
    pub page: u32,

    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Envelope<T> {
    /// Unwrap `result`, turning `success: false` into an API error
    pub fn into_result(self) -> Result<(T, Option<ResultInfo>), Error> {
        if !self.success {
            return Err(Error::provider_api(PROVIDER_NAME, join_errors(&self.errors)));
        }

        let result = self.result.ok_or_else(|| {
            Error::provider_api(PROVIDER_NAME, "Invalid response format: missing result")
        })?;

        Ok((result, self.result_info))
    }
}

/// Join `errors[]` into one message
pub fn join_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "request was not successful (no error details)".to_string();
    }

    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Map a non-2xx status to an error
///
/// `body` is the raw response text; if it parses as an envelope, its error
/// messages are used as the detail.
pub fn status_error(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .filter(|envelope| !envelope.errors.is_empty())
        .map(|envelope| join_errors(&envelope.errors))
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {} - {}",
            status, detail
        )),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::network(format!(
            "Cloudflare server error (transient): {} - {}",
            status, detail
        )),
        _ => Error::provider_api(
            PROVIDER_NAME,
            format!("Request failed: {} - {}", status, detail),
        ),
    }
}
