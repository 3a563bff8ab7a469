use base64::Engine as _;

use crate::error::{RenderError, RenderResult};

/// Fetch a remote asset over HTTP.
///
/// The client carries the bounded per-request timeout; any non-2xx response is
/// a fetch failure, never silently accepted.
pub fn fetch_url(client: &reqwest::blocking::Client, url: &str) -> RenderResult<Vec<u8>> {
    let resp = client
        .get(url)
        .send()
        .map_err(|e| RenderError::fetch(format!("GET {url} failed: {e}")))?
        .error_for_status()
        .map_err(|e| RenderError::fetch(format!("GET {url} failed: {e}")))?;
    let bytes = resp
        .bytes()
        .map_err(|e| RenderError::fetch(format!("reading body of {url} failed: {e}")))?;
    Ok(bytes.to_vec())
}

/// Decode an inline base64 payload.
///
/// Tolerates a data-URL style prefix by taking only the payload after the
/// last comma.
pub fn decode_inline(b64: &str) -> RenderResult<Vec<u8>> {
    let payload = b64.rsplit(',').next().unwrap_or(b64).trim();
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| RenderError::decode(format!("invalid base64 payload: {e}")))
}
