//! Outbound URL construction.
//!
//! `/api/{segments}?{query}` on the inbound side becomes
//! `{origin}/api/{segments}?{query}` on the backend. Any path already on the
//! origin is replaced, the query string is copied byte for byte.

use thiserror::Error;
use url::Url;

/// Prefix shared by inbound and outbound paths.
pub const API_PREFIX: &str = "/api/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("path has no segments")]
    Empty,

    #[error("dot segment {0:?} not allowed")]
    DotSegment(String),

    #[error("origin {0} cannot carry a path")]
    OpaqueOrigin(String),
}

/// Split the part of a path after `/api/` into its non-empty segments.
///
/// Segments stay percent-encoded exactly as received.
pub fn path_segments(rest: &str) -> Result<Vec<&str>, TargetError> {
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(TargetError::Empty);
    }
    if let Some(dot) = segments.iter().find(|s| is_dot_segment(s)) {
        return Err(TargetError::DotSegment((*dot).to_string()));
    }
    Ok(segments)
}

fn is_dot_segment(segment: &str) -> bool {
    let lowered = segment.to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// Build the backend URL for `segments` and the raw inbound `query`.
pub fn target_url(origin: &Url, segments: &[&str], query: Option<&str>) -> Result<Url, TargetError> {
    if origin.cannot_be_a_base() {
        return Err(TargetError::OpaqueOrigin(origin.to_string()));
    }
    let mut url = origin.clone();
    url.set_path(&format!("{}{}", API_PREFIX, segments.join("/")));
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);
    Ok(url)
}
