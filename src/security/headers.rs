//! Header filtering in both directions.
//!
//! Inbound: only an explicit allow-list reaches the backend, everything else
//! (hop-by-hop, forwarding, tracing headers) is dropped.
//! Outbound: everything the backend sent is returned except the transfer
//! artifacts that no longer describe the re-framed body.

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL,
    CONNECTION, CONTENT_ENCODING, CONTENT_TYPE, COOKIE, TRANSFER_ENCODING, USER_AGENT,
};

use crate::session::SessionToken;

/// Request headers forwarded to the backend.
pub const FORWARDED_REQUEST_HEADERS: &[HeaderName] = &[
    CONTENT_TYPE,
    ACCEPT,
    ACCEPT_LANGUAGE,
    USER_AGENT,
    COOKIE,
    AUTHORIZATION,
];

/// Response headers never relayed back to the client.
pub const STRIPPED_RESPONSE_HEADERS: &[HeaderName] = &[CONTENT_ENCODING, TRANSFER_ENCODING];

/// Build the outbound header set from the inbound one.
///
/// An `Authorization` header supplied by the caller is kept as is; only when
/// it is absent is `Bearer {token}` derived from the session.
pub fn forward_request_headers(inbound: &HeaderMap, session: Option<&SessionToken>) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS {
        for value in inbound.get_all(name) {
            outbound.append(name.clone(), value.clone());
        }
    }

    if !outbound.contains_key(AUTHORIZATION) {
        if let Some(value) = session.and_then(SessionToken::bearer_header) {
            outbound.insert(AUTHORIZATION, value);
        }
    }
    outbound
}

/// Copy backend response headers for the client.
///
/// Iterating a `HeaderMap` yields every value of a repeated header, and
/// `append` keeps them apart, so each `set-cookie` stays its own line.
pub fn relay_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if STRIPPED_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        relayed.append(name.clone(), value.clone());
    }
    relayed
}

/// Headers for a relayed event stream. Whatever caching or connection
/// headers the backend chose are replaced so intermediaries do not buffer.
pub fn event_stream_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    fn inbound() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        h.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
        h.insert(USER_AGENT, HeaderValue::from_static("test-agent"));
        h.insert(COOKIE, HeaderValue::from_static("relay_session=abc"));
        h.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        h.insert("x-request-id", HeaderValue::from_static("req-1"));
        h.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        h.insert("host", HeaderValue::from_static("frontend.local"));
        h
    }

    #[test]
    fn only_allow_listed_headers_are_forwarded() {
        let out = forward_request_headers(&inbound(), None);
        assert_eq!(out.len(), 5);
        assert_eq!(out[CONTENT_TYPE], "application/json");
        assert_eq!(out[COOKIE], "relay_session=abc");
        assert!(!out.contains_key("x-forwarded-for"));
        assert!(!out.contains_key("x-request-id"));
        assert!(!out.contains_key("host"));
        assert!(!out.contains_key(CONNECTION));
        assert!(!out.contains_key(AUTHORIZATION));
    }

    #[test]
    fn session_token_is_injected_when_absent() {
        let token = SessionToken::new("tok123");
        let out = forward_request_headers(&inbound(), Some(&token));
        assert_eq!(out[AUTHORIZATION], "Bearer tok123");
    }

    #[test]
    fn caller_authorization_wins_over_session() {
        let mut h = inbound();
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer explicit"));
        let token = SessionToken::new("from-session");
        let out = forward_request_headers(&h, Some(&token));
        assert_eq!(out.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(out[AUTHORIZATION], "Bearer explicit");
    }

    #[test]
    fn response_drops_encoding_headers_only() {
        let mut up = HeaderMap::new();
        up.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        up.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        up.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        up.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        up.insert("x-custom", HeaderValue::from_static("yes"));

        let out = relay_response_headers(&up);
        assert!(!out.contains_key(CONTENT_ENCODING));
        assert!(!out.contains_key(TRANSFER_ENCODING));
        assert_eq!(out[CACHE_CONTROL], "max-age=60");
        assert_eq!(out["x-custom"], "yes");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn set_cookie_values_stay_separate() {
        let mut up = HeaderMap::new();
        up.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        up.append(SET_COOKIE, HeaderValue::from_static("b=2; HttpOnly"));

        let out = relay_response_headers(&up);
        let cookies: Vec<_> = out.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1; Path=/", "b=2; HttpOnly"]);
    }

    #[test]
    fn event_stream_headers_are_fixed() {
        let h = event_stream_headers();
        assert_eq!(h.len(), 3);
        assert_eq!(h[CONTENT_TYPE], "text/event-stream");
        assert_eq!(h[CACHE_CONTROL], "no-cache");
        assert_eq!(h[CONNECTION], "keep-alive");
    }
}
