//! Pass-through HTTP client for the downstream service.
//!
//! Responsibility:
//! - Re-issue the (already authenticated) request against `UPSTREAM_BASE_URL`.
//! - Method, path, query, end-to-end headers and body are kept. The request body is
//!   buffered (bounded by the body limit layer); the response body is streamed back.
//!
//! There is no routing here: every path goes to the same base URL.

use std::error::Error as _;

use axum::{
    body::Body,
    http::{HeaderMap, Request, Uri, header},
    response::Response,
};
use http_body_util::LengthLimitError;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// Connection-scoped headers (RFC 9110 §7.6.1) plus `host`, which reqwest derives from the URL.
const HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::HOST,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(base_url: Url) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` path + request path, request query.
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{}", self.base_url.path().trim_end_matches('/'), uri.path());
        url.set_path(&path);
        url.set_query(uri.query());
        url
    }

    pub async fn forward(&self, req: Request<Body>) -> Result<Response, UpstreamError> {
        let (parts, body) = req.into_parts();
        let url = self.target_url(&parts.uri);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);

        // the body limit layer only sees `content-length`; chunked bodies trip it here
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|err| {
                if exceeds_length_limit(&err) {
                    UpstreamError::PayloadTooLarge
                } else {
                    UpstreamError::Body(err)
                }
            })?;

        let upstream = self
            .http
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}

fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}
