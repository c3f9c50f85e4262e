//! Bearer-token authentication + role authorization for every gateway request.
//!
//! Flow (first applicable step decides):
//! 1. `OPTIONS` (CORS preflight) is forwarded as-is.
//! 2. The path is percent-decoded once; a path that is not UTF-8 after decoding is 400.
//!    Every check below sees the decoded path, the upstream still gets the raw one.
//! 3. Paths containing an excluded substring (login/register) are forwarded.
//! 4. `Authorization: Bearer <token>` must be present, else 401.
//! 5. The token must verify, else 401.
//! 6. The authorization policy must allow (path, method, role), else 403.
//! 7. `X-User-Id` / `X-User-Role` are set and the request is forwarded.
//!
//! Rejections carry no body; the reason only goes to the log.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, header},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};

use crate::error::Rejection;
use crate::middleware::http::REQUEST_ID_HEADER;
use crate::services::auth::ForwardingChain;
use crate::services::auth::policy::AuthorizationPolicy;
use crate::services::auth::token_verifier::{TokenVerifier, VerifiedClaims};

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

const BEARER_PREFIX: &str = "Bearer ";

/// What the filter does with a request. Exactly one per request.
pub enum GatewayDecision {
    Forward(Request<Body>),
    Reject(Rejection),
}

#[derive(Debug, Clone)]
pub struct AuthenticationFilter {
    verifier: TokenVerifier,
    policy: AuthorizationPolicy,
    excluded_paths: Vec<String>,
}

impl AuthenticationFilter {
    pub fn new(
        verifier: TokenVerifier,
        policy: AuthorizationPolicy,
        excluded_paths: Vec<String>,
    ) -> Self {
        Self {
            verifier,
            policy,
            excluded_paths,
        }
    }

    /// Gate one request: forward it through `chain` or answer with an empty 401/403.
    ///
    /// Forwarded requests get one log line with the downstream status and elapsed time
    /// once the chain completes; the response itself is returned untouched.
    pub async fn handle<C: ForwardingChain>(&self, req: Request<Body>, chain: C) -> Response {
        let started = Instant::now();
        let path = req.uri().path().to_owned();

        debug!(
            request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-"),
            method = %req.method(),
            path = %path,
            "gateway request"
        );

        match self.decide(req) {
            GatewayDecision::Forward(req) => {
                let response = chain.forward(req).await;
                info!(
                    path = %path,
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request forwarded"
                );
                response
            }
            GatewayDecision::Reject(rejection) => reject(rejection),
        }
    }

    /// Pure part of [`handle`](Self::handle): classify the request without forwarding it.
    pub fn decide(&self, mut req: Request<Body>) -> GatewayDecision {
        if req.method() == Method::OPTIONS {
            return GatewayDecision::Forward(req);
        }

        let path = match decoded_path(req.uri().path()) {
            Some(path) => path,
            None => {
                warn!(path = %req.uri().path(), "path is not valid UTF-8 once decoded");
                return GatewayDecision::Reject(Rejection::MalformedPath);
            }
        };

        if self.is_excluded(&path) {
            // identity headers on an unauthenticated request can only be spoofed
            strip_identity(req.headers_mut());
            return GatewayDecision::Forward(req);
        }

        let Some(token) = bearer_token(req.headers()) else {
            return GatewayDecision::Reject(Rejection::MissingCredentials);
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(error = %err, "access token verification failed");
                return GatewayDecision::Reject(Rejection::InvalidToken);
            }
        };

        if let Err(rule) = self
            .policy
            .authorize(&path, req.method(), claims.role.as_deref())
        {
            warn!(
                user_id = %claims.subject,
                role = ?claims.role,
                method = %req.method(),
                path = %path,
                "access denied by policy"
            );
            return GatewayDecision::Reject(Rejection::AccessDenied(rule.reason.clone()));
        }

        if let Err(err) = inject_identity(req.headers_mut(), &claims) {
            warn!(error = %err, user_id = ?claims.subject, "claims not representable as headers");
            return GatewayDecision::Reject(Rejection::InvalidToken);
        }

        GatewayDecision::Forward(req)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths
            .iter()
            .any(|excluded| path.contains(excluded.as_str()))
    }
}

// `/api/%76acancies` must be judged as `/api/vacancies`: the upstream will decode it.
fn decoded_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|path| path.into_owned())
}

// First `Authorization` value only; the prefix is case-sensitive and the token non-empty.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty())
}

fn strip_identity(headers: &mut HeaderMap) {
    headers.remove(USER_ID_HEADER);
    headers.remove(USER_ROLE_HEADER);
}

// `insert` replaces any caller-supplied value; `Authorization` is left in place.
fn inject_identity(
    headers: &mut HeaderMap,
    claims: &VerifiedClaims,
) -> Result<(), axum::http::header::InvalidHeaderValue> {
    let user_id = HeaderValue::from_str(&claims.subject)?;
    let role = claims
        .role
        .as_deref()
        .map(HeaderValue::from_str)
        .transpose()?;

    headers.insert(USER_ID_HEADER, user_id);
    match role {
        Some(role) => {
            headers.insert(USER_ROLE_HEADER, role);
        }
        None => {
            headers.remove(USER_ROLE_HEADER);
        }
    }

    Ok(())
}

fn reject(rejection: Rejection) -> Response {
    warn!(
        reason = %rejection,
        status = rejection.status().as_u16(),
        "request rejected"
    );
    rejection.into_response()
}
