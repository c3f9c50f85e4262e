/*
 * Responsibility
 * - ゲートウェイ共通のエラー定義 (AppError / Rejection)
 * - IntoResponse 実装 (HTTP status のみ、body は空)
 * - 拒否理由の詳細はログにだけ出し、レスポンスには載せない
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ConfigError;

/// Terminal outcome of a request the authentication filter refused to forward.
///
/// The `Display` text is the reason that goes to the operational log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Missing Authorization Header")]
    MissingCredentials,

    #[error("Invalid Token")]
    InvalidToken,

    #[error("{0}")]
    AccessDenied(String),

    #[error("Malformed request path")]
    MalformedPath,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::MissingCredentials | Rejection::InvalidToken => StatusCode::UNAUTHORIZED,
            Rejection::AccessDenied(_) => StatusCode::FORBIDDEN,
            Rejection::MalformedPath => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        // status only; an empty body is the whole contract
        self.status().into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bad request")]
    BadRequest,

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("bad gateway")]
    BadGateway,

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadGateway => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejections_map_to_status_with_empty_body() {
        let cases = [
            (Rejection::MissingCredentials, StatusCode::UNAUTHORIZED),
            (Rejection::InvalidToken, StatusCode::UNAUTHORIZED),
            (
                Rejection::AccessDenied("Access denied: Employers only".into()),
                StatusCode::FORBIDDEN,
            ),
            (Rejection::MalformedPath, StatusCode::BAD_REQUEST),
        ];

        for (rejection, expected) in cases {
            let response = rejection.into_response();
            assert_eq!(response.status(), expected);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(body.is_empty());
        }
    }

    #[test]
    fn access_denied_reason_is_only_in_display() {
        let rejection = Rejection::AccessDenied("Access denied: Employers only".into());
        assert_eq!(rejection.to_string(), "Access denied: Employers only");
    }

    #[test]
    fn app_errors_map_to_status() {
        assert_eq!(
            AppError::BadGateway.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::PayloadTooLarge.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::BadRequest.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
