/*
 * Responsibility
 * - GET /health (ゲートウェイ自身の疎通確認、認証 filter は通さない)
 */
use axum::{http::StatusCode, response::IntoResponse};

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
