/*
 * Responsibility
 * - 認証 filter を通過したリクエストを upstream へそのまま転送する (fallback handler)
 * - upstream 側の失敗は 502 (body なし) に変換する
 * - body 上限超過は 413、読めない body は 400
 */
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};

use crate::error::AppError;
use crate::services::upstream::UpstreamError;
use crate::state::AppState;

pub async fn forward(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    state.upstream.forward(req).await.map_err(|err| {
        tracing::warn!(error = %err, "upstream forwarding failed");
        match err {
            UpstreamError::Body(_) => AppError::BadRequest,
            UpstreamError::PayloadTooLarge => AppError::PayloadTooLarge,
            UpstreamError::Request(_) => AppError::BadGateway,
        }
    })
}
