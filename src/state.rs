/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: 認証 filter (verifier + policy + 除外パス), upstream: 転送先 client
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::AuthenticationFilter, upstream::UpstreamClient};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthenticationFilter>,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(auth: Arc<AuthenticationFilter>, upstream: UpstreamClient) -> Self {
        Self { auth, upstream }
    }
}
