/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証 filter の配線, http: request-id/trace/limit/timeout, cors: ブラウザ向け CORS
 */
pub mod auth;
pub mod cors;
pub mod http;
