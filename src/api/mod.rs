/*
 * Responsibility
 * - ゲートウェイ自身が応答するエンドポイント (/health)
 * - それ以外の全パスを upstream へ転送する fallback handler
 */
pub mod handlers;
