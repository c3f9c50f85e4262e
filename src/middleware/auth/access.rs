//! Authentication filter wiring: every request that reaches the gateway router
//! goes through `AuthenticationFilter::handle` with axum's `Next` as the
//! forwarding chain.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::state::AppState;

/// Put the authentication filter in front of every route and the fallback of `router`.
///
/// 例：
/// ```ignore
/// let gateway = Router::new().fallback(api::handlers::forward);
/// let gateway = middleware::auth::access::apply(gateway, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    state.auth.handle(req, next).await
}
