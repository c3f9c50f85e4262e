use async_trait::async_trait;
use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// The rest of the gateway pipeline, as seen from the authentication filter.
///
/// Consumed on use: a request is forwarded at most once.
#[async_trait]
pub trait ForwardingChain: Send {
    async fn forward(self, req: Request<Body>) -> Response;
}

#[async_trait]
impl ForwardingChain for Next {
    async fn forward(self, req: Request<Body>) -> Response {
        self.run(req).await
    }
}
