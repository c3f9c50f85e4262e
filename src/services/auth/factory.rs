//! Factory: build `AuthenticationFilter` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AuthenticationFilter, TokenVerifier};

pub fn build_authentication_filter(config: &Config) -> Arc<AuthenticationFilter> {
    let verifier = TokenVerifier::new(&config.jwt_secret, config.jwt_leeway_seconds);

    Arc::new(AuthenticationFilter::new(
        verifier,
        config.access_policy.clone(),
        config.excluded_paths.clone(),
    ))
}
