pub mod chain;
pub mod factory;
pub mod filter;
pub mod policy;
pub mod token_verifier;

pub use chain::ForwardingChain;
pub use factory::build_authentication_filter;
pub use filter::AuthenticationFilter;
pub use policy::AuthorizationPolicy;
pub use token_verifier::TokenVerifier;
