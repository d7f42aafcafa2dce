//! Token Operations
//!
//! Token endpoint grants and the follow-up calls made with issued tokens.
//!
//! - **Token Endpoint**: authorization-code exchange and refresh grants
//! - **Token Source**: forced refresh with refresh-token preservation
//! - **User Info**: OIDC user-info retrieval
//! - **Token Introspection**: RFC 7662 token introspection

pub mod exchange;
pub mod introspection;
pub mod refresh;
pub mod userinfo;

pub use exchange::{DefaultTokenEndpoint, MockTokenEndpoint, TokenEndpoint};
pub use introspection::{DefaultTokenIntrospector, TokenIntrospector};
pub use refresh::TokenSource;
pub use userinfo::{DefaultUserInfoFetcher, UserInfoFetcher};
