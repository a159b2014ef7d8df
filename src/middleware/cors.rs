use std::sync::Arc;

use axum::Router;
use tower_http::cors::{self, CorsLayer};

pub trait CorsExt<S> {
    fn with_cors(self, allowed: &[String]) -> Router<S>;
}

/// An origin passes when it starts with an allowed entry, or ends with an
/// entry written as a `.suffix`.
pub fn origin_allowed(allowed: &[String], origin: &[u8]) -> bool {
    allowed.iter().any(|a| {
        let a = a.as_bytes();
        if a.first() == Some(&b'.') {
            origin.ends_with(a)
        } else {
            origin.starts_with(a)
        }
    })
}

impl<S> CorsExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Add CORS to Router
    fn with_cors(self, allowed: &[String]) -> Router<S> {
        let allowed: Arc<[String]> = allowed.into();
        let cors_layer = CorsLayer::new()
            .allow_origin(cors::AllowOrigin::predicate(move |origin, _| {
                origin_allowed(&allowed, origin.as_bytes())
            }))
            .allow_methods(cors::Any)
            .allow_headers(cors::Any);

        self.layer(cors_layer)
    }
}
