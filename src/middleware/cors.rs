use tower_http::cors::{Any, CorsLayer};

/// All origins allowed, preflight included. The webhook endpoint is called
/// by arbitrary external sources, matching the original's open CORS policy.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}
