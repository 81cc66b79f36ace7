//! CORS for the local development UI.
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

pub const DEV_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(DEV_ORIGINS.map(HeaderValue::from_static))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}
