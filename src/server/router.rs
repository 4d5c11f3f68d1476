use crate::config::BasicConfig;
use crate::db::DatabaseFactory;
use crate::formats::Format;
use crate::server::routes::tables;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderName, HeaderValue, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{error, info, warn};
use webstore_schema::Message;

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct WebstoreState {
    pub factory: Arc<dyn DatabaseFactory>,
    pub default_format: Format,
    pub enable_sql: bool,
    pub max_body_bytes: usize,
}

impl WebstoreState {
    pub fn new(factory: Arc<dyn DatabaseFactory>, basic: &BasicConfig) -> Self {
        Self {
            factory,
            default_format: basic.default_format,
            enable_sql: basic.enable_sql,
            max_body_bytes: basic.max_body_bytes,
        }
    }
}

async fn not_found_handler() -> Response {
    let message = Message::error("Not found", StatusCode::NOT_FOUND.as_u16());
    (StatusCode::NOT_FOUND, axum::Json(message)).into_response()
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

pub fn webstore_router(state: WebstoreState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(tables::router(state.enable_sql))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestDecompressionLayer::new())
        .layer(middleware::from_fn(access_log))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_url_safe_and_fixed_length() {
        let id = generate_request_id();
        assert_eq!(id.len(), 16);
        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn http_versions_render_for_the_log() {
        assert_eq!(format_http_version(Version::HTTP_11), "HTTP/1.1");
        assert_eq!(format_http_version(Version::HTTP_2), "HTTP/2");
    }
}
