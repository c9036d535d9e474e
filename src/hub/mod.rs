//! HTTP front end
//!
//! Extracts the requested host, checks for `go-get=1` and renders the
//! [`HostCache`] result as go-import meta tags.

mod common;
mod go_import;
mod meta;

pub use common::{is_go_get, request_host, strip_port};
pub use meta::render_meta;

use crate::dns::HostCache;
use crate::{Result, VERSION};

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// `Server` header stamped on every response
pub const SERVER_NAME: &str = concat!("vanity/", env!("CARGO_PKG_VERSION"));

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Host resolution cache
    pub cache: Arc<HostCache>,
    /// Redirect target for non go-get requests
    pub redirect_base: Arc<str>,
}

impl AppState {
    pub fn new(cache: Arc<HostCache>, redirect_base: &str) -> Self {
        AppState {
            cache,
            redirect_base: Arc::from(redirect_base),
        }
    }
}

/// Create the router: one handler for every path
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(go_import::go_import)
        .layer(middleware::from_fn(server_header))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<()> {
    let router = create_router(state);
    info!("Starting vanity v{} HTTP server on {}", VERSION, addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn server_header(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
