//! go-import discovery endpoint
//!
//! Every path lands here. `go get` requests (`?go-get=1`) are answered with
//! meta tags from the host's TXT records; anything else is sent to the
//! package documentation site.

use super::common::{is_go_get, request_host};
use super::meta::render_meta;
use super::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

/// GET /{path}?go-get=1 - Serve go-import meta tags
pub async fn go_import(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let Some(host) = request_host(&headers, &uri) else {
        return (StatusCode::BAD_REQUEST, "missing host\n").into_response();
    };

    if !is_go_get(&params) {
        let target = format!(
            "{}/{}{}",
            state.redirect_base.trim_end_matches('/'),
            host,
            uri.path()
        );
        debug!("redirect {}{} -> {}", host, uri.path(), target);
        return (StatusCode::FOUND, [(header::LOCATION, target)]).into_response();
    }

    match state.cache.resolve(&host).await {
        Ok(resolved) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            render_meta(resolved.imports()),
        )
            .into_response(),
        Err(e) => {
            warn!(host = %host, kind = e.kind(), "{}", e);
            not_found()
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "404 page not found\n",
    )
        .into_response()
}
