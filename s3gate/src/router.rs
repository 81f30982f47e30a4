//! HTTP router for the gateway

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::post,
    Router,
};
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;

use s3gate_auth::{require_api_token, ApiToken};
use s3gate_upload::{handlers, UploadState};

/// Service state for the main router
pub struct AppState {
    pub upload: Arc<UploadState>,
    pub token: Arc<ApiToken>,
    /// Body limit for the upload route; `None` accepts any size
    pub max_upload_size: Option<usize>,
}

/// Tags each request with a fresh gateway request ID
#[derive(Clone, Copy, Default)]
struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = s3gate_core::RequestId::new();
        HeaderValue::from_str(id.as_str()).ok().map(RequestId::new)
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = match state.max_upload_size {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };
    let request_id_header = HeaderName::from_static(s3gate_core::RequestId::HEADER);

    Router::new()
        .route("/upload", post(handlers::upload))
        .route_layer(middleware::from_fn_with_state(state.token, require_api_token))
        .layer(body_limit)
        .with_state(state.upload)
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(s3gate_core::RequestId::HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeGatewayRequestId))
}
