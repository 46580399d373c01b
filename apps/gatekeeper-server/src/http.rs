//! HTTP router assembly and the serve loop.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use access_requests::AccessRequests;

const BODY_LIMIT: usize = 1024 * 1024;

fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

#[derive(Clone, Default)]
struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Record the request id in the current span.
async fn record_request_id(req: Request<Body>, next: Next) -> Response {
    let rid = req
        .headers()
        .get(request_id_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
        .to_owned();
    tracing::Span::current().record("request_id", tracing::field::display(&rid));
    next.run(req).await
}

async fn health() -> &'static str {
    "ok"
}

/// Health endpoint plus the module routes, wrapped (outermost first) in
/// request id propagation, tracing, the handler timeout and a body limit.
pub fn build_router(module: &AccessRequests, timeout_sec: u64) -> Router {
    let mut router = module.register_rest(Router::new().route("/health", get(health)));

    router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT));
    if timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(timeout_sec)));
    }
    router = router.layer(from_fn(record_request_id));
    router = router.layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri().path(),
            request_id = Empty,
            status = Empty,
        )
    }));
    router = router.layer(SetRequestIdLayer::new(request_id_header(), MakeReqId));
    router.layer(PropagateRequestIdLayer::new(request_id_header()))
}

/// Bind and serve until a shutdown signal arrives.
pub async fn serve(router: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address '{host}:{port}'"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = async {
        if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
            tracing::error!("Shutdown signal handler failed: {e:#}");
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
