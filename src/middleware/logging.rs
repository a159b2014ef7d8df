use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::identity::USER_ID_HEADER;

pub trait HttpLoggingExt<S> {
    fn with_http_logging(self) -> Self;
}

fn request_span(request: &Request<Body>) -> Span {
    let viewer = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        target: "tower_http",
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        viewer,
    )
}

impl<S> HttpLoggingExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// One span per request; status and latency logged on the way out.
    fn with_http_logging(self) -> Router<S> {
        self.layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(|request: &Request<Body>, _span: &Span| {
                    let query = request.uri().query().unwrap_or_default();
                    tracing::info!(target: "tower_http", query, "started");
                })
                .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                    tracing::info!(
                        target: "tower_http",
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis() as u64,
                        "finished"
                    );
                })
                .on_failure(|class: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    tracing::warn!(
                        target: "tower_http",
                        %class,
                        latency_ms = latency.as_millis() as u64,
                        "failed"
                    );
                }),
        )
    }
}
