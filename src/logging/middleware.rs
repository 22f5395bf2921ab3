//! Request logging. Every request gets an `x-request-id` (set when the
//! client sent none, echoed back on the response) and one completion line.

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

fn request_id(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

fn log_completion(req_id: &str, method: &Method, uri: &Uri, status: StatusCode, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    if status.is_server_error() {
        tracing::error!(request_id = %req_id, method = %method, uri = %uri, status = status.as_u16(), duration_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(request_id = %req_id, method = %method, uri = %uri, status = status.as_u16(), duration_ms, "request rejected");
    } else {
        tracing::info!(request_id = %req_id, method = %method, uri = %uri, status = status.as_u16(), duration_ms, "request completed");
    }
}

pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let req_id = request_id(&request);

    tracing::debug!(request_id = %req_id, method = %method, uri = %uri, "incoming request");

    let response = next.run(request).await;
    log_completion(&req_id, &method, &uri, response.status(), start.elapsed());
    response
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(propagate_request_id_layer())
            .layer(middleware::from_fn(log_request))
            .layer(request_id_layer())
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
