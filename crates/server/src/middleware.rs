use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Log method, path, status and latency of every request.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if status.is_server_error() {
        log::error!("{} {} -> {} ({:.1} ms)", method, path, status.as_u16(), elapsed_ms);
    } else if status.is_client_error() {
        log::warn!("{} {} -> {} ({:.1} ms)", method, path, status.as_u16(), elapsed_ms);
    } else {
        log::info!("{} {} -> {} ({:.1} ms)", method, path, status.as_u16(), elapsed_ms);
    }

    response
}
