use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

/// Logs each request with its client address, outcome and latency.
///
/// Needs `ConnectInfo`, so it is layered on in `main` rather than in the router.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = whole_millis(started.elapsed());

    if status.is_server_error() {
        tracing::error!(client_ip = %addr.ip(), %method, %path, %status, elapsed_ms, "Request errored");
    } else if status.is_client_error() {
        tracing::warn!(client_ip = %addr.ip(), %method, %path, %status, elapsed_ms, "Request rejected");
    } else {
        tracing::debug!(client_ip = %addr.ip(), %method, %path, %status, elapsed_ms, "Request completed");
    }

    response
}

/// Saturates instead of wrapping for durations past `u64::MAX` milliseconds.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
