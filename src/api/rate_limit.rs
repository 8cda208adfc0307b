//! Per-client-IP rate limiting for the management API

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Build a keyed limiter and start pruning idle keys in the background.
///
/// The pruning task ends once the limiter is dropped.
pub fn ip_rate_limiter(per_minute: NonZeroU32) -> Arc<IpRateLimiter> {
    let limiter = Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute)));

    let weak = Arc::downgrade(&limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            match weak.upgrade() {
                Some(limiter) => {
                    limiter.retain_recent();
                    limiter.shrink_to_fit();
                }
                None => break,
            }
        }
    });

    limiter
}

pub async fn rate_limit(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    // Requests without connection info (in-process tests) share one bucket
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&ip).is_err() {
        tracing::warn!(client_ip = %ip, "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}
