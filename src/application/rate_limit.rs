use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

struct Window {
    started: Instant,
    count: u32,
}

struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
    limit: u32,
    period: Duration,
}

impl RateLimiter {
    fn new(limit: u32, period: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            period,
        }
    }

    fn check(&self, ip: IpAddr) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();

        // Drop lapsed windows so the map does not grow with every client IP
        // ever seen. This also resets the caller's own window once its
        // period has passed.
        windows.retain(|_, window| now.duration_since(window.started) < self.period);

        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if window.count < self.limit {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

/// Tower layer applying a fixed-window per-IP request limit.
///
/// Falls open if the client IP cannot be determined (e.g. missing
/// `ConnectInfo`).
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
}

impl RateLimitLayer {
    /// Allow `requests` per minute per client IP.
    pub fn per_minute(requests: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(requests, Duration::from_secs(60))),
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        let allowed = client_ip.is_none_or(|ip| self.limiter.check(ip));

        if allowed {
            let future = self.inner.call(request);
            Box::pin(future)
        } else {
            tracing::warn!(ip = ?client_ip, "rate limit exceeded");
            Box::pin(async { Ok(StatusCode::TOO_MANY_REQUESTS.into_response()) })
        }
    }
}
