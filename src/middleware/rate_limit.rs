//! Per-client request budget for the API.
//!
//! Fixed window: each client address gets `max_requests` per `window`, counted from its
//! first request in that window. Over budget is a JSON 429 with `Retry-After`.
//! The client is the peer address from `ConnectInfo`; requests without one share a bucket.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::{self as axum_mw, Next},
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use tracing::warn;

use crate::config::Config;
use crate::error::AppError;

// Expired windows are swept once the table grows past this.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

struct ClientWindow {
    count: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<IpAddr, ClientWindow>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `None` when `RATE_LIMIT_MAX_REQUESTS` is 0.
    pub fn from_config(config: &Config) -> Option<Self> {
        (config.rate_limit_max_requests > 0)
            .then(|| Self::new(config.rate_limit_max_requests, config.rate_limit_window))
    }

    pub fn check(&self, client: IpAddr) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock();

        if clients.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(ClientWindow {
            count: 0,
            started: now,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            let reset_at = entry.started + self.window;
            return RateDecision::Limited {
                retry_after: reset_at.saturating_duration_since(now),
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }
}

pub fn apply<S>(router: Router<S>, limiter: Option<RateLimiter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    match limiter {
        Some(limiter) => router.layer(axum_mw::from_fn_with_state(limiter, rate_limit_middleware)),
        None => router,
    }
}

async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_ip(&req);

    match limiter.check(client) {
        RateDecision::Allowed { .. } => next.run(req).await,
        RateDecision::Limited { retry_after } => {
            // round up so clients never retry a moment too early
            let retry_after_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            warn!(client = %client, retry_after_secs, "rate limit exceeded");
            AppError::RateLimited { retry_after_secs }.into_response()
        }
    }
}

fn client_ip(req: &Request<Body>) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn budget_is_per_client() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();

        assert_eq!(limiter.check_at(A, t0), RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at(A, t0), RateDecision::Allowed { remaining: 0 });
        assert!(matches!(limiter.check_at(A, t0), RateDecision::Limited { .. }));

        assert_eq!(limiter.check_at(B, t0), RateDecision::Allowed { remaining: 1 });
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(matches!(limiter.check_at(A, t0), RateDecision::Allowed { .. }));
        assert_eq!(
            limiter.check_at(A, t0 + Duration::from_secs(20)),
            RateDecision::Limited {
                retry_after: Duration::from_secs(40)
            }
        );
        assert!(matches!(
            limiter.check_at(A, t0 + Duration::from_secs(60)),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn limited_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let t0 = Instant::now();

        limiter.check_at(A, t0);
        for s in 1..10 {
            assert!(matches!(
                limiter.check_at(A, t0 + Duration::from_secs(s)),
                RateDecision::Limited { .. }
            ));
        }
        assert!(matches!(
            limiter.check_at(A, t0 + Duration::from_secs(10)),
            RateDecision::Allowed { .. }
        ));
    }
}
