//! # Middleware Module
//!
//! Rate limiting for the skill graph HTTP API.
//!
//! Two limiters run side by side:
//! - a global governor limiter in requests per second, over every route
//! - a per-client fixed window over the POST endpoints, keyed by client
//!   identity (`x-forwarded-for`, then `x-real-ip`, then the peer address)

use super::AppState;
use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Fallback rate when a zero rate reaches the governor limiter.
const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Identity used when no header or peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

// =============================================================================
// GLOBAL RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new global rate limiter.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    let quota = Quota::per_second(rps);
    Arc::new(RateLimiter::direct(quota))
}

/// Global rate limiting middleware.
///
/// Returns 429 Too Many Requests once the process-wide quota is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Global rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::new("Too Many Requests")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// PER-CLIENT RATE LIMITING
// =============================================================================

/// Outcome of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Counter store behind the per-client limiter.
///
/// The in-memory store is per process; a shared store can be plugged in for
/// multi-instance deployments.
pub trait RateLimitStore: Send + Sync {
    /// Count a request from `identity` and decide whether it may proceed.
    fn check(&self, identity: &str) -> RateDecision;

    /// Maximum requests per window.
    fn limit(&self) -> u32;

    fn window(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    started: Instant,
    count: u32,
}

/// Table size at which expired windows of all clients are dropped.
pub const SWEEP_THRESHOLD: usize = 4096;

/// In-memory fixed window counter keyed by client identity.
///
/// A window opens at the first request from an identity and resets once it
/// has fully elapsed.
#[derive(Debug)]
pub struct FixedWindowStore {
    limit: u32,
    window: Duration,
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl FixedWindowStore {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Identities currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Rate check against an explicit clock reading.
    pub fn check_at(&self, identity: &str, now: Instant) -> RateDecision {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);

        // Full sweep only once the table is large; otherwise just the caller's entry resets.
        if counters.len() >= SWEEP_THRESHOLD {
            counters.retain(|_, c| now.saturating_duration_since(c.started) < self.window);
        }

        let counter = counters
            .entry(identity.to_string())
            .or_insert(WindowCounter {
                started: now,
                count: 0,
            });
        if now.saturating_duration_since(counter.started) >= self.window {
            *counter = WindowCounter {
                started: now,
                count: 0,
            };
        }

        if counter.count >= self.limit {
            let elapsed = now.saturating_duration_since(counter.started);
            return RateDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }
        counter.count += 1;
        RateDecision::Allowed {
            remaining: self.limit - counter.count,
        }
    }
}

impl RateLimitStore for FixedWindowStore {
    fn check(&self, identity: &str) -> RateDecision {
        self.check_at(identity, Instant::now())
    }

    fn limit(&self) -> u32 {
        self.limit
    }

    fn window(&self) -> Duration {
        self.window
    }
}

/// Human-readable limit, e.g. "100 requests per minute".
pub fn describe_limit(limit: u32, window: Duration) -> String {
    match window.as_secs() {
        60 => format!("{} requests per minute", limit),
        1 => format!("{} requests per second", limit),
        secs => format!("{} requests per {} seconds", limit, secs),
    }
}

/// Resolve the client identity from proxy headers, then the peer address.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Per-client rate limiting middleware for the POST endpoints.
///
/// Returns 429 with a `Retry-After` header once a client exhausts its window.
pub async fn client_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(store) = state.client_limiter.as_ref() else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = client_identity(request.headers(), peer);

    match store.check(&identity) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %identity, "Client rate limit exceeded");
            let message = format!(
                "Rate limit exceeded. Max {}.",
                describe_limit(store.limit(), store.window())
            );
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, Json(ErrorResponse::new(message))).into_response();
            // Round up so clients never retry inside the window.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rate_limiter() {
        let limiter = create_rate_limiter(50);
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_create_rate_limiter_zero_defaults() {
        let limiter = create_rate_limiter(0);
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_fixed_window_limits_per_identity() {
        let store = FixedWindowStore::new(2, Duration::from_secs(60));
        let now = Instant::now();
        assert_eq!(
            store.check_at("a", now),
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            store.check_at("a", now),
            RateDecision::Allowed { remaining: 0 }
        );
        assert!(!store.check_at("a", now).is_allowed());
        assert!(store.check_at("b", now).is_allowed());
    }

    #[test]
    fn test_fixed_window_resets_after_window() {
        let store = FixedWindowStore::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(store.check_at("a", start).is_allowed());

        let later = start + Duration::from_secs(30);
        assert_eq!(
            store.check_at("a", later),
            RateDecision::Limited {
                retry_after: Duration::from_secs(30)
            }
        );

        assert!(store.check_at("a", start + Duration::from_secs(60)).is_allowed());
    }

    #[test]
    fn test_idle_clients_kept_below_sweep_threshold() {
        let store = FixedWindowStore::new(5, Duration::from_secs(60));
        let start = Instant::now();
        store.check_at("a", start);
        store.check_at("b", start);

        let later = start + Duration::from_secs(120);
        assert_eq!(
            store.check_at("a", later),
            RateDecision::Allowed { remaining: 4 }
        );
        assert_eq!(store.tracked_clients(), 2);
    }

    #[test]
    fn test_expired_windows_swept_at_threshold() {
        let store = FixedWindowStore::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..SWEEP_THRESHOLD {
            store.check_at(&format!("10.0.{}.{}", i / 256, i % 256), start);
        }
        assert_eq!(store.tracked_clients(), SWEEP_THRESHOLD);

        store.check_at("fresh", start + Duration::from_secs(61));
        assert_eq!(store.tracked_clients(), 1);
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let store = FixedWindowStore::new(0, Duration::from_secs(60));
        assert!(!store.check_at("a", Instant::now()).is_allowed());
    }

    #[test]
    fn test_client_identity_precedence() {
        let peer: SocketAddr = "10.0.0.9:4000".parse().expect("addr");
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers, None), UNKNOWN_CLIENT);
        assert_eq!(client_identity(&headers, Some(peer)), "10.0.0.9");

        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.7"));
        assert_eq!(client_identity(&headers, Some(peer)), "192.0.2.7");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.5 , 10.0.0.1"),
        );
        assert_eq!(client_identity(&headers, Some(peer)), "203.0.113.5");
    }

    #[test]
    fn test_describe_limit() {
        assert_eq!(
            describe_limit(100, Duration::from_secs(60)),
            "100 requests per minute"
        );
        assert_eq!(
            describe_limit(5, Duration::from_secs(10)),
            "5 requests per 10 seconds"
        );
    }
}
