//! Sliding-window rate limiting.
//!
//! Two limiters share one window type:
//! - [`RateLimiter`]: outbound budget per upstream target (CRM, content feed)
//! - [`ClientRateLimiter`]: inbound budget per client IP, applied as middleware

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::{ClientRateLimitConfig, RateLimitConfig};
use crate::error::{ApiError, ErrorKind};
use crate::observability::metrics;

/// Recent request instants within a fixed-length window.
#[derive(Debug, Clone)]
pub struct RateWindow {
    timestamps: VecDeque<Instant>,
    limit: u32,
    window: Duration,
}

impl RateWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            limit,
            window,
        }
    }

    /// Drop instants that have left the window.
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a request at `now` if the window has room.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.prune(now);
        if self.timestamps.len() >= self.limit as usize {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    /// Time until the oldest recorded request leaves the window.
    pub fn time_until_reset_at(&mut self, now: Instant) -> Duration {
        self.prune(now);
        match self.timestamps.front() {
            Some(oldest) => self.window.saturating_sub(now.saturating_duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }

    /// Requests currently counted.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Upstream APIs with their own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiTarget {
    Crm,
    ContentFeed,
}

impl ApiTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiTarget::Crm => "crm",
            ApiTarget::ContentFeed => "content",
        }
    }
}

impl fmt::Display for ApiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A denied acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Rate limit exceeded for {target} API. Try again in {} seconds.", retry_after_secs(.retry_after))]
pub struct RateLimited {
    pub target: ApiTarget,
    pub retry_after: Duration,
}

/// Round a wait up to whole seconds for caller-facing hints.
pub fn retry_after_secs(retry_after: &Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

impl From<RateLimited> for ApiError {
    fn from(denied: RateLimited) -> Self {
        ApiError::local(ErrorKind::RateLimited, denied.to_string(), denied.target.as_str())
            .with_retry_after(denied.retry_after)
    }
}

/// Outbound limiter holding one window per target.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<ApiTarget, RateWindow>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_secs);
        Self::with_limits([
            (ApiTarget::Crm, config.crm_limit, window),
            (ApiTarget::ContentFeed, config.content_limit, window),
        ])
    }

    pub fn with_limits(limits: impl IntoIterator<Item = (ApiTarget, u32, Duration)>) -> Self {
        let windows = limits
            .into_iter()
            .map(|(target, limit, window)| (target, RateWindow::new(limit, window)))
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }

    /// Consume one request from `target`'s budget.
    pub fn try_acquire(&self, target: ApiTarget) -> Result<(), RateLimited> {
        self.try_acquire_at(target, Instant::now())
    }

    pub fn try_acquire_at(&self, target: ApiTarget, now: Instant) -> Result<(), RateLimited> {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let Some(window) = windows.get_mut(&target) else {
            return Ok(());
        };

        if window.try_acquire_at(now) {
            Ok(())
        } else {
            let retry_after = window.time_until_reset_at(now);
            tracing::warn!(api = %target, retry_after_ms = retry_after.as_millis() as u64, "Outbound rate limit exceeded");
            metrics::record_rate_limited(target.as_str());
            Err(RateLimited { target, retry_after })
        }
    }

    /// Time until `target`'s oldest counted request leaves the window.
    pub fn time_until_reset(&self, target: ApiTarget) -> Duration {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        windows
            .get_mut(&target)
            .map(|w| w.time_until_reset_at(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }
}

/// Inbound limiter keyed by client IP.
pub struct ClientRateLimiter {
    windows: DashMap<IpAddr, RateWindow>,
    limit: u32,
    window: Duration,
}

impl ClientRateLimiter {
    pub fn new(config: &ClientRateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            limit: config.max_requests,
            window: Duration::from_secs(config.window_secs),
        }
    }

    /// Returns the wait until the client may retry when denied.
    pub fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), Duration> {
        let mut entry = self
            .windows
            .entry(client)
            .or_insert_with(|| RateWindow::new(self.limit, self.window));

        if entry.try_acquire_at(now) {
            Ok(())
        } else {
            Err(entry.time_until_reset_at(now))
        }
    }

    /// Forget clients whose window has emptied.
    pub fn purge_idle(&self, now: Instant) {
        self.windows.retain(|_, window| {
            window.prune(now);
            !window.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Middleware enforcing the per-client limit.
pub async fn client_rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check_at(addr.ip(), Instant::now()) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(client = %addr.ip(), path = %request.uri().path(), "Client rate limit exceeded");
            metrics::record_rate_limited("client");
            ApiError::local(
                ErrorKind::RateLimited,
                "Too many requests from this IP, please try again later.",
                "client",
            )
            .with_retry_after(retry_after)
            .into_response()
        }
    }
}
