#[cfg(test)]
#[path = "rate_limiter_test.rs"]
mod tests;

use std::time::Duration;

use tokio::time::Instant;

pub const MAX_REQUESTS: u32 = 3;
pub const WINDOW: Duration = Duration::from_millis(1000);
pub const COOLDOWN: Duration = Duration::from_millis(2000);

/// Short window throttle in front of the upstream API. Going over the window
/// ceiling arms a cooldown that rejects every check until it expires.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    cooldown: Duration,
    requests_in_window: u32,
    window_started_at: Instant,
    cooldown_until: Option<Instant>,
}

impl Default for RateLimiter {
    fn default() -> RateLimiter {
        return RateLimiter::new(MAX_REQUESTS, WINDOW, COOLDOWN);
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, cooldown: Duration) -> RateLimiter {
        return RateLimiter {
            max_requests,
            window,
            cooldown,
            requests_in_window: 0,
            window_started_at: Instant::now(),
            cooldown_until: None,
        };
    }

    pub fn cooldown(&self) -> Duration {
        return self.cooldown;
    }

    pub fn is_cooling_down(&self) -> bool {
        return self.cooldown_until.is_some();
    }

    pub fn check_short_window(&mut self) -> bool {
        return self.check_short_window_at(Instant::now());
    }

    pub fn check_short_window_at(&mut self, now: Instant) -> bool {
        if let Some(until) = self.cooldown_until {
            if now < until {
                return false;
            }

            self.cooldown_until = None;
            self.requests_in_window = 0;
            self.window_started_at = now;
        }

        if now.duration_since(self.window_started_at) > self.window {
            self.requests_in_window = 0;
            self.window_started_at = now;
        }

        self.requests_in_window += 1;
        if self.requests_in_window > self.max_requests {
            tracing::debug!(
                requests = self.requests_in_window,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Short window exceeded, cooling down"
            );
            self.cooldown_until = Some(now + self.cooldown);
            return false;
        }

        return true;
    }
}
