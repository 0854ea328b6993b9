// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window outbound rate limiter.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Allows at most `max_calls` acquisitions per `window`, shared by all callers.
///
/// Callers over budget wait for the next window instead of failing. The window
/// lock is held while waiting, and tokio's mutex is FIFO, so queued callers are
/// admitted in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: u32,
    window: Duration,
    state: Mutex<Window>,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

impl RateLimiter {
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Waits until a slot in the current or a later window is available, then takes it.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if now.duration_since(state.started) >= self.window {
            state.started = now;
            state.used = 0;
        }
        if state.used >= self.max_calls {
            let resume_at = state.started + self.window;
            debug!(
                wait_ms = resume_at.saturating_duration_since(now).as_millis() as u64,
                "rate limit reached, queueing"
            );
            tokio::time::sleep_until(resume_at).await;
            state.started = resume_at;
            state.used = 0;
        }
        state.used += 1;
    }

    /// Slots left in the current window, without waiting.
    pub async fn available(&self) -> u32 {
        let state = self.state.lock().await;
        if Instant::now().duration_since(state.started) >= self.window {
            self.max_calls
        } else {
            self.max_calls - state.used
        }
    }
}
