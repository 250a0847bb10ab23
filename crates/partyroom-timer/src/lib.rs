//! Deferred deadlines for room actors.
//!
//! A [`Countdown`] is a one-shot timer that lives inside an actor's
//! `tokio::select!` loop. It is armed and cancelled explicitly, can be
//! frozen while a game is paused, and runs on Tokio's clock, so tests can
//! drive it with `tokio::time::pause()` / `advance()`.
//!
//! When nothing is armed, [`Countdown::wait`] pends forever, which lets the
//! select branch stay in place unconditionally:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* may arm or cancel */ }
//!         _ = cleanup.wait() => break,
//!         expiry = turn_timer.wait() => { /* announce timeout */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// Returned by [`Countdown::wait`] when the deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// How many times this countdown has expired, including this one.
    pub count: u64,
    /// How far past the deadline the actor got round to noticing.
    pub late_by: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running { deadline: Instant },
    Frozen { remaining: Duration },
}

/// A cancellable, pausable one-shot timer.
#[derive(Debug)]
pub struct Countdown {
    label: &'static str,
    state: State,
    expired: u64,
}

impl Countdown {
    /// Creates an idle countdown. `label` only appears in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: State::Idle,
            expired: 0,
        }
    }

    /// Starts (or restarts) the countdown so it expires `after` from now.
    ///
    /// Re-arming a frozen countdown keeps it frozen with the new duration.
    pub fn arm(&mut self, after: Duration) {
        self.state = match self.state {
            State::Frozen { .. } => State::Frozen { remaining: after },
            _ => State::Running {
                deadline: Instant::now() + after,
            },
        };
        debug!(timer = self.label, after_ms = after.as_millis() as u64, "countdown armed");
    }

    /// Disarms the countdown. A no-op when idle.
    pub fn cancel(&mut self) {
        if self.state != State::Idle {
            self.state = State::Idle;
            debug!(timer = self.label, "countdown cancelled");
        }
    }

    /// Freezes a running countdown, keeping the time that was left.
    ///
    /// Idempotent; does nothing when idle.
    pub fn pause(&mut self) {
        if let State::Running { deadline } = self.state {
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.state = State::Frozen { remaining };
            debug!(timer = self.label, remaining_ms = remaining.as_millis() as u64, "countdown paused");
        }
    }

    /// Restarts a frozen countdown with the time it had left.
    pub fn resume(&mut self) {
        if let State::Frozen { remaining } = self.state {
            self.state = State::Running {
                deadline: Instant::now() + remaining,
            };
            debug!(timer = self.label, remaining_ms = remaining.as_millis() as u64, "countdown resumed");
        }
    }

    /// Running or frozen.
    pub fn is_armed(&self) -> bool {
        self.state != State::Idle
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, State::Frozen { .. })
    }

    /// Time left before expiry, or `None` when idle.
    pub fn remaining(&self) -> Option<Duration> {
        match self.state {
            State::Idle => None,
            State::Running { deadline } => Some(deadline.saturating_duration_since(Instant::now())),
            State::Frozen { remaining } => Some(remaining),
        }
    }

    /// Times this countdown has expired so far.
    pub fn expired_count(&self) -> u64 {
        self.expired
    }

    /// Resolves when the running deadline passes, then returns to idle.
    ///
    /// Pends forever while idle or frozen. Cancel-safe: dropping the
    /// future before it resolves leaves the countdown untouched.
    pub async fn wait(&mut self) -> Expiry {
        let State::Running { deadline } = self.state else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        self.state = State::Idle;
        self.expired += 1;
        let late_by = Instant::now().saturating_duration_since(deadline);
        trace!(timer = self.label, count = self.expired, "countdown expired");

        Expiry {
            count: self.expired,
            late_by,
        }
    }
}
