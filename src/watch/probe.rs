// src/watch/probe.rs

//! Heuristic for "the external tool has finished writing this file".
//!
//! The build tool rewrites the descriptor asynchronously, so the first watch
//! event usually arrives mid-write. The probe samples the file's byte size at
//! a short interval and declares the file stable once the size has stayed
//! unchanged for a continuous window. If stability is never observed within
//! the total timeout, it gives up and reports [`StabilityOutcome::TimedOut`]:
//! proceeding with a possibly-incomplete file is safer than wedging the event
//! loop, and the idempotence check downstream keeps a half-read from causing
//! a double patch on the next cycle.

use std::path::Path;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::config::TimingSection;

/// How a stability wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityOutcome {
    /// Size unchanged for the full stability window.
    Stable,
    /// Total timeout elapsed first; content may still be in flux.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct StabilityProbe {
    poll_interval: Duration,
    stable_for: Duration,
    timeout: Duration,
}

impl StabilityProbe {
    pub fn new(poll_interval: Duration, stable_for: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            stable_for,
            timeout,
        }
    }

    pub fn from_timing(timing: &TimingSection) -> Self {
        Self::new(
            timing.poll_interval(),
            timing.stable_for(),
            timing.stability_timeout(),
        )
    }

    /// Block (asynchronously) until `path` looks fully written.
    ///
    /// A missing file is "not yet stable", not an error: the create event can
    /// outrun the first visible directory entry, and the timeout bounds the
    /// wait either way.
    pub async fn wait_until_stable(&self, path: &Path) -> StabilityOutcome {
        let start = Instant::now();
        let mut last_size: Option<u64> = None;
        let mut stable_since: Option<Instant> = None;

        loop {
            if start.elapsed() > self.timeout {
                warn!(path = ?path, "timeout waiting for file to stabilize");
                return StabilityOutcome::TimedOut;
            }

            let size = tokio::fs::metadata(path).await.ok().map(|m| m.len());

            match (size, last_size) {
                (Some(size), Some(prev)) if size == prev => {
                    let since = stable_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= self.stable_for {
                        return StabilityOutcome::Stable;
                    }
                }
                (size, _) => {
                    // Size changed (or the file vanished/appeared): restart
                    // the stability window.
                    stable_since = None;
                    last_size = size;
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}
