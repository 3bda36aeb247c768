//! The bounded health gate loop.

use std::time::Duration;

use tracing::{debug, info, warn};

use slipway_core::config::HealthConfig;

use crate::probe::{ProbeAttempt, http_probe};

/// Terminal result of one gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The endpoint matched the expected status on the given attempt.
    Healthy { attempts: u32 },
    /// The attempt budget ran out without a match.
    TimedOut { attempts: u32 },
}

impl GateOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, GateOutcome::Healthy { .. })
    }
}

/// What the gate should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStep {
    Continue,
    Exhausted,
}

/// Pure attempt counter — decides when the loop ends, independent of
/// probe I/O.
#[derive(Debug)]
pub struct GateClock {
    attempts: u32,
    limit: u32,
}

impl GateClock {
    pub fn new(limit: u32) -> Self {
        Self { attempts: 0, limit }
    }

    /// Record a failed attempt.
    pub fn record_failure(&mut self) -> GateStep {
        self.attempts += 1;
        if self.attempts >= self.limit {
            GateStep::Exhausted
        } else {
            GateStep::Continue
        }
    }

    /// Failed attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Polls a slot's health endpoint until success or the attempt budget
/// runs out.
#[derive(Debug, Clone)]
pub struct HealthGate {
    pub path: String,
    pub expect_status: u16,
    /// Attempt budget — one probe per interval tick.
    pub timeout: u32,
    pub interval: Duration,
}

impl HealthGate {
    pub fn from_config(health: &HealthConfig) -> Self {
        Self {
            path: health.path.clone(),
            expect_status: health.expect_status,
            timeout: health.timeout_secs,
            interval: Duration::from_millis(health.interval_ms),
        }
    }

    /// Wait for the slot on `port` to become healthy.
    ///
    /// Sleeps one interval, probes, and repeats. A hung attempt is cut
    /// off (after an interval, at minimum one second) and counted as a
    /// failure, so the loop always makes progress toward the budget.
    pub async fn wait(&self, port: u16) -> GateOutcome {
        let mut clock = GateClock::new(self.timeout);
        info!(
            port,
            path = %self.path,
            limit = self.timeout,
            "health gate waiting"
        );

        loop {
            tokio::time::sleep(self.interval).await;
            let attempt = tokio::time::timeout(
                self.interval.max(Duration::from_secs(1)),
                http_probe(port, &self.path, self.expect_status),
            )
            .await
            .unwrap_or(ProbeAttempt::ConnectFailed);

            match attempt {
                ProbeAttempt::StatusMatch => {
                    let attempts = clock.attempts() + 1;
                    info!(port, attempts, "health gate passed");
                    return GateOutcome::Healthy { attempts };
                }
                other => {
                    debug!(port, attempt = ?other, "health attempt failed");
                    if clock.record_failure() == GateStep::Exhausted {
                        warn!(
                            port,
                            attempts = clock.attempts(),
                            "health gate timed out"
                        );
                        return GateOutcome::TimedOut {
                            attempts: clock.attempts(),
                        };
                    }
                }
            }
        }
    }
}
