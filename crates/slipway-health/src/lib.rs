//! slipway-health — the health gate that promotion hinges on.
//!
//! One HTTP GET per interval tick against the target slot's local port;
//! the loop ends on the first exact status match, or as unhealthy when
//! the attempt count reaches the configured limit. Connection refused is
//! an expected, non-terminating failure while the process is still
//! starting — a slow starter and a genuinely unhealthy process look the
//! same here, so operators size the timeout generously.

pub mod gate;
pub mod probe;

pub use gate::{GateClock, GateOutcome, GateStep, HealthGate};
pub use probe::{ProbeAttempt, http_probe};
