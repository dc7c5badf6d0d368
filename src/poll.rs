//! Bounded polling of external state
//!
//! Two shapes of eventual consistency live here:
//!
//! - [`wait_until`]: pure observation. A [`Probe`] is evaluated fresh on
//!   every tick until it is satisfied or the deadline passes. The probe
//!   must not mutate anything.
//! - [`retry_action_until`]: an idempotent action is *re-executed* every
//!   tick until its captured stdout carries a success signal. This is a
//!   different step type on purpose - conflating it with observation hides
//!   the fact that each tick has side effects.
//!
//! Tick timing is best-effort: ticks are monotonically spaced at least an
//! interval apart, with no wall-clock alignment guarantee.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::CommandOutput;
use crate::probe::Probe;
use crate::{Error, Result, POLLING_INTERVAL, POLLING_TIMEOUT};

/// Interval and deadline for one polled assertion
#[derive(Debug, Clone, Copy)]
pub struct PollSpec {
    /// Sleep between consecutive evaluations
    pub interval: Duration,
    /// Cumulative elapsed time after which the assertion fails
    pub timeout: Duration,
}

impl PollSpec {
    /// Create a spec, rejecting a zero interval or a timeout shorter than
    /// the interval
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidPollSpec("interval must be > 0".to_string()));
        }
        if timeout < interval {
            return Err(Error::InvalidPollSpec(format!(
                "timeout {:?} must be >= interval {:?}",
                timeout, interval
            )));
        }
        Ok(Self { interval, timeout })
    }

    /// The bounds every lifecycle assertion uses: 2s ticks, 2min deadline
    pub fn lifecycle() -> Self {
        Self {
            interval: POLLING_INTERVAL,
            timeout: POLLING_TIMEOUT,
        }
    }
}

impl Default for PollSpec {
    fn default() -> Self {
        Self::lifecycle()
    }
}

/// How the poller treats a probe that itself fails (as opposed to one that
/// observes an unsatisfied state)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnProbeError {
    /// Count the tick as a non-match and keep polling
    Retry,
    /// Abort the assertion immediately with the probe's error
    Fail,
}

/// Poll a probe until it is satisfied or the deadline passes.
///
/// The probe is evaluated immediately; a satisfied first observation
/// returns without sleeping. A deadline miss yields
/// [`Error::AssertionTimeout`] carrying the last observed state.
pub async fn wait_until(
    spec: &PollSpec,
    operation: &str,
    on_error: OnProbeError,
    probe: &dyn Probe,
) -> Result<()> {
    let start = Instant::now();
    let mut last_observed = String::from("<never observed>");

    loop {
        match probe.observe().await {
            Ok(obs) if obs.satisfied => {
                debug!(operation, elapsed = ?start.elapsed(), "assertion satisfied");
                return Ok(());
            }
            Ok(obs) => {
                debug!(operation, detail = %obs.detail, "not yet satisfied");
                last_observed = obs.detail;
            }
            Err(e) if on_error == OnProbeError::Fail => return Err(e),
            Err(e) => {
                warn!(operation, error = %e, "probe error, counting tick as non-match");
                last_observed = format!("probe error: {}", e);
            }
        }

        if start.elapsed() >= spec.timeout {
            return Err(Error::AssertionTimeout {
                operation: operation.to_string(),
                elapsed: start.elapsed(),
                last_observed,
            });
        }
        tokio::time::sleep(spec.interval).await;
    }
}

/// Re-execute an idempotent action until its stdout contains `signal`.
///
/// The action runs once per tick - it is not merely observed - so callers
/// must hand in something safe to repeat. Action errors abort immediately;
/// only an unsatisfied signal is retried. On success the output that
/// carried the signal is returned; on deadline the error carries the last
/// captured stdout.
pub async fn retry_action_until<F, Fut>(
    spec: &PollSpec,
    operation: &str,
    signal: &str,
    mut action: F,
) -> Result<CommandOutput>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CommandOutput>>,
{
    let start = Instant::now();
    let mut last_observed = String::from("<never executed>");

    loop {
        let output = action().await?;
        if output.stdout.contains(signal) {
            debug!(operation, elapsed = ?start.elapsed(), "signal observed");
            return Ok(output);
        }
        debug!(operation, "signal not present in output, will re-execute");
        last_observed = output.stdout.trim().to_string();

        if start.elapsed() >= spec.timeout {
            return Err(Error::AssertionTimeout {
                operation: operation.to_string(),
                elapsed: start.elapsed(),
                last_observed,
            });
        }
        tokio::time::sleep(spec.interval).await;
    }
}
