//! deploy::monitor
//!
//! Observes a build and deployment after a successful upload.
//!
//! # Phases
//!
//! - **Build**: fetch the active build's logs under a [`RetryPolicy`].
//!   Exhausting the attempts is absorbed and the monitor moves on.
//! - **Deployment**: stream a bounded tail of deployment logs once.
//!   A failure here aborts the command.
//!
//! Whether a phase absorbs failures is an explicit [`PhasePolicy`].
//!
//! # Cancellation
//!
//! Every fetch and every backoff sleep is raced against the invocation's
//! cancellation token; cancelling stops the monitor without finishing the
//! remaining attempts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, BackendError, LogLine, LogSink, LogTarget};

use super::error::DeployError;
use super::report::{Reporter, BUILD_COMPLETED};
use super::trace::Tracer;
use super::until_cancelled;

/// Deployment log lines requested after the build.
pub const DEFAULT_DEPLOYMENT_LINES: usize = 1000;

/// Delay schedule between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Attempt `i` waits `i * step`.
    Linear(Duration),
    /// Attempt `i` waits `initial * 2^(i-1)`, capped at `max`. The first
    /// attempt does not wait.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Wait before the zero-based `attempt`.
    ///
    /// # Example
    ///
    /// ```
    /// use skyway::deploy::monitor::Backoff;
    /// use std::time::Duration;
    ///
    /// let linear = Backoff::Linear(Duration::from_millis(250));
    /// assert_eq!(linear.delay(0), Duration::ZERO);
    /// assert_eq!(linear.delay(2), Duration::from_millis(500));
    /// ```
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Exponential { initial, max } => {
                if attempt == 0 {
                    return Duration::ZERO;
                }
                let factor = 2u32.saturating_pow(attempt - 1);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Bounded retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Three attempts, waiting 0ms, 250ms and 500ms before each.
    pub const fn build_logs() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear(Duration::from_millis(250)),
        }
    }

    /// Waits before each attempt, in order.
    ///
    /// The wait for attempt `i` falls before that attempt runs, so the first
    /// attempt starts immediately and nothing waits after the last failure.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(|attempt| self.backoff.delay(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::build_logs()
    }
}

/// How a phase treats its final failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePolicy {
    /// Record the failure and continue instead of aborting.
    pub absorb_failures: bool,
}

impl PhasePolicy {
    pub const BEST_EFFORT: Self = Self {
        absorb_failures: true,
    };
    pub const REQUIRED: Self = Self {
        absorb_failures: false,
    };
}

/// How one phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Completed,
    /// The phase failed and its policy absorbed the error.
    Absorbed(BackendError),
}

/// What the monitor observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub build_attempts: u32,
    pub build: PhaseOutcome,
    pub deployment: PhaseOutcome,
}

/// Build and deployment log monitor.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    pub retry: RetryPolicy,
    pub build_phase: PhasePolicy,
    pub deployment_phase: PhasePolicy,
    pub deployment_lines: usize,
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::build_logs(),
            build_phase: PhasePolicy::BEST_EFFORT,
            deployment_phase: PhasePolicy::REQUIRED,
            deployment_lines: DEFAULT_DEPLOYMENT_LINES,
        }
    }
}

impl LogMonitor {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run both phases against `target`.
    ///
    /// # Errors
    ///
    /// - `DeploymentLogs` if deployment streaming fails under a required policy
    /// - `Backend` if the build phase fails under a required policy
    /// - `Cancelled` if `cancel` fires during any fetch or sleep
    pub async fn run(
        &self,
        backend: &dyn Backend,
        target: &LogTarget,
        sink: &dyn LogSink,
        reporter: &dyn Reporter,
        tracer: &dyn Tracer,
        cancel: &CancellationToken,
    ) -> Result<MonitorReport, DeployError> {
        let (build_attempts, build) = self
            .watch_build(backend, target, sink, tracer, cancel)
            .await?;

        reporter.notice("");
        reporter.notice(BUILD_COMPLETED);
        reporter.notice("");

        let deployment = match until_cancelled(
            cancel,
            backend.stream_deployment_logs(target, self.deployment_lines, sink),
        )
        .await?
        {
            Ok(()) => PhaseOutcome::Completed,
            Err(source) if self.deployment_phase.absorb_failures => {
                tracer.trace(&format!("Deployment logs unavailable: {}", source));
                PhaseOutcome::Absorbed(source)
            }
            Err(source) => return Err(DeployError::DeploymentLogs { source }),
        };

        Ok(MonitorReport {
            build_attempts,
            build,
            deployment,
        })
    }

    async fn watch_build(
        &self,
        backend: &dyn Backend,
        target: &LogTarget,
        sink: &dyn LogSink,
        tracer: &dyn Tracer,
        cancel: &CancellationToken,
    ) -> Result<(u32, PhaseOutcome), DeployError> {
        let mut attempts = 0;
        let mut last_error = None;
        let sink = Counted::new(sink);

        for delay in self.retry.delays() {
            if !delay.is_zero() {
                until_cancelled(cancel, tokio::time::sleep(delay)).await?;
            }
            attempts += 1;
            let offset = sink.delivered();
            tracing::debug!(attempt = attempts, ?delay, offset, "fetching active build logs");

            match until_cancelled(cancel, backend.fetch_active_build_logs(target, offset, &sink))
                .await?
            {
                Ok(()) => return Ok((attempts, PhaseOutcome::Completed)),
                Err(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "build log fetch failed");
                    last_error = Some(e);
                }
            }
        }

        let error = match last_error {
            Some(e) => e,
            // A zero-attempt policy never fetched anything.
            None => return Ok((0, PhaseOutcome::Completed)),
        };

        if self.build_phase.absorb_failures {
            tracer.trace(&format!(
                "No build logs available after {} attempts: {}",
                attempts, error
            ));
            Ok((attempts, PhaseOutcome::Absorbed(error)))
        } else {
            Err(DeployError::backend("fetch build logs", error))
        }
    }
}

/// Forwards lines and counts them, so a retry resumes after the last
/// delivered line.
struct Counted<'a> {
    inner: &'a dyn LogSink,
    delivered: AtomicUsize,
}

impl<'a> Counted<'a> {
    fn new(inner: &'a dyn LogSink) -> Self {
        Self {
            inner,
            delivered: AtomicUsize::new(0),
        }
    }

    fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl LogSink for Counted<'_> {
    fn line(&self, line: &LogLine) {
        self.inner.line(line);
        self.delivered.fetch_add(1, Ordering::SeqCst);
    }
}
