//! Desired-state convergence
//!
//! Drives a fleet from whatever lifecycle state it is in to a requested
//! target (`RUNNING` / `STOPPED`) using two capabilities supplied by the
//! caller: observing the current state and requesting a transition.
//!
//! ```text
//! Observing ──(matches)──────────────────────────────▶ Converged
//!     │
//!     └──▶ TransitionRequested ──(error)──▶ Failed(TransitionRejected)
//!                 │
//!                 ▼
//!              Polling ──(matches)──▶ Converged
//!               │  ▲
//!               └──┘ sleep(poll_interval)
//!               │
//!               └──▶ Failed(Timeout | ObservationFailed | Cancelled)
//! ```
//!
//! Exactly one transition is requested per call; polling never re-issues it.

use crate::error::{CloudError, Result};
use crate::lifecycle::{DesiredState, FleetState, TransitionAction};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Delay between two observations while waiting for a transition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Poll budget applied when the caller sets neither an attempt limit nor a timeout
pub const DEFAULT_CONVERGE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Capabilities the convergence driver needs from a provider
#[async_trait]
pub trait FleetLifecycle: Send + Sync {
    /// Current lifecycle state, or `None` if the fleet does not exist
    async fn observe(&self, fleet: &str) -> Result<Option<FleetState>>;

    /// Ask the provider to start or stop the fleet
    async fn request_transition(&self, fleet: &str, action: TransitionAction) -> Result<()>;
}

/// Receiving side of a cancellation request
///
/// Cloning is cheap; every clone observes the same [`CancelHandle`].
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

/// Sending side of a cancellation request
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Create a connected cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx: Some(rx) })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    /// A signal that is never triggered
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once cancellation has been requested
    ///
    /// Never resolves if the handle is dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            let cancelled = *rx.borrow_and_update();
            if cancelled {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

/// Tuning for a single convergence run
#[derive(Debug, Clone)]
pub struct ConvergeOptions {
    /// Delay between observations
    pub poll_interval: Duration,

    /// Maximum number of observations in the polling phase
    pub max_attempts: Option<u32>,

    /// Wall-clock budget for the polling phase
    pub timeout: Option<Duration>,

    /// Observation failures tolerated while polling before giving up
    pub observation_retries: u32,

    pub cancel: CancelSignal,
}

impl Default for ConvergeOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            timeout: Some(DEFAULT_CONVERGE_TIMEOUT),
            observation_retries: 0,
            cancel: CancelSignal::never(),
        }
    }
}

impl ConvergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_observation_retries(mut self, retries: u32) -> Self {
        self.observation_retries = retries;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Timeout actually enforced; falls back to the default when no budget is set
    pub fn effective_timeout(&self) -> Option<Duration> {
        match (self.max_attempts, self.timeout) {
            (None, None) => Some(DEFAULT_CONVERGE_TIMEOUT),
            (_, timeout) => timeout,
        }
    }
}

/// Outcome of a successful convergence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    pub resource: String,

    /// Final observed state (always the requested target)
    pub state: FleetState,

    /// Observations made while polling, excluding the initial one
    pub polls: u32,

    /// Transition requests issued (0 or 1)
    pub transitions: u32,
}

impl Convergence {
    /// True when the fleet was already in the requested state
    pub fn was_noop(&self) -> bool {
        self.transitions == 0 && self.polls == 0
    }
}

/// Drive `fleet` to `target`
///
/// Returns as soon as an observation reports `target`. A target other than
/// `RUNNING`/`STOPPED` is only accepted when the fleet already reports it.
pub async fn converge(
    lifecycle: &dyn FleetLifecycle,
    fleet: &str,
    target: FleetState,
    options: &ConvergeOptions,
) -> Result<Convergence> {
    if fleet.trim().is_empty() {
        return Err(CloudError::InvalidConfig(
            "fleet name must not be empty".to_string(),
        ));
    }
    check_poll_interval(fleet, options)?;
    if options.cancel.is_cancelled() {
        return Err(CloudError::Cancelled(format!(
            "convergence of {} cancelled before start",
            fleet
        )));
    }

    let current = lifecycle
        .observe(fleet)
        .await
        .map_err(|e| observation_error(fleet, e))?
        .ok_or_else(|| CloudError::ResourceNotFound(fleet.to_string()))?;

    if current == target {
        tracing::info!("Fleet {} is already {}", fleet, target);
        return Ok(Convergence {
            resource: fleet.to_string(),
            state: current,
            polls: 0,
            transitions: 0,
        });
    }

    let desired = DesiredState::try_from(target).map_err(|state| CloudError::UnsupportedState {
        resource: fleet.to_string(),
        state,
    })?;

    if options.cancel.is_cancelled() {
        return Err(CloudError::Cancelled(format!(
            "convergence of {} cancelled before {}",
            fleet,
            desired.action()
        )));
    }

    let action = desired.action();
    tracing::info!(
        "Requesting {} of fleet {} ({} -> {})",
        action,
        fleet,
        current,
        target
    );
    lifecycle
        .request_transition(fleet, action)
        .await
        .map_err(|e| CloudError::TransitionRejected {
            resource: fleet.to_string(),
            source: Box::new(e),
        })?;

    let polls = poll_until(lifecycle, fleet, target, options).await?;

    Ok(Convergence {
        resource: fleet.to_string(),
        state: target,
        polls,
        transitions: 1,
    })
}

/// Wait for a fleet already in transit to reach `target`, without requesting
/// a transition
///
/// Used when another actor has started the transition (a STOPPING fleet that
/// must be STOPPED before it can be deleted, for example).
pub async fn await_state(
    lifecycle: &dyn FleetLifecycle,
    fleet: &str,
    target: FleetState,
    options: &ConvergeOptions,
) -> Result<Convergence> {
    check_poll_interval(fleet, options)?;
    tracing::info!("Waiting for fleet {} to become {}", fleet, target);
    let polls = poll_until(lifecycle, fleet, target, options).await?;
    Ok(Convergence {
        resource: fleet.to_string(),
        state: target,
        polls,
        transitions: 0,
    })
}

/// Converge several independent fleets concurrently
///
/// Results are returned in the order of `targets`.
pub async fn converge_all(
    lifecycle: &dyn FleetLifecycle,
    targets: &[(String, FleetState)],
    options: &ConvergeOptions,
) -> Vec<Result<Convergence>> {
    let runs = targets
        .iter()
        .map(|(fleet, target)| converge(lifecycle, fleet, *target, options));
    futures_util::future::join_all(runs).await
}

fn check_poll_interval(fleet: &str, options: &ConvergeOptions) -> Result<()> {
    if options.poll_interval.is_zero() {
        return Err(CloudError::InvalidConfig(format!(
            "poll interval for {} must be greater than zero",
            fleet
        )));
    }
    Ok(())
}

async fn poll_until(
    lifecycle: &dyn FleetLifecycle,
    fleet: &str,
    target: FleetState,
    options: &ConvergeOptions,
) -> Result<u32> {
    let deadline = options.effective_timeout().map(|t| Instant::now() + t);
    let mut polls = 0u32;
    let mut retries_left = options.observation_retries;

    loop {
        if options.cancel.is_cancelled() {
            return Err(cancelled(fleet, polls));
        }

        polls += 1;
        match lifecycle.observe(fleet).await {
            Ok(Some(state)) if state == target => {
                tracing::info!("Fleet {} reached {} after {} polls", fleet, target, polls);
                return Ok(polls);
            }
            Ok(Some(state)) => {
                tracing::debug!(
                    "Fleet {} is {} (waiting for {}, poll {})",
                    fleet,
                    state,
                    target,
                    polls
                );
            }
            Ok(None) => return Err(CloudError::ResourceNotFound(fleet.to_string())),
            Err(e) if retries_left > 0 && !e.is_not_found() => {
                retries_left -= 1;
                tracing::warn!(
                    "Observing fleet {} failed, {} retries left: {}",
                    fleet,
                    retries_left,
                    e
                );
            }
            Err(e) => return Err(observation_error(fleet, e)),
        }

        if let Some(max) = options.max_attempts
            && polls >= max
        {
            return Err(CloudError::Timeout(format!(
                "fleet {} did not reach {} after {} polls",
                fleet, target, polls
            )));
        }
        if let Some(deadline) = deadline
            && Instant::now() + options.poll_interval > deadline
        {
            return Err(CloudError::Timeout(format!(
                "fleet {} did not reach {} within the convergence timeout ({} polls)",
                fleet, target, polls
            )));
        }

        tokio::select! {
            _ = tokio::time::sleep(options.poll_interval) => {}
            _ = options.cancel.cancelled() => return Err(cancelled(fleet, polls)),
        }
    }
}

fn cancelled(fleet: &str, polls: u32) -> CloudError {
    CloudError::Cancelled(format!(
        "convergence of {} cancelled after {} polls",
        fleet, polls
    ))
}

fn observation_error(fleet: &str, err: CloudError) -> CloudError {
    if err.is_not_found() {
        return err;
    }
    CloudError::ObservationFailed {
        resource: fleet.to_string(),
        source: Box::new(err),
    }
}
