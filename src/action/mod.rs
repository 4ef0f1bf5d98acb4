//! Action Coordinator
//!
//! Dispatches named control-plane actions and resolves what came back.
//!
//! The result channel is ambiguous by nature: an action that sets no result
//! fields looks the same whether it succeeded, failed or was still running
//! when the fetch gave up. The coordinator does not guess. It hands back the
//! raw result plus an [`ActionOutcome`] whose `Unknown` case callers must
//! handle, normally by checking an independent side effect (status
//! convergence, file contents, running processes).

mod outcome;
pub use outcome::*;


use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::utils::PollSchedule;
use crate::ActionConfig;
use crate::ActionError;
use crate::ActionHandle;
use crate::ActionParams;
use crate::ClusterController;
use crate::Error;
use crate::Result;

/// Slack granted to the collaborator on top of its own fetch timeout before
/// the fetch is considered hung
pub const RESOLVE_GRACE: Duration = Duration::from_secs(30);

pub struct ActionCoordinator<C: ClusterController> {
    controller: Arc<C>,
    config: ActionConfig,
}

impl<C: ClusterController> ActionCoordinator<C> {
    pub fn new(
        controller: Arc<C>,
        config: ActionConfig,
    ) -> Self {
        Self { controller, config }
    }

    /// Fire-and-forget dispatch.
    pub async fn invoke(
        &self,
        unit: &str,
        name: &str,
        params: &ActionParams,
    ) -> Result<ActionHandle> {
        let handle = self.controller.invoke_action(unit, name, params).await?;
        debug!(%handle, "action dispatched");
        Ok(handle)
    }

    /// Blocks until the control plane reports back or `timeout` elapses.
    ///
    /// Only a fetch that never returns is an error
    /// ([`ActionError::Timeout`]). An empty result is returned as is.
    pub async fn resolve(
        &self,
        handle: ActionHandle,
        timeout: Duration,
    ) -> Result<Resolution> {
        let fetch = self.controller.fetch_result(&handle, timeout);
        match tokio::time::timeout(timeout + RESOLVE_GRACE, fetch).await {
            Ok(result) => Ok(Resolution::new(handle, result?)),
            Err(_) => Err(ActionError::Timeout {
                unit: handle.unit,
                action: handle.name,
                timeout,
            }
            .into()),
        }
    }

    /// Dispatches and resolves with the configured budget.
    pub async fn run(
        &self,
        unit: &str,
        name: &str,
        params: &ActionParams,
    ) -> Result<Resolution> {
        self.run_within(unit, name, params, self.config.resolve_timeout())
            .await
    }

    #[instrument(skip(self, params))]
    async fn run_within(
        &self,
        unit: &str,
        name: &str,
        params: &ActionParams,
        timeout: Duration,
    ) -> Result<Resolution> {
        let handle = self.invoke(unit, name, params).await?;
        let resolution = self.resolve(handle, timeout).await?;
        match resolution.outcome() {
            ActionOutcome::Succeeded(fields) => {
                debug!(?fields, "action reported results")
            }
            ActionOutcome::Failed(message) => {
                warn!(%message, "action reported failure")
            }
            ActionOutcome::Unknown => warn!(
                completed = resolution.completed(),
                "action set no result fields; outcome must be verified by its side effects"
            ),
        }
        Ok(resolution)
    }

    /// Like [`run`](Self::run), but an explicitly reported failure becomes
    /// [`ActionError::Failed`]. `Unknown` still passes through.
    pub async fn run_checked(
        &self,
        unit: &str,
        name: &str,
    ) -> Result<Resolution> {
        let resolution = self.run(unit, name, &ActionParams::new()).await?;
        if let ActionOutcome::Failed(message) = resolution.outcome() {
            return Err(ActionError::Failed {
                unit: unit.to_string(),
                action: name.to_string(),
                message,
            }
            .into());
        }
        Ok(resolution)
    }

    /// Repeats `name` on `unit` until its result field `key` reads as true.
    ///
    /// Bounded by the readiness budget, including time spent waiting on each
    /// result; expiry is [`ActionError::ReadinessExhausted`], distinct from a
    /// convergence timeout because it polls an action result, not fleet
    /// status.
    #[instrument(skip(self))]
    pub async fn await_flag(
        &self,
        unit: &str,
        name: &str,
        key: &str,
    ) -> Result<Resolution> {
        let budget = self.config.readiness_budget();
        let mut schedule = PollSchedule::new(self.config.readiness_poll_interval(), budget);

        let polling = async {
            while schedule.next_attempt().await {
                let fetch_timeout = self.config.resolve_timeout().min(schedule.remaining());
                let resolution = self
                    .run_within(unit, name, &ActionParams::new(), fetch_timeout)
                    .await?;
                if resolution.flag(key) {
                    info!(attempts = schedule.attempts(), "{key} reported by {name}");
                    return Ok(Some(resolution));
                }
                debug!(attempt = schedule.attempts(), "{key} not reported yet");
            }
            Ok::<_, Error>(None)
        };

        match tokio::time::timeout(budget, polling).await {
            Ok(Ok(Some(resolution))) => return Ok(resolution),
            Ok(Err(e)) => return Err(e),
            Ok(Ok(None)) | Err(_) => {}
        }

        Err(ActionError::ReadinessExhausted {
            unit: unit.to_string(),
            action: name.to_string(),
            key: key.to_string(),
            budget,
            attempts: schedule.attempts(),
        }
        .into())
    }
}
