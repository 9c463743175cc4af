//! Periodic autosave driver.
//!
//! ## Schedule
//!
//! The first tick fires after `first_tick_delay` (so a freshly opened
//! workspace gets a baseline snapshot quickly), then every
//! `autosave_interval`. Missed ticks are delayed, not burst.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::KernelConfig;
use crate::history::TickOutcome;
use crate::store::Storage;
use crate::workspace::Workspace;

/// Shortest accepted tick period; zero would spin.
pub const MIN_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(1);

/// Errors from starting the autosave loop.
#[derive(Debug, thiserror::Error)]
pub enum AutosaveError {
    /// No Tokio runtime on the calling thread.
    #[error("Autosave requires a running Tokio runtime")]
    NoRuntime,
}

/// Background task that ticks a shared workspace.
#[derive(Debug)]
pub struct AutosaveLoop {
    handle: Option<JoinHandle<()>>,
    interval: Duration,
    first_delay: Duration,
}

impl AutosaveLoop {
    /// Create a stopped loop with the configured schedule.
    ///
    /// The interval is raised to [`MIN_AUTOSAVE_INTERVAL`] if shorter.
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            handle: None,
            interval: config.autosave_interval.max(MIN_AUTOSAVE_INTERVAL),
            first_delay: config.first_tick_delay,
        }
    }

    /// Start ticking. Restarting replaces the previous task.
    pub fn start<S>(&mut self, workspace: Arc<Mutex<Workspace<S>>>) -> Result<(), AutosaveError>
    where
        S: Storage + Clone + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| AutosaveError::NoRuntime)?;
        self.stop();

        let period = self.interval;
        let start = Instant::now() + self.first_delay;
        self.handle = Some(runtime.spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = workspace.lock().tick();
                if let TickOutcome::Committed(id) = outcome {
                    debug!(snapshot = %id, "autosave tick committed");
                }
            }
        }));
        info!(interval_ms = period.as_millis() as u64, "autosave started");
        Ok(())
    }

    /// Stop ticking. No-op if not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("autosave stopped");
        }
    }

    /// Whether the background task is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AutosaveLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
