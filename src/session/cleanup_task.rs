use serde::{Deserialize, Serialize};
use std::sync::Weak;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::SessionRegistry;

/// Configuration for the idle-session sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// How often the sweep runs
    pub sweep_interval: Duration,
    /// Sessions older than this are abandoned
    pub session_timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),   // 5 minutes
            session_timeout: Duration::from_secs(30 * 60), // 30 minutes
        }
    }
}

/// Periodically abandons expired sessions until the registry is dropped.
///
/// Holds only a weak reference so the task never keeps the registry alive.
pub async fn run_sweep_task(registry: Weak<SessionRegistry>, config: SweepConfig) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        session_timeout_secs = config.session_timeout.as_secs(),
        "Starting session sweep background task"
    );

    let mut sweep_interval = interval(config.sweep_interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    sweep_interval.tick().await;

    loop {
        sweep_interval.tick().await;

        let Some(registry) = registry.upgrade() else {
            info!("Session registry dropped, stopping sweep task");
            break;
        };

        debug!("Running session sweep");
        let abandoned = registry.sweep_expired().await;
        if abandoned > 0 {
            info!(abandoned = abandoned, "Session sweep completed");
        }
    }
}
