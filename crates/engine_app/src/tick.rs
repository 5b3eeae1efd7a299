//! Fixed-timestep frame loop.
//!
//! Each tick calls [`Orchestrator::update_all`] with the fixed delta, then
//! sleeps for whatever remains of the frame budget.

use std::time::{Duration, Instant};

use engine_system::{Orchestrator, RuntimeError};
use tracing::{info, warn};

/// Configuration for the frame loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

#[derive(Debug)]
pub struct TickLoop {
    ticks: u64,
    config: TickConfig,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self { ticks: 0, config }
    }

    /// Ticks completed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one frame.
    ///
    /// # Errors
    ///
    /// Propagates the first failing system.
    pub fn tick(&mut self, runtime: &mut Orchestrator, dt: f64) -> Result<(), RuntimeError> {
        runtime.update_all(dt)?;
        self.ticks += 1;
        Ok(())
    }

    /// Run until `max_ticks` frames have completed, or forever when it is 0.
    ///
    /// # Errors
    ///
    /// Stops at the first failing frame. Fails before the first frame when
    /// the tick rate is not a positive finite number.
    pub async fn run(&mut self, runtime: &mut Orchestrator) -> Result<(), RuntimeError> {
        let budget = frame_budget(self.config.tick_rate)?;
        let dt = budget.as_secs_f64();

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();
            self.tick(runtime, dt)?;

            if self.config.max_ticks > 0 && self.ticks >= self.config.max_ticks {
                info!(ticks = self.ticks, "tick loop complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed < budget {
                tokio::time::sleep(budget - elapsed).await;
            } else {
                warn!(
                    tick = self.ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}

/// Wall-clock duration of one frame at `tick_rate` frames per second.
///
/// # Errors
///
/// Returns [`RuntimeError::Custom`] unless the rate is positive and the
/// resulting duration is representable.
pub fn frame_budget(tick_rate: f64) -> Result<Duration, RuntimeError> {
    if !(tick_rate.is_finite() && tick_rate > 0.0) {
        return Err(RuntimeError::Custom(format!(
            "tick rate must be a positive number, got {tick_rate}"
        )));
    }
    Duration::try_from_secs_f64(1.0 / tick_rate)
        .map_err(|err| RuntimeError::Custom(format!("invalid tick rate {tick_rate}: {err}")))
}
