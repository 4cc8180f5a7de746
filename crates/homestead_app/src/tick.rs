//! Per-world tick loop.
//!
//! A [`WorldRunner`] owns a registry, the id of the world it drives, and
//! that world's [`Pipeline`]. Worlds share no state, so the host may run
//! one runner per task; systems within a single world's tick stay
//! strictly ordered.

// Some public APIs are not called from main() but are exercised by tests.
#![allow(dead_code)]

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use homestead_ecs::Registry;
use homestead_net::SyncMessage;

use crate::pipeline::{Pipeline, TickContext};

/// Configuration for a world runner.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            max_ticks: 0,
        }
    }
}

/// Drives one world's pipeline at a fixed tick rate.
pub struct WorldRunner {
    config: SimConfig,
    registry: Registry,
    world_id: String,
    pipeline: Pipeline,
    tick_id: u64,
}

impl WorldRunner {
    /// Create a runner for `world_id`, which must exist in `registry`.
    #[must_use]
    pub fn new(
        registry: Registry,
        world_id: impl Into<String>,
        pipeline: Pipeline,
        config: SimConfig,
    ) -> Self {
        Self {
            config,
            registry,
            world_id: world_id.into(),
            pipeline,
            tick_id: 0,
        }
    }

    /// The current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// The registry this runner owns.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The registry this runner owns, mutably.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Run one tick, returning the sync payloads the systems produced.
    ///
    /// # Errors
    ///
    /// Fails if the world is missing or a system errored; the world's
    /// structure stays consistent either way.
    pub fn tick(&mut self) -> anyhow::Result<Vec<SyncMessage>> {
        self.tick_id += 1;
        let world = self.registry.world_mut(&self.world_id)?;
        let mut ctx = TickContext {
            world,
            tick_id: self.tick_id,
            dt: 1.0 / self.config.tick_rate,
            outbound: Vec::new(),
        };
        self.pipeline.run(&mut ctx)?;
        debug!(
            world = %self.world_id,
            tick_id = self.tick_id,
            outbound = ctx.outbound.len(),
            "tick complete"
        );
        Ok(ctx.outbound)
    }

    /// Run the tick loop, forwarding sync payloads to `outbound`, until
    /// the configured tick count is reached or the channel closes.
    /// Returns the runner so the caller can inspect final world state.
    ///
    /// # Errors
    ///
    /// Propagates the first tick error.
    pub async fn run(mut self, outbound: UnboundedSender<SyncMessage>) -> anyhow::Result<Self> {
        let budget = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut interval = tokio::time::interval(budget);

        info!(
            world = %self.world_id,
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting world runner"
        );

        loop {
            interval.tick().await;
            let start = Instant::now();

            for message in self.tick()? {
                if outbound.send(message).is_err() {
                    warn!(world = %self.world_id, "sync channel closed; stopping runner");
                    return Ok(self);
                }
            }

            if self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks {
                info!(world = %self.world_id, ticks = self.tick_id, "world runner complete");
                return Ok(self);
            }

            let elapsed = start.elapsed();
            if elapsed > budget {
                warn!(
                    world = %self.world_id,
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
