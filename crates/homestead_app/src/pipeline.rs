//! The system pipeline — the host's per-tick execution convention.
//!
//! A system is a named closure over a [`TickContext`]; the pipeline runs
//! them in registration order, nothing more. There is no dependency
//! graph, no conflict analysis, no parallelism inside one world's tick —
//! ordering is a fixed choice the host makes once, here. The first
//! system error aborts the rest of that world's tick; other worlds are
//! unaffected because they run on their own pipelines.

// Some public APIs are not called from main() but are exercised by tests.
#![allow(dead_code)]

use tracing::warn;

use homestead_ecs::World;
use homestead_net::SyncMessage;

/// Per-tick state handed to each system.
pub struct TickContext<'w> {
    /// The world being ticked.
    pub world: &'w mut World,
    /// Monotonically increasing tick counter.
    pub tick_id: u64,
    /// Delta time since the last tick, in seconds.
    pub dt: f64,
    /// Sync payloads produced this tick, drained by the host afterwards.
    pub outbound: Vec<SyncMessage>,
}

type SystemFn = Box<dyn FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send>;

/// An ordered list of named systems.
#[derive(Default)]
pub struct Pipeline {
    systems: Vec<(String, SystemFn)>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system. Registration order is execution order.
    #[must_use]
    pub fn with_system(
        mut self,
        name: impl Into<String>,
        system: impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.systems.push((name.into(), Box::new(system)));
        self
    }

    /// The registered system names, in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// The number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether the pipeline has no systems.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Run every system once, in order. The first error aborts the tick.
    ///
    /// # Errors
    ///
    /// The failing system's error, after logging which system it was.
    pub fn run(&mut self, ctx: &mut TickContext<'_>) -> anyhow::Result<()> {
        for (name, system) in &mut self.systems {
            if let Err(err) = system(ctx) {
                warn!(system = %name, tick_id = ctx.tick_id, error = %err, "system failed; aborting tick");
                return Err(err);
            }
        }
        Ok(())
    }
}
