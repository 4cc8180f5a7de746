//! Enter/exit tracking across ticks.
//!
//! An [`EnterTracker`] or [`ExitTracker`] wraps a [`Query`] with private
//! memory of the previous call's `(entity, stamp)` pairs and reports the
//! difference. Comparing stamps rather than raw ids is what makes
//! destroy-and-recreate at one slot observable: the new occupant shares
//! the id but not the stamp, so it counts as both an exit of the old
//! entity and an entry of the new one.
//!
//! Each tracker is a single-consumer generator: call `take` exactly once
//! per tick, from one place, or its notion of "previous tick" drifts.

use std::collections::HashMap;

use crate::entity::{Entity, Stamp};
use crate::error::EcsError;
use crate::query::Query;
use crate::world::World;

type SeenMap = HashMap<Entity, Stamp>;

fn observe(
    query: &mut Query,
    world: &mut World,
) -> Result<(Vec<Entity>, SeenMap), EcsError> {
    let matches = query.run(world)?;
    let mut seen = HashMap::with_capacity(matches.len());
    for &entity in &matches {
        if let Some(stamp) = world.stamp(entity) {
            seen.insert(entity, stamp);
        }
    }
    Ok((matches, seen))
}

/// Reports entities that started matching a query since the last call.
#[derive(Debug)]
pub struct EnterTracker {
    query: Query,
    previous: HashMap<String, SeenMap>,
}

impl EnterTracker {
    /// Wrap a query. The tracker owns it; results come from [`Self::take`].
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            query,
            previous: HashMap::new(),
        }
    }

    /// Entities matching now that did not match last call — or that match
    /// at the same id with a different stamp (a recreated entity).
    ///
    /// # Errors
    ///
    /// Propagates the wrapped query's errors.
    pub fn take(&mut self, world: &mut World) -> Result<Vec<Entity>, EcsError> {
        let (matches, seen) = observe(&mut self.query, world)?;
        let previous = self.previous.entry(world.name().to_string()).or_default();
        let entered = matches
            .into_iter()
            .filter(|e| previous.get(e) != seen.get(e))
            .collect();
        *previous = seen;
        Ok(entered)
    }
}

/// Reports entities that stopped matching a query since the last call.
#[derive(Debug)]
pub struct ExitTracker {
    query: Query,
    previous: HashMap<String, SeenMap>,
}

impl ExitTracker {
    /// Wrap a query. The tracker owns it; results come from [`Self::take`].
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            query,
            previous: HashMap::new(),
        }
    }

    /// Entities that matched last call but are gone now — including ids
    /// that still match through a *different* occupant, whose old stamp
    /// has vanished.
    ///
    /// # Errors
    ///
    /// Propagates the wrapped query's errors.
    pub fn take(&mut self, world: &mut World) -> Result<Vec<Entity>, EcsError> {
        let (_, seen) = observe(&mut self.query, world)?;
        let previous = self.previous.entry(world.name().to_string()).or_default();
        let mut exited: Vec<Entity> = previous
            .iter()
            .filter(|&(e, stamp)| seen.get(e) != Some(stamp))
            .map(|(&e, _)| e)
            .collect();
        exited.sort();
        *previous = seen;
        Ok(exited)
    }
}
