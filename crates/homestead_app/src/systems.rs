//! The demo world's game systems.
//!
//! Each builder returns a closure holding its own queries, trackers, and
//! serialisers, so per-tick state (change shadows, enter/exit memory)
//! stays private to the system that owns it.

use tracing::debug;

use homestead_ecs::{ExitTracker, Query};
use homestead_net::{Serializer, SyncMessage, WorldDelta, WorldSnapshot};

use crate::pipeline::TickContext;

/// Integrates velocity into position.
pub fn movement() -> impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send {
    let mut movers = Query::new(vec![]).with("position").with("velocity");
    move |ctx: &mut TickContext<'_>| {
        for entity in movers.run(ctx.world)? {
            let dx = ctx.world.get(entity, "velocity", "x")? * ctx.dt;
            let dy = ctx.world.get(entity, "velocity", "y")? * ctx.dt;
            let x = ctx.world.get(entity, "position", "x")?;
            let y = ctx.world.get(entity, "position", "y")?;
            ctx.world.set(entity, "position", "x", x + dx)?;
            ctx.world.set(entity, "position", "y", y + dy)?;
        }
        Ok(())
    }
}

/// Grows every resource toward ripeness.
pub fn regrowth() -> impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send {
    let mut resources = Query::new(vec![]).with("resource");
    move |ctx: &mut TickContext<'_>| {
        for entity in resources.run(ctx.world)? {
            let rate = ctx.world.get(entity, "resource", "regrow")?;
            let amount = ctx.world.get(entity, "resource", "amount")?;
            ctx.world
                .set(entity, "resource", "amount", amount + rate * ctx.dt)?;
        }
        Ok(())
    }
}

/// Removes ripe resources from the world.
pub fn harvest() -> impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send {
    let mut resources = Query::new(vec![]).with("resource");
    move |ctx: &mut TickContext<'_>| {
        for entity in resources.run(ctx.world)? {
            if ctx.world.get(entity, "resource", "amount")? >= 1.0 {
                let dump = ctx.world.inspect(entity)?;
                debug!(entity = %dump, "resource harvested");
                ctx.world.despawn(entity)?;
            }
        }
        Ok(())
    }
}

/// Emits a full-world snapshot on the first tick — the join payload a
/// freshly subscribed viewer bootstraps from.
pub fn join_snapshot(
    components: impl IntoIterator<Item = impl Into<String>>,
) -> impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send {
    let serializer = Serializer::new(components);
    let mut sent = false;
    move |ctx: &mut TickContext<'_>| {
        if sent {
            return Ok(());
        }
        sent = true;
        let records = serializer.serialize_world(ctx.world)?;
        ctx.outbound.push(SyncMessage::Snapshot(WorldSnapshot {
            world: ctx.world.name().to_string(),
            tick: ctx.tick_id,
            records,
        }));
        Ok(())
    }
}

/// Ships movement state for entities whose position changed this tick —
/// the narrow per-tick payload, not a full dump.
pub fn movement_sync() -> impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send {
    let mut moved = Query::new(vec![]).changed("position");
    let serializer = Serializer::new(["player", "velocity", "position"]);
    move |ctx: &mut TickContext<'_>| {
        let dirty = moved.run(ctx.world)?;
        if dirty.is_empty() {
            return Ok(());
        }
        let records = serializer.serialize(ctx.world, &dirty)?;
        ctx.outbound.push(SyncMessage::Delta(WorldDelta {
            world: ctx.world.name().to_string(),
            tick: ctx.tick_id,
            records,
            removed: Vec::new(),
        }));
        Ok(())
    }
}

/// Tells viewers which replicated entities disappeared this tick.
pub fn removal_sync() -> impl FnMut(&mut TickContext<'_>) -> anyhow::Result<()> + Send {
    let mut departures = ExitTracker::new(Query::new(vec![]).with("position"));
    move |ctx: &mut TickContext<'_>| {
        let removed = departures.take(ctx.world)?;
        if removed.is_empty() {
            return Ok(());
        }
        ctx.outbound.push(SyncMessage::Delta(WorldDelta {
            world: ctx.world.name().to_string(),
            tick: ctx.tick_id,
            records: Vec::new(),
            removed,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_ecs::{ComponentSchema, Registry, ScalarType, World};

    fn demo_world(registry: &mut Registry) -> &mut World {
        let world = registry.create_world("w").unwrap();
        world
            .register_components(&[
                ComponentSchema::new("position")
                    .scalar("x", ScalarType::F64)
                    .scalar("y", ScalarType::F64),
                ComponentSchema::new("velocity")
                    .scalar("x", ScalarType::F64)
                    .scalar("y", ScalarType::F64),
                ComponentSchema::new("player").scalar("score", ScalarType::U32),
                ComponentSchema::new("resource")
                    .scalar("amount", ScalarType::F32)
                    .scalar("regrow", ScalarType::F32),
            ])
            .unwrap();
        world
    }

    fn tick<'w>(world: &'w mut World, tick_id: u64) -> TickContext<'w> {
        TickContext {
            world,
            tick_id,
            dt: 0.5,
            outbound: Vec::new(),
        }
    }

    #[test]
    fn test_movement_integrates_velocity() {
        let mut registry = Registry::with_capacity(8);
        let world = demo_world(&mut registry);
        let e = world.spawn().unwrap();
        world.attach(e, "position").unwrap();
        world.attach(e, "velocity").unwrap();
        world.set(e, "position", "x", 10.0).unwrap();
        world.set(e, "velocity", "x", 2.0).unwrap();

        let mut system = movement();
        let mut ctx = tick(world, 1);
        system(&mut ctx).unwrap();

        assert_eq!(world.get(e, "position", "x").unwrap(), 11.0);
    }

    #[test]
    fn test_harvest_despawns_ripe_resources() {
        let mut registry = Registry::with_capacity(8);
        let world = demo_world(&mut registry);
        let ripe = world.spawn().unwrap();
        world.attach(ripe, "resource").unwrap();
        world.set(ripe, "resource", "amount", 1.5).unwrap();
        let growing = world.spawn().unwrap();
        world.attach(growing, "resource").unwrap();
        world.set(growing, "resource", "amount", 0.2).unwrap();

        let mut system = harvest();
        let mut ctx = tick(world, 1);
        system(&mut ctx).unwrap();

        assert!(!world.alive(ripe));
        assert!(world.alive(growing));
    }

    #[test]
    fn test_movement_sync_only_ships_movers() {
        let mut registry = Registry::with_capacity(8);
        let world = demo_world(&mut registry);
        let e = world.spawn().unwrap();
        world.attach(e, "position").unwrap();

        let mut system = movement_sync();

        // First observation: everything with a position is "changed".
        let mut ctx = tick(world, 1);
        system(&mut ctx).unwrap();
        assert_eq!(ctx.outbound.len(), 1);

        // Nothing moved since: no payload at all.
        let mut ctx = tick(world, 2);
        system(&mut ctx).unwrap();
        assert!(ctx.outbound.is_empty());
    }

    #[test]
    fn test_removal_sync_reports_despawns() {
        let mut registry = Registry::with_capacity(8);
        let world = demo_world(&mut registry);
        let e = world.spawn().unwrap();
        world.attach(e, "position").unwrap();

        let mut system = removal_sync();
        let mut ctx = tick(world, 1);
        system(&mut ctx).unwrap();
        assert!(ctx.outbound.is_empty());

        world.despawn(e).unwrap();
        let mut ctx = tick(world, 2);
        system(&mut ctx).unwrap();
        match &ctx.outbound[0] {
            SyncMessage::Delta(delta) => assert_eq!(delta.removed, vec![e]),
            SyncMessage::Snapshot(_) => panic!("expected a delta"),
        }
    }

    #[test]
    fn test_join_snapshot_fires_once() {
        let mut registry = Registry::with_capacity(8);
        let world = demo_world(&mut registry);
        let e = world.spawn().unwrap();
        world.attach(e, "player").unwrap();

        let mut system = join_snapshot(["player"]);
        let mut ctx = tick(world, 1);
        system(&mut ctx).unwrap();
        assert_eq!(ctx.outbound.len(), 1);

        let mut ctx = tick(world, 2);
        system(&mut ctx).unwrap();
        assert!(ctx.outbound.is_empty());
    }
}
