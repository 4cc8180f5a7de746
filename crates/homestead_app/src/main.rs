//! # homestead_app — Host
//!
//! The host wires the engine together: it compiles the component schema,
//! seeds an authoritative world, runs its system pipeline at a fixed
//! tick rate, and replicates state to a viewer holding its own registry
//! — the same shape a game server and a remote client have, with the
//! sync hub standing in for the wire.
//!
//! ## Startup sequence
//!
//! 1. Compile the schema and mint a lobby id for this session.
//! 2. Spawn the simulation task (registry + world + pipeline + runner).
//! 3. Spawn the viewer task (its own registry, fed by the hub).
//! 4. Join both and report how the mirror settled.

mod hub;
mod pipeline;
mod systems;
mod tick;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use homestead_ecs::{ComponentSchema, EnterTracker, Query, Registry, World};
use homestead_net::{Deserializer, SyncMessage, decode};
use homestead_schema::SchemaSet;

use hub::SyncHub;
use pipeline::Pipeline;
use tick::{SimConfig, WorldRunner};

/// The demo world's component schema.
const SCHEMA_SOURCE: &str = r"
    // Replicated world-state components.
    component position {
        x: f64,
        y: f64,
    }

    component velocity {
        x: f64,
        y: f64,
    }

    component player {
        score: u32,
    }

    component building {
        kind: u16,
        progress: f32,
    }

    component resource {
        amount: f32,
        regrow: f32,
    }

    component tile {
        kind: u16,
        variants: [u8; 4],
    }

    component item {
        kind: u16,
        quantity: u16,
    }
";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("homestead_app=info".parse()?),
        )
        .init();

    let world_id = format!("lobby-{}", Uuid::new_v4());
    info!(world = %world_id, "homestead host starting");

    let hub = Arc::new(SyncHub::new());
    let viewer_rx = hub.subscribe(&world_id);

    // Simulation → forwarder → hub → viewer.
    let (sync_tx, mut sync_rx) = unbounded_channel::<SyncMessage>();
    let forwarder = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            while let Some(message) = sync_rx.recv().await {
                match hub.publish(&message) {
                    Ok(delivered) => {
                        debug!(world = %message.world(), tick = message.tick(), delivered, "sync payload routed");
                    }
                    Err(err) => warn!(error = %err, "failed to publish sync payload"),
                }
            }
        })
    };

    let simulation = {
        let world_id = world_id.clone();
        tokio::spawn(async move { run_simulation(world_id, sync_tx).await })
    };
    let viewer = {
        let world_id = world_id.clone();
        tokio::spawn(async move { run_viewer(world_id, viewer_rx).await })
    };

    let runner = simulation.await??;
    forwarder.await?;
    // Dropping the hub closes every subscriber channel, letting the
    // viewer drain its backlog and stop.
    drop(hub);
    let summary = viewer.await??;

    info!(
        simulated_ticks = runner.tick_id(),
        viewer_entities = summary.live,
        snapshots = summary.snapshots,
        deltas = summary.deltas,
        "homestead host shut down"
    );
    Ok(())
}

fn compile_schemas() -> Result<Vec<ComponentSchema>> {
    let mut set = SchemaSet::new();
    set.load_source(SCHEMA_SOURCE)?;
    Ok(set.compile()?)
}

/// Build, seed, and run the authoritative world to completion.
async fn run_simulation(
    world_id: String,
    outbound: UnboundedSender<SyncMessage>,
) -> Result<WorldRunner> {
    let schemas = compile_schemas()?;
    let component_names: Vec<String> = schemas.iter().map(|s| s.name.clone()).collect();

    let mut registry = Registry::new();
    {
        let world = registry.create_world(world_id.as_str())?;
        world.register_components(&schemas)?;
        seed_world(world)?;
        info!(world = %world_id, entities = world.live_count(), "world seeded");
    }

    let pipeline = Pipeline::new()
        .with_system("join_snapshot", systems::join_snapshot(component_names))
        .with_system("movement", systems::movement())
        .with_system("regrowth", systems::regrowth())
        .with_system("harvest", systems::harvest())
        .with_system("movement_sync", systems::movement_sync())
        .with_system("removal_sync", systems::removal_sync());

    let config = SimConfig {
        tick_rate: 30.0,
        max_ticks: 12,
    };
    let runner = WorldRunner::new(registry, world_id.as_str(), pipeline, config)
        .run(outbound)
        .await?;

    let world = runner.registry().world(world_id.as_str())?;
    for entity in world.entities().into_iter().take(3) {
        let dump = world.inspect(entity)?;
        info!(entity = %dump, "final authoritative state");
    }
    Ok(runner)
}

/// Populate the demo world: one player, a building under construction,
/// regrowing resources, terrain tiles, and a loose item.
fn seed_world(world: &mut World) -> Result<()> {
    let player = world.spawn()?;
    for component in ["position", "velocity", "player"] {
        world.attach(player, component)?;
    }
    world.set(player, "position", "x", 10.0)?;
    world.set(player, "position", "y", 20.0)?;
    world.set(player, "velocity", "x", 2.0)?;

    let barn = world.spawn()?;
    for component in ["position", "building"] {
        world.attach(barn, component)?;
    }
    world.set(barn, "position", "x", 3.0)?;
    world.set(barn, "position", "y", 4.0)?;
    world.set(barn, "building", "kind", 1.0)?;

    for (i, amount) in [0.5, 0.9, 0.98].into_iter().enumerate() {
        let tree = world.spawn()?;
        for component in ["position", "resource"] {
            world.attach(tree, component)?;
        }
        world.set(tree, "position", "x", 5.0 * i as f64)?;
        world.set(tree, "position", "y", 8.0)?;
        world.set(tree, "resource", "amount", amount)?;
        world.set(tree, "resource", "regrow", 1.0)?;
    }

    for i in 0..4u32 {
        let tile = world.spawn()?;
        world.attach(tile, "tile")?;
        world.set(tile, "tile", "kind", 2.0)?;
        world.set_at(tile, "tile", "variants", 0, f64::from(i))?;
    }

    let item = world.spawn()?;
    world.attach(item, "item")?;
    world.set(item, "item", "kind", 3.0)?;
    world.set(item, "item", "quantity", 5.0)?;

    Ok(())
}

/// What the viewer observed once its channel drained.
struct ViewerSummary {
    live: usize,
    snapshots: u64,
    deltas: u64,
}

/// Mirror the authoritative world from sync payloads alone.
async fn run_viewer(
    world_id: String,
    mut inbound: UnboundedReceiver<Vec<u8>>,
) -> Result<ViewerSummary> {
    let schemas = compile_schemas()?;
    let mut registry = Registry::new();
    let world = registry.create_world(world_id.as_str())?;
    world.register_components(&schemas)?;

    let deserializer = Deserializer::new(schemas.iter().map(|s| s.name.clone()));
    let mut arrivals = EnterTracker::new(Query::new(vec![]).with("player"));
    let mut summary = ViewerSummary {
        live: 0,
        snapshots: 0,
        deltas: 0,
    };

    while let Some(bytes) = inbound.recv().await {
        match decode::<SyncMessage>(&bytes)? {
            SyncMessage::Snapshot(snapshot) => {
                summary.snapshots += 1;
                let merged = deserializer.apply(world, &snapshot.records)?;
                info!(world = %world_id, tick = snapshot.tick, entities = merged.len(), "joined with snapshot");
            }
            SyncMessage::Delta(delta) => {
                summary.deltas += 1;
                deserializer.apply(world, &delta.records)?;
                for entity in delta.removed {
                    if world.alive(entity) {
                        world.despawn(entity)?;
                    } else {
                        // A removal for something this viewer never saw is
                        // the sender's business, not an error here.
                        debug!(%entity, "skipping removal of unseen entity");
                    }
                }
            }
        }
        for entity in arrivals.take(world)? {
            let dump = world.inspect(entity)?;
            info!(player = %dump, "player appeared in view");
        }
    }

    summary.live = world.live_count();
    Ok(summary)
}
