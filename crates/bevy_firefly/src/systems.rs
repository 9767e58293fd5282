use bevy::prelude::*;

use crate::backend::EffectDrawQueue;
use crate::config::{BodyConfigStore, FireflyConfigAsset, FireflySettings};
use crate::geometry::VesselGeometry;
use crate::lifecycle::{FlightState, TickContext, VesselEvent, VesselId};
use crate::manager::EffectManager;

/// Handle of the config asset the plugin keeps applied.
#[derive(Resource, Debug, Clone)]
pub struct FireflyConfigHandle(pub Handle<FireflyConfigAsset>);

/// Asset path of the config file, relative to the asset root.
#[derive(Resource, Debug, Clone)]
pub struct FireflyConfigPath(pub String);

/// A lifecycle event for one vessel entity.
///
/// Trigger it with `commands.trigger(VesselLifecycleEvent::new(entity, VesselEvent::Loaded))`.
#[derive(Event, Debug, Clone)]
pub struct VesselLifecycleEvent {
    /// Entity carrying the vessel's [`VesselGeometry`] and [`FlightState`].
    pub vessel: Entity,
    /// What happened to it.
    pub kind: VesselEvent,
}

impl VesselLifecycleEvent {
    /// Creates an event for `vessel`.
    pub fn new(vessel: Entity, kind: VesselEvent) -> Self {
        Self { vessel, kind }
    }
}

pub fn load_config(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    existing: Option<Res<FireflyConfigHandle>>,
    path: Res<FireflyConfigPath>,
) {
    if existing.is_some() {
        return;
    }
    commands.insert_resource(FireflyConfigHandle(asset_server.load(path.0.clone())));
}

pub fn apply_config_asset(
    mut commands: Commands,
    mut asset_events: MessageReader<AssetEvent<FireflyConfigAsset>>,
    assets: Res<Assets<FireflyConfigAsset>>,
    handle: Option<Res<FireflyConfigHandle>>,
    mut manager: ResMut<EffectManager>,
    mut queue: ResMut<EffectDrawQueue>,
) {
    let Some(handle) = handle else {
        asset_events.clear();
        return;
    };

    let mut reloaded = false;
    let mut changed = false;
    for event in asset_events.read() {
        match event {
            AssetEvent::LoadedWithDependencies { id } if *id == handle.0.id() => changed = true,
            AssetEvent::Modified { id } if *id == handle.0.id() => {
                changed = true;
                reloaded = true;
            }
            _ => {}
        }
    }
    if !changed {
        return;
    }

    let Some(asset) = assets.get(&handle.0) else {
        return;
    };

    let store = match BodyConfigStore::from_asset(asset) {
        Ok(store) => store,
        Err(err) => {
            error!("Rejected effect config: {err}");
            return;
        }
    };

    info!(
        "Applied effect config with {} bodies",
        store.body_names().count()
    );
    commands.insert_resource(store);
    commands.insert_resource(asset.settings.clone());

    if reloaded {
        let ids: Vec<VesselId> = manager
            .iter()
            .filter(|effect| effect.is_loaded())
            .map(|effect| effect.id())
            .collect();
        for id in ids {
            if let Some(effect) = manager.get_mut(id) {
                effect.request_reload(queue.as_mut());
            }
        }
    }
}

pub fn register_vessels(
    mut manager: ResMut<EffectManager>,
    added: Query<Entity, Added<VesselGeometry>>,
) {
    for entity in added.iter() {
        manager.register(entity.into());
    }
}

pub fn cleanup_removed_vessels(
    mut manager: ResMut<EffectManager>,
    mut queue: ResMut<EffectDrawQueue>,
    mut removed: RemovedComponents<VesselGeometry>,
) {
    for entity in removed.read() {
        manager.remove(entity.into(), queue.as_mut());
    }
}

pub fn tick_vessel_effects(
    time: Res<Time>,
    settings: Res<FireflySettings>,
    store: Option<Res<BodyConfigStore>>,
    mut manager: ResMut<EffectManager>,
    mut queue: ResMut<EffectDrawQueue>,
    vessels: Query<(Entity, &VesselGeometry, &FlightState)>,
) {
    let Some(store) = store else {
        return;
    };

    let ctx = TickContext {
        settings: &settings,
        store: &store,
        dt: time.delta_secs(),
    };

    for (entity, geometry, flight) in vessels.iter() {
        let Some(effect) = manager.get_mut(entity.into()) else {
            continue;
        };
        effect.tick(flight, geometry, &ctx, queue.as_mut());
    }
}

pub fn on_vessel_lifecycle_event(
    event: On<VesselLifecycleEvent>,
    settings: Res<FireflySettings>,
    store: Option<Res<BodyConfigStore>>,
    mut manager: ResMut<EffectManager>,
    mut queue: ResMut<EffectDrawQueue>,
    vessels: Query<(&VesselGeometry, &FlightState)>,
) {
    let id = VesselId::from(event.vessel);

    if matches!(event.kind, VesselEvent::Destroyed) {
        manager.remove(id, queue.as_mut());
        return;
    }

    let Ok((geometry, flight)) = vessels.get(event.vessel) else {
        warn!("Ignoring {:?} for unknown vessel {id:?}", event.kind);
        return;
    };

    manager.register(id);
    let Some(effect) = manager.get_mut(id) else {
        return;
    };

    let Some(store) = store else {
        debug!("Deferring {:?} for vessel {id:?} until the effect config is applied", event.kind);
        effect.defer_event(&event.kind, queue.as_mut());
        return;
    };

    let ctx = TickContext {
        settings: &settings,
        store: &store,
        dt: 0.0,
    };
    effect.handle_event(&event.kind, flight, geometry, &ctx, queue.as_mut());
}
