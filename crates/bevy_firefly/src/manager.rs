use std::collections::HashMap;

use bevy::prelude::*;

use crate::backend::{EffectBackend, TeardownScope};
use crate::lifecycle::{VesselEffect, VesselId};

/// Owns the effect controller of every tracked vessel.
#[derive(Resource, Debug, Default)]
pub struct EffectManager {
    vessels: HashMap<VesselId, VesselEffect>,
}

impl EffectManager {
    /// Starts tracking a vessel. Returns `false` if it was already tracked.
    pub fn register(&mut self, id: VesselId) -> bool {
        if self.vessels.contains_key(&id) {
            return false;
        }
        debug!("Tracking vessel {id:?}");
        self.vessels.insert(id, VesselEffect::new(id));
        true
    }

    /// Stops tracking a vessel, releasing everything it still holds.
    pub fn remove(&mut self, id: VesselId, backend: &mut impl EffectBackend) -> bool {
        let Some(mut effect) = self.vessels.remove(&id) else {
            return false;
        };
        effect.teardown(TeardownScope::Full, backend);
        debug!("Stopped tracking vessel {id:?}");
        true
    }

    /// Effect of a tracked vessel.
    pub fn get(&self, id: VesselId) -> Option<&VesselEffect> {
        self.vessels.get(&id)
    }

    /// Mutable effect of a tracked vessel.
    pub fn get_mut(&mut self, id: VesselId) -> Option<&mut VesselEffect> {
        self.vessels.get_mut(&id)
    }

    /// Whether the vessel is tracked.
    pub fn contains(&self, id: VesselId) -> bool {
        self.vessels.contains_key(&id)
    }

    /// Iterates over every tracked vessel, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &VesselEffect> {
        self.vessels.values()
    }

    /// Number of vessels whose effect is built.
    pub fn loaded_count(&self) -> usize {
        self.vessels.values().filter(|effect| effect.is_loaded()).count()
    }

    /// Number of tracked vessels.
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    /// Whether no vessel is tracked.
    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}
