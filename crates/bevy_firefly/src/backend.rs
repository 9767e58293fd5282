//! The renderer seam of the effect and a polling implementation of it.

use std::collections::HashMap;

use bevy::prelude::*;
use thiserror::Error;

use crate::bounds::VesselBounds;
use crate::camera::AirstreamFraming;
use crate::geometry::SurfaceId;
use crate::lifecycle::VesselId;
use crate::material::{EffectMaterialParams, EnvelopeDraw};

/// How much of a vessel's effect is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownScope {
    /// Envelopes and emitters only. Camera and material survive for a quick rebuild.
    EnvelopesOnly,
    /// Everything the vessel owns on the renderer side.
    Full,
}

/// Per-tick output of a loaded vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectFrame {
    /// Material parameters for this tick.
    pub material: EffectMaterialParams,
    /// Where the airstream camera looks from.
    pub camera: AirstreamFraming,
}

/// Failure to create the renderer-side resources of a vessel.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Shaders or render targets are still loading.
    #[error("effect render resources are not ready")]
    NotReady,
    /// A resource could not be created.
    #[error("could not create {resource}: {reason}")]
    Creation {
        /// Kind of resource, e.g. `"camera"`.
        resource: &'static str,
        /// Renderer-provided reason.
        reason: String,
    },
}

/// The renderer side of the effect.
///
/// Implementations own cameras, materials and draw submission; the lifecycle only
/// decides what to create, draw and release.
pub trait EffectBackend {
    /// Creates the camera and material of a vessel. Called once per full load.
    fn create_resources(&mut self, vessel: VesselId, bounds: &VesselBounds) -> Result<(), BackendError>;
    /// Replaces the envelope surfaces drawn for a vessel.
    fn submit_envelope(&mut self, vessel: VesselId, draws: Vec<EnvelopeDraw>);
    /// Publishes the material and camera state of the current tick.
    fn submit_frame(&mut self, vessel: VesselId, frame: &EffectFrame);
    /// Drops the resources covered by `scope`.
    fn release(&mut self, vessel: VesselId, scope: TeardownScope);
}

/// Draw state of one vessel, as polled by the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VesselDrawState {
    /// Surfaces to draw the effect shell on.
    pub envelope: Vec<EnvelopeDraw>,
    /// Latest tick output. `None` until the first tick after a (re)build.
    pub frame: Option<EffectFrame>,
}

impl VesselDrawState {
    /// Surfaces whose regular rendering is replaced by the effect.
    pub fn hidden_surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.envelope
            .iter()
            .filter(|draw| draw.entry.hides_source)
            .map(|draw| draw.entry.surface)
    }
}

/// Default [`EffectBackend`]: keeps the latest draw state of every vessel for the
/// renderer to pick up.
#[derive(Resource, Debug)]
pub struct EffectDrawQueue {
    /// Resource creation fails while this is unset, e.g. while shaders are loading.
    pub ready: bool,
    vessels: HashMap<VesselId, VesselDrawState>,
}

impl Default for EffectDrawQueue {
    fn default() -> Self {
        Self {
            ready: true,
            vessels: HashMap::new(),
        }
    }
}

impl EffectDrawQueue {
    /// Draw state of `vessel`, if it has renderer resources.
    pub fn get(&self, vessel: VesselId) -> Option<&VesselDrawState> {
        self.vessels.get(&vessel)
    }

    /// Iterates over every queued vessel.
    pub fn iter(&self) -> impl Iterator<Item = (&VesselId, &VesselDrawState)> {
        self.vessels.iter()
    }

    /// Number of vessels with renderer resources.
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    /// Whether no vessel has renderer resources.
    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

impl EffectBackend for EffectDrawQueue {
    fn create_resources(&mut self, vessel: VesselId, _bounds: &VesselBounds) -> Result<(), BackendError> {
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        self.vessels.entry(vessel).or_default();
        Ok(())
    }

    fn submit_envelope(&mut self, vessel: VesselId, draws: Vec<EnvelopeDraw>) {
        if let Some(state) = self.vessels.get_mut(&vessel) {
            state.envelope = draws;
        }
    }

    fn submit_frame(&mut self, vessel: VesselId, frame: &EffectFrame) {
        if let Some(state) = self.vessels.get_mut(&vessel) {
            state.frame = Some(*frame);
        }
    }

    fn release(&mut self, vessel: VesselId, scope: TeardownScope) {
        match scope {
            TeardownScope::EnvelopesOnly => {
                if let Some(state) = self.vessels.get_mut(&vessel) {
                    state.envelope.clear();
                    state.frame = None;
                }
            }
            TeardownScope::Full => {
                self.vessels.remove(&vessel);
            }
        }
    }
}
