#![deny(missing_docs)]

//! **Firefly** drives atmospheric entry effects for vessels in the
//! [Bevy game engine](https://bevyengine.org/): a glowing plasma envelope
//! wrapped around the vessel, trailing sparks, debris and smoke, and the
//! camera and material state needed to render the airstream.
//!
//! # Getting started
//!
//! Add [`FireflyPlugin`] to your app and ship a `firefly.ron` config in your
//! asset folder:
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_firefly::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins((DefaultPlugins, FireflyPlugin::default()))
//!         .run();
//! }
//! ```
//!
//! ## Tracking a vessel
//!
//! A vessel is an entity with a [`VesselGeometry`] and a [`FlightState`]. The
//! host keeps both up to date and reports structural changes with
//! [`VesselLifecycleEvent`]:
//!
//! ```
//! use bevy::math::Affine3A;
//! use bevy::prelude::*;
//! use bevy_firefly::prelude::*;
//!
//! fn spawn_vessel(mut commands: Commands) {
//!     let vessel = commands
//!         .spawn((
//!             VesselGeometry::new(Affine3A::IDENTITY, vec![PartGeometry::new("mk1pod.v2")]),
//!             FlightState::new(BodyInfo::new("Kerbin", Some(70_000.0)), 30_000.0),
//!         ))
//!         .id();
//!     commands.trigger(VesselLifecycleEvent::new(vessel, VesselEvent::Loaded));
//! }
//! ```
//!
//! Once loaded, every fixed tick smooths the entry speed, updates the
//! particle emitters and writes the latest frame to the [`EffectDrawQueue`].
//!
//! # Config
//!
//! Per-body colors and multipliers live in a [`FireflyConfigAsset`]. Lookups
//! for bodies without a config fall back to the `Default` body, which every
//! config must define. See the [`config`] module for the file layout.

/// Renderer seam and the polling draw queue.
pub mod backend;
/// Vessel-local bounding boxes.
pub mod bounds;
/// Airstream camera framing.
pub mod camera;
/// Body configs, global settings and the config asset loader.
pub mod config;
/// Effect envelope selection.
pub mod envelope;
/// Host-supplied vessel, part and mesh geometry.
pub mod geometry;
/// Per-vessel effect state machine.
pub mod lifecycle;
/// Registry of tracked vessels.
pub mod manager;
/// Material parameters and per-envelope draw data.
pub mod material;
/// Particle emitters and their emission rates.
pub mod particles;
/// Convenience re-exports for common types.
pub mod prelude;
/// Entry speed smoothing.
pub mod smoothing;
mod systems;

use bevy::prelude::*;

use backend::EffectDrawQueue;
use config::{FireflyConfigAsset, FireflyConfigLoader, FireflySettings};
use manager::EffectManager;
use systems::{
    FireflyConfigPath, apply_config_asset, cleanup_removed_vessels, load_config,
    on_vessel_lifecycle_event, register_vessels, tick_vessel_effects,
};

/// Default asset path of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "firefly.ron";

/// Plugin that adds atmospheric entry effects to a Bevy app.
///
/// Registers the config asset loader, the vessel effect manager and the
/// systems that drive it.
pub struct FireflyPlugin {
    /// Config path, relative to the asset root.
    pub config_path: String,
}

impl Default for FireflyPlugin {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
        }
    }
}

impl Plugin for FireflyPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<FireflyConfigAsset>()
            .init_asset_loader::<FireflyConfigLoader>();

        app.init_resource::<FireflySettings>()
            .init_resource::<EffectManager>()
            .init_resource::<EffectDrawQueue>()
            .insert_resource(FireflyConfigPath(self.config_path.clone()));

        app.add_observer(on_vessel_lifecycle_event);

        app.add_systems(Startup, load_config)
            .add_systems(
                Update,
                (apply_config_asset, register_vessels, cleanup_removed_vessels).chain(),
            )
            .add_systems(FixedPostUpdate, tick_vessel_effects);
    }
}

pub use backend::{EffectBackend, EffectFrame, TeardownScope};
pub use config::{BodyConfigStore, BodyEffectConfig};
pub use geometry::{PartGeometry, VesselGeometry};
pub use lifecycle::{FlightState, VesselEffect, VesselEvent, VesselId};
pub use systems::{FireflyConfigHandle, VesselLifecycleEvent};
