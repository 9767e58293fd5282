pub use crate::{DEFAULT_CONFIG_PATH, FireflyPlugin};

pub use crate::backend::{
    BackendError, EffectBackend, EffectDrawQueue, EffectFrame, TeardownScope, VesselDrawState,
};
pub use crate::bounds::{VesselBounds, compute_bounds, compute_bounds_with_fallback};
pub use crate::camera::AirstreamFraming;
pub use crate::config::{
    BodyColors, BodyConfigStore, BodyEffectConfig, ColorSlot, EffectToggles, FireflyConfigAsset,
    FireflySettings, HdrColor, PartColorOverride, PlanetPackConfig,
};
pub use crate::envelope::EnvelopeEntry;
pub use crate::geometry::{
    MeshBounds, MeshGeometry, MeshKind, PartGeometry, PartModules, SurfaceId, VesselGeometry,
};
pub use crate::lifecycle::{
    AeroSignal, BodyInfo, EffectPhase, FlightState, LoadError, LoadOutcome, TickContext,
    VesselEffect, VesselEvent, VesselId,
};
pub use crate::manager::EffectManager;
pub use crate::material::{EffectMaterialParams, EffectMaterialUniform, EnvelopeDraw};
pub use crate::particles::{EmitterHandle, EmitterKind, ParticleEmitter, RateRange};
pub use crate::systems::{FireflyConfigHandle, VesselLifecycleEvent};
