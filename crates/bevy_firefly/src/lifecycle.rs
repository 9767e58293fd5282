use bevy::prelude::*;
use thiserror::Error;

use crate::backend::{BackendError, EffectBackend, EffectFrame, TeardownScope};
use crate::bounds::{VesselBounds, compute_bounds_with_fallback};
use crate::camera::AirstreamFraming;
use crate::config::{BodyConfigStore, BodyEffectConfig, FireflySettings};
use crate::envelope::{EnvelopeEntry, build_envelope};
use crate::geometry::VesselGeometry;
use crate::material::{EffectMaterialParams, angle_of_attack, envelope_draws};
use crate::particles::{
    EmitterPlacement, FlowDirection, ParticleEmitter, ParticleRateController, create_emitters,
};
use crate::smoothing::{adjusted_entry_speed, raw_entry_signal, smooth};

/// Ticks between the engine loading a vessel and the first effect build.
pub const LOAD_DELAY_TICKS: u32 = 20;

/// Ticks between a structural change and the rebuild.
pub const RELOAD_DELAY_TICKS: u32 = 1;

/// Stable identity of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VesselId(pub u64);

impl From<Entity> for VesselId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

/// The celestial body a vessel is currently in.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyInfo {
    /// Body name, the key of its effect config.
    pub name: String,
    /// Airless bodies never show effects.
    pub has_atmosphere: bool,
    /// Altitude of the top of the atmosphere.
    pub atmosphere_depth: f64,
}

impl BodyInfo {
    /// A body whose atmosphere reaches `atmosphere_depth`, or an airless one for `None`.
    pub fn new(name: impl Into<String>, atmosphere_depth: Option<f64>) -> Self {
        Self {
            name: name.into(),
            has_atmosphere: atmosphere_depth.is_some(),
            atmosphere_depth: atmosphere_depth.unwrap_or(0.0),
        }
    }
}

/// Raw aerodynamic effect signal reported by the physics simulation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AeroSignal {
    /// Instantaneous intensity, roughly 0..1.
    pub fx_scalar: f32,
    /// 0..1 ramp of the aerodynamic effect state.
    pub fx_state: f32,
}

/// Flight state of a vessel, updated by the host every simulation tick.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct FlightState {
    /// Aerodynamic effect signal of this tick.
    pub aero: AeroSignal,
    /// World-space surface-relative velocity.
    pub surface_velocity: Vec3,
    /// Altitude above sea level.
    pub altitude: f64,
    /// Body the vessel is in.
    pub body: BodyInfo,
    /// Whether the engine has the vessel loaded.
    pub loaded: bool,
    /// Packed vessels are on rails and don't simulate physics.
    pub packed: bool,
}

impl FlightState {
    /// A loaded, unpacked vessel at rest.
    pub fn new(body: BodyInfo, altitude: f64) -> Self {
        Self {
            aero: AeroSignal::default(),
            surface_velocity: Vec3::ZERO,
            altitude,
            body,
            loaded: true,
            packed: false,
        }
    }

    /// Whether the vessel is above the atmosphere ceiling.
    pub fn is_above_atmosphere(&self) -> bool {
        self.altitude > self.body.atmosphere_depth
    }
}

/// External events that drive the effect lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum VesselEvent {
    /// The engine loaded the vessel. The build is delayed until it has settled.
    Loaded,
    /// The vessel became active and should show effects right away.
    Activated,
    /// The engine unloaded the vessel.
    Unloaded,
    /// The vessel no longer exists.
    Destroyed,
    /// Parts were added or removed, e.g. by staging or docking.
    PartCountChanged,
    /// The vessel moved into the sphere of influence of another body.
    SoiChanged(BodyInfo),
    /// Full teardown followed by a delayed rebuild.
    ReloadRequested,
}

/// Coarse state of a vessel's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectPhase {
    /// No effect resources exist.
    Unloaded,
    /// A rebuild is scheduled.
    Loading,
    /// The effect is built and updated every tick.
    Loaded,
}

/// Why a load attempt did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The effect is already built.
    AlreadyLoaded,
    /// Not loaded by the engine, or has no parts.
    InvalidVessel,
    /// The current body is airless.
    NoAtmosphere,
    /// The vessel is above the atmosphere ceiling.
    AboveAtmosphere,
}

/// Result of a load attempt that didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOutcome {
    /// The effect was built.
    Loaded,
    /// Nothing was built.
    Skipped(SkipReason),
}

/// A load attempt that had to be aborted. The vessel is left fully unloaded.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// No mesh contributed, even without the exclusion filter.
    #[error("no mesh contributed to the vessel bounds")]
    EmptyBounds,
    /// The renderer could not create the vessel's resources.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Shared, read-only inputs of a tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Global settings.
    pub settings: &'a FireflySettings,
    /// Body configs.
    pub store: &'a BodyConfigStore,
    /// Simulation time step in seconds.
    pub dt: f32,
}

/// Per-vessel runtime state carried from tick to tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRuntimeState {
    /// Effect resources are built.
    pub is_loaded: bool,
    /// Smoothing filter state.
    pub last_smoothed_speed: f32,
    /// Ticks left until a scheduled rebuild. Zero when nothing is scheduled.
    pub reload_delay: u32,
    /// Bounds the effect was built with.
    pub bounds: VesselBounds,
    /// Derived from `bounds`.
    pub base_length_multiplier: f32,
    /// Camera and material survived a lightweight teardown.
    pub resources_retained: bool,
    /// Part count the current effect was built for.
    pub part_count: usize,
    /// Altitude seen by the previous tick, to detect descent.
    pub last_altitude: Option<f64>,
    /// The last load attempt failed; descent no longer retries until something changes.
    pub load_failed: bool,
}

impl Default for EffectRuntimeState {
    fn default() -> Self {
        Self {
            is_loaded: false,
            last_smoothed_speed: 0.0,
            reload_delay: 0,
            bounds: VesselBounds::default(),
            base_length_multiplier: 1.0,
            resources_retained: false,
            part_count: 0,
            last_altitude: None,
            load_failed: false,
        }
    }
}

/// Lifecycle controller of one vessel's effect.
#[derive(Debug)]
pub struct VesselEffect {
    id: VesselId,
    runtime: EffectRuntimeState,
    body: Option<BodyEffectConfig>,
    envelope: Vec<EnvelopeEntry>,
    emitters: Vec<ParticleEmitter>,
    particles: ParticleRateController,
    frame: Option<EffectFrame>,
}

impl VesselEffect {
    /// An unloaded effect.
    pub fn new(id: VesselId) -> Self {
        Self {
            id,
            runtime: EffectRuntimeState::default(),
            body: None,
            envelope: Vec::new(),
            emitters: Vec::new(),
            particles: ParticleRateController::new(),
            frame: None,
        }
    }

    /// Vessel this effect belongs to.
    pub fn id(&self) -> VesselId {
        self.id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> EffectPhase {
        if self.runtime.is_loaded {
            EffectPhase::Loaded
        } else if self.runtime.reload_delay > 0 {
            EffectPhase::Loading
        } else {
            EffectPhase::Unloaded
        }
    }

    /// Whether the effect is built.
    pub fn is_loaded(&self) -> bool {
        self.runtime.is_loaded
    }

    /// Runtime state carried between ticks.
    pub fn runtime(&self) -> &EffectRuntimeState {
        &self.runtime
    }

    /// Body config the effect was built with.
    pub fn body(&self) -> Option<&BodyEffectConfig> {
        self.body.as_ref()
    }

    /// Current envelope entries.
    pub fn envelope(&self) -> &[EnvelopeEntry] {
        &self.envelope
    }

    /// Current particle emitters.
    pub fn emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    /// Whether emission is held at zero below the particle threshold.
    pub fn particles_killed(&self) -> bool {
        self.particles.is_killed()
    }

    /// Output of the last tick, if loaded.
    pub fn frame(&self) -> Option<&EffectFrame> {
        self.frame.as_ref()
    }

    /// Final trail length: vessel size, body and global knob combined.
    pub fn length_multiplier(&self, settings: &FireflySettings) -> f32 {
        let body = self.body.as_ref().map_or(1.0, |body| body.length_multiplier);
        self.runtime.base_length_multiplier * body * settings.length_multiplier
    }

    /// Schedules a rebuild, never shortening a pending delay.
    pub fn schedule_reload(&mut self, ticks: u32) {
        self.runtime.reload_delay = self.runtime.reload_delay.max(ticks);
    }

    /// Tears the effect down and rebuilds it shortly after.
    pub fn request_reload(&mut self, backend: &mut impl EffectBackend) {
        self.teardown(TeardownScope::Full, backend);
        self.schedule_reload(RELOAD_DELAY_TICKS);
    }

    /// Reacts to an external event.
    pub fn handle_event(
        &mut self,
        event: &VesselEvent,
        flight: &FlightState,
        geometry: &VesselGeometry,
        ctx: &TickContext,
        backend: &mut impl EffectBackend,
    ) {
        self.runtime.load_failed = false;

        match event {
            VesselEvent::Loaded => self.schedule_reload(LOAD_DELAY_TICKS),
            VesselEvent::Activated => {
                self.load_logged(flight, geometry, ctx, backend);
            }
            VesselEvent::Unloaded | VesselEvent::Destroyed => {
                self.teardown(TeardownScope::Full, backend);
            }
            VesselEvent::PartCountChanged => self.on_part_count_changed(backend),
            VesselEvent::SoiChanged(body) => self.on_soi_changed(body, flight, geometry, ctx, backend),
            VesselEvent::ReloadRequested => self.request_reload(backend),
        }
    }

    /// Handles an event that arrived before any body config was applied.
    ///
    /// Nothing can be built without a config, so loads are only scheduled.
    /// The countdown starts once the tick runs with a config.
    pub fn defer_event(&mut self, event: &VesselEvent, backend: &mut impl EffectBackend) {
        self.runtime.load_failed = false;

        match event {
            VesselEvent::Loaded => self.schedule_reload(LOAD_DELAY_TICKS),
            VesselEvent::Activated
            | VesselEvent::PartCountChanged
            | VesselEvent::SoiChanged(_)
            | VesselEvent::ReloadRequested => self.schedule_reload(RELOAD_DELAY_TICKS),
            VesselEvent::Unloaded | VesselEvent::Destroyed => {
                self.teardown(TeardownScope::Full, backend);
            }
        }
    }

    fn on_part_count_changed(&mut self, backend: &mut impl EffectBackend) {
        if self.runtime.is_loaded {
            self.teardown(TeardownScope::EnvelopesOnly, backend);
        }
        self.schedule_reload(RELOAD_DELAY_TICKS);
    }

    fn on_soi_changed(
        &mut self,
        body: &BodyInfo,
        flight: &FlightState,
        geometry: &VesselGeometry,
        ctx: &TickContext,
        backend: &mut impl EffectBackend,
    ) {
        if !body.has_atmosphere {
            self.teardown(TeardownScope::Full, backend);
            return;
        }

        if !self.runtime.is_loaded {
            let flight = FlightState {
                body: body.clone(),
                ..flight.clone()
            };
            self.load_logged(&flight, geometry, ctx, backend);
            return;
        }

        info!("Updating current body of vessel {:?} to {}", self.id, body.name);
        let config = ctx.store.get(&body.name).clone();
        backend.submit_envelope(self.id, envelope_draws(&self.envelope, &config, ctx.store));
        self.body = Some(config);
    }

    /// Advances the vessel by one simulation tick.
    pub fn tick(
        &mut self,
        flight: &FlightState,
        geometry: &VesselGeometry,
        ctx: &TickContext,
        backend: &mut impl EffectBackend,
    ) {
        if self.runtime.reload_delay > 0 && flight.loaded && !flight.packed {
            self.runtime.reload_delay -= 1;
            if self.runtime.reload_delay == 0 {
                self.load_logged(flight, geometry, ctx, backend);
            }
        }

        if self.runtime.is_loaded && geometry.part_count() != self.runtime.part_count {
            debug!(
                "Vessel {:?} went from {} to {} parts",
                self.id,
                self.runtime.part_count,
                geometry.part_count()
            );
            self.on_part_count_changed(backend);
        }

        if self.runtime.is_loaded {
            self.update_frame(flight, geometry, ctx, backend);
        }

        if self.runtime.is_loaded && flight.is_above_atmosphere() {
            self.teardown(TeardownScope::Full, backend);
        }

        let descending = self
            .runtime
            .last_altitude
            .is_some_and(|last| flight.altitude < last);
        self.runtime.last_altitude = Some(flight.altitude);

        if descending
            && self.runtime.reload_delay == 0
            && !self.runtime.is_loaded
            && !self.runtime.load_failed
            && !flight.is_above_atmosphere()
        {
            self.load_logged(flight, geometry, ctx, backend);
        }
    }

    fn load_logged(
        &mut self,
        flight: &FlightState,
        geometry: &VesselGeometry,
        ctx: &TickContext,
        backend: &mut impl EffectBackend,
    ) {
        match self.try_load(flight, geometry, ctx, backend) {
            Ok(LoadOutcome::Loaded) => {}
            Ok(LoadOutcome::Skipped(reason)) => {
                debug!("Skipped loading vessel {:?}: {reason:?}", self.id);
            }
            Err(err) => {
                error!("Failed to load effects of vessel {:?}: {err}", self.id);
            }
        }
    }

    /// Builds the whole effect: bounds, then envelopes, then emitters.
    ///
    /// On error every partially created resource is released again.
    pub fn try_load(
        &mut self,
        flight: &FlightState,
        geometry: &VesselGeometry,
        ctx: &TickContext,
        backend: &mut impl EffectBackend,
    ) -> Result<LoadOutcome, LoadError> {
        if self.runtime.is_loaded {
            return Ok(LoadOutcome::Skipped(SkipReason::AlreadyLoaded));
        }
        if !flight.loaded || geometry.parts.is_empty() {
            return Ok(LoadOutcome::Skipped(SkipReason::InvalidVessel));
        }
        if !flight.body.has_atmosphere {
            return Ok(LoadOutcome::Skipped(SkipReason::NoAtmosphere));
        }
        if flight.is_above_atmosphere() {
            return Ok(LoadOutcome::Skipped(SkipReason::AboveAtmosphere));
        }

        info!(
            "Loading vessel {:?} ({} method)",
            self.id,
            if self.runtime.resources_retained { "light" } else { "heavy" }
        );

        let Some(bounds) = compute_bounds_with_fallback(geometry) else {
            self.abort_load(backend);
            return Err(LoadError::EmptyBounds);
        };

        if !self.runtime.resources_retained {
            if let Err(err) = backend.create_resources(self.id, &bounds) {
                backend.release(self.id, TeardownScope::Full);
                self.abort_load(backend);
                return Err(err.into());
            }
            self.runtime.resources_retained = true;
        }

        self.runtime.bounds = bounds;
        self.runtime.base_length_multiplier = bounds.base_length_multiplier();

        let body = ctx.store.get(&flight.body.name).clone();

        self.envelope = build_envelope(&geometry.parts, ctx.settings.envelope_scale_factor);
        backend.submit_envelope(self.id, envelope_draws(&self.envelope, &body, ctx.store));
        self.body = Some(body);

        self.particles = ParticleRateController::new();
        if ctx.settings.particles_enabled() {
            self.emitters = create_emitters(ctx.settings, &bounds);
            self.particles.kill_all(&mut self.emitters);
        }

        self.runtime.part_count = geometry.part_count();
        self.runtime.is_loaded = true;
        self.runtime.load_failed = false;

        info!(
            "Finished loading vessel {:?}: {} envelope surfaces, {} emitters",
            self.id,
            self.envelope.len(),
            self.emitters.len()
        );
        Ok(LoadOutcome::Loaded)
    }

    fn abort_load(&mut self, backend: &mut impl EffectBackend) {
        self.teardown(TeardownScope::Full, backend);
        self.runtime.load_failed = true;
    }

    /// Releases the effect. A full teardown also drops any pending reload.
    pub fn teardown(&mut self, scope: TeardownScope, backend: &mut impl EffectBackend) {
        let had_resources = self.runtime.is_loaded || self.runtime.resources_retained;
        let was_loaded = self.runtime.is_loaded;

        self.runtime.is_loaded = false;
        self.envelope.clear();
        self.emitters.clear();
        self.particles = ParticleRateController::new();
        self.frame = None;

        match scope {
            TeardownScope::EnvelopesOnly => {
                if had_resources {
                    backend.release(self.id, TeardownScope::EnvelopesOnly);
                }
            }
            TeardownScope::Full => {
                if had_resources {
                    backend.release(self.id, TeardownScope::Full);
                }
                self.runtime.resources_retained = false;
                self.runtime.reload_delay = 0;
                self.runtime.last_smoothed_speed = 0.0;
                self.body = None;
            }
        }

        if was_loaded {
            info!("Unloaded vessel {:?} ({scope:?})", self.id);
        }
    }

    fn update_frame(
        &mut self,
        flight: &FlightState,
        geometry: &VesselGeometry,
        ctx: &TickContext,
        backend: &mut impl EffectBackend,
    ) {
        let Some(body) = self.body.as_ref() else {
            return;
        };
        let settings = ctx.settings;

        let raw = raw_entry_signal(flight.aero.fx_scalar, flight.aero.fx_state, settings.strength_base);
        let smoothed = smooth(
            raw,
            self.runtime.last_smoothed_speed,
            ctx.dt,
            settings.strength_base,
        );
        self.runtime.last_smoothed_speed = smoothed;
        let entry_speed = adjusted_entry_speed(smoothed, body);

        let world = flight.surface_velocity.normalize_or_zero();
        let flow = FlowDirection {
            local: geometry.world_to_local_direction(world),
            world,
        };
        let length_multiplier = self.length_multiplier(settings);
        let bounds = self.runtime.bounds;

        if !self.emitters.is_empty() {
            let placement = EmitterPlacement {
                center: bounds.center,
                radius: bounds.radius,
                length_multiplier,
                smoke_rate_multiplier: settings.smoke_emission_multiplier,
                flow,
            };
            self.particles
                .update_emission(&mut self.emitters, entry_speed, body, &placement);
        }

        let material = EffectMaterialParams {
            entry_speed,
            velocity: world,
            fx_state: flight.aero.fx_state,
            angle_of_attack: angle_of_attack(geometry.forward(), world),
            length_multiplier,
            ..default()
        }
        .with_body(body)
        .with_toggles(settings.toggles);

        let frame = EffectFrame {
            material,
            camera: AirstreamFraming::new(&bounds, geometry, flow.local),
        };
        backend.submit_frame(self.id, &frame);
        self.frame = Some(frame);
    }
}
