use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bounds::VesselBounds;
use crate::config::{BodyEffectConfig, FireflySettings};

/// Speed range above the particle threshold over which emission ramps to full.
pub const PARTICLE_RAMP_RANGE: f32 = 600.0;

/// A (min, max) pair of emission rates, in particles per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateRange {
    /// Lower rate bound.
    pub min: f32,
    /// Upper rate bound.
    pub max: f32,
}

impl RateRange {
    /// No emission.
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Creates a rate range.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Both bounds multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }
}

/// The emitters attached to every loaded vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmitterKind {
    /// Hot sparks right behind the vessel.
    Sparks,
    /// Glowing debris.
    Chunks,
    /// Slower debris further back.
    AlternateChunks,
    /// Smoke trail.
    Smoke,
}

impl EmitterKind {
    /// Every kind, in creation order.
    pub const ALL: [Self; 4] = [
        Self::Sparks,
        Self::Chunks,
        Self::AlternateChunks,
        Self::Smoke,
    ];

    /// Distance behind the bounds center, against the flow.
    pub fn trailing_distance(self, length_multiplier: f32, radius: f32) -> f32 {
        match self {
            Self::Sparks => 0.5 * length_multiplier,
            Self::Chunks => 1.24 * length_multiplier,
            Self::AlternateChunks => 1.62 * length_multiplier,
            Self::Smoke => 2.0 * (length_multiplier * 0.5).max(1.0) + 0.5 * radius,
        }
    }

    /// Particle speed range along the flow.
    pub fn speed_range(self) -> (f32, f32) {
        match self {
            Self::Sparks | Self::Chunks => (30.0, 70.0),
            Self::AlternateChunks => (15.0, 20.0),
            Self::Smoke => (125.0, 135.0),
        }
    }
}

/// Mutable view of an emitter owned by the particle engine.
///
/// The base rate is captured once when the emitter is created; everything else is
/// written every tick.
pub trait EmitterHandle {
    /// Which emitter this is.
    fn kind(&self) -> EmitterKind;
    /// Rates the emitter was authored with.
    fn base_rate(&self) -> RateRange;
    /// Inactive emitters are never written to.
    fn is_active(&self) -> bool;
    /// Sets the current emission rates.
    fn set_rate(&mut self, rate: RateRange);
    /// Moves the emitter, in vessel-local space.
    fn set_local_position(&mut self, position: Vec3);
    /// Sets the world-space particle velocity bounds.
    fn set_velocity_range(&mut self, min: Vec3, max: Vec3);
}

/// Emitter state read by the particle engine each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEmitter {
    /// Which emitter this is.
    pub kind: EmitterKind,
    /// Disabled by the effect toggles when unset.
    pub active: bool,
    /// Rates at full intensity.
    pub base_rate: RateRange,
    /// Current rates.
    pub rate: RateRange,
    /// Vessel-local emitter position.
    pub local_position: Vec3,
    /// World-space velocity bounds.
    pub velocity_min: Vec3,
    /// See `velocity_min`.
    pub velocity_max: Vec3,
    /// Emission box size.
    pub shape_scale: Vec3,
}

impl ParticleEmitter {
    /// An active emitter at the origin, not emitting yet.
    pub fn new(kind: EmitterKind, base_rate: RateRange) -> Self {
        Self {
            kind,
            active: true,
            base_rate,
            rate: RateRange::ZERO,
            local_position: Vec3::ZERO,
            velocity_min: Vec3::ZERO,
            velocity_max: Vec3::ZERO,
            shape_scale: Vec3::ONE,
        }
    }
}

impl EmitterHandle for ParticleEmitter {
    fn kind(&self) -> EmitterKind {
        self.kind
    }

    fn base_rate(&self) -> RateRange {
        self.base_rate
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_rate(&mut self, rate: RateRange) {
        self.rate = rate;
    }

    fn set_local_position(&mut self, position: Vec3) {
        self.local_position = position;
    }

    fn set_velocity_range(&mut self, min: Vec3, max: Vec3) {
        self.velocity_min = min;
        self.velocity_max = max;
    }
}

/// Creates one emitter per kind, sized to the vessel and switched off.
pub fn create_emitters(settings: &FireflySettings, bounds: &VesselBounds) -> Vec<ParticleEmitter> {
    EmitterKind::ALL
        .into_iter()
        .map(|kind| {
            let mut emitter = ParticleEmitter::new(kind, settings.emitter_rates.for_kind(kind));
            emitter.active = settings.toggles.emitter_enabled(kind);
            emitter.local_position = bounds.center;
            emitter.shape_scale = bounds.extents * 2.0;
            emitter
        })
        .collect()
}

/// Direction of the airflow hitting the vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowDirection {
    /// Normalized surface velocity in vessel-local space.
    pub local: Vec3,
    /// Normalized surface velocity in world space.
    pub world: Vec3,
}

/// Everything besides speed that places the emitters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterPlacement {
    /// Vessel-local bounds center.
    pub center: Vec3,
    /// Bounds radius.
    pub radius: f32,
    /// Final trail length multiplier.
    pub length_multiplier: f32,
    /// Extra scale on the smoke rate.
    pub smoke_rate_multiplier: f32,
    /// Current airflow.
    pub flow: FlowDirection,
}

/// Fraction of the base rates to emit at, `None` below the threshold.
pub fn emission_intensity(speed: f32, threshold: f32) -> Option<f32> {
    if speed < threshold {
        return None;
    }
    Some(((speed - threshold) / PARTICLE_RAMP_RANGE).clamp(0.0, 1.0))
}

/// Maps entry speed to emission rates, positions and velocities every tick.
#[derive(Debug, Default)]
pub struct ParticleRateController {
    killed: bool,
}

impl ParticleRateController {
    /// A controller that hasn't killed its emitters yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the emitters are currently held at zero.
    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Zeroes every rate. Repeated calls don't touch the emitters again.
    pub fn kill_all<H: EmitterHandle>(&mut self, emitters: &mut [H]) {
        if self.killed {
            return;
        }
        for emitter in emitters.iter_mut().filter(|emitter| emitter.is_active()) {
            emitter.set_rate(RateRange::ZERO);
        }
        self.killed = true;
    }

    /// Below the body's particle threshold every rate is zeroed once. Above it, rates
    /// ramp up over [`PARTICLE_RAMP_RANGE`] and the emitters trail the vessel.
    pub fn update_emission<H: EmitterHandle>(
        &mut self,
        emitters: &mut [H],
        speed: f32,
        body: &BodyEffectConfig,
        placement: &EmitterPlacement,
    ) {
        let Some(intensity) = emission_intensity(speed, body.particle_threshold) else {
            self.kill_all(emitters);
            return;
        };
        self.killed = false;

        let trailing = -placement.flow.local;
        let downstream = -placement.flow.world;

        for emitter in emitters.iter_mut().filter(|emitter| emitter.is_active()) {
            let kind = emitter.kind();

            let mut rate = emitter.base_rate().scaled(intensity);
            if kind == EmitterKind::Smoke {
                rate = rate.scaled(placement.smoke_rate_multiplier);
            }
            emitter.set_rate(rate);

            let distance = kind.trailing_distance(placement.length_multiplier, placement.radius);
            emitter.set_local_position(placement.center + trailing * distance);

            let (min_speed, max_speed) = kind.speed_range();
            emitter.set_velocity_range(downstream * min_speed, downstream * max_speed);
        }
    }
}
