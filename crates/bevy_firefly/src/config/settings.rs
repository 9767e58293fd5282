use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::serde_helpers::{default_one_f32, is_one_f32, serde_default};
use crate::particles::{EmitterKind, RateRange};

bitflags! {
    /// Global switches for parts of the effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EffectToggles: u32 {
        /// Hides the bow shock layer of the shader.
        const DISABLE_BOWSHOCK = 1 << 0;
        /// No particle emitters are created at all.
        const DISABLE_PARTICLES = 1 << 1;
        /// Spark emitter only.
        const DISABLE_SPARKS = 1 << 2;
        /// Covers both chunk emitters.
        const DISABLE_DEBRIS = 1 << 3;
        /// Smoke emitter only.
        const DISABLE_SMOKE = 1 << 4;
        /// Forces HDR output on the effect material.
        const HDR_OVERRIDE = 1 << 5;
    }
}

impl EffectToggles {
    /// Whether emitters of `kind` should be created active.
    pub fn emitter_enabled(&self, kind: EmitterKind) -> bool {
        let flag = match kind {
            EmitterKind::Sparks => Self::DISABLE_SPARKS,
            EmitterKind::Chunks | EmitterKind::AlternateChunks => Self::DISABLE_DEBRIS,
            EmitterKind::Smoke => Self::DISABLE_SMOKE,
        };
        !self.contains(flag)
    }
}

serde_default!(strength_base, f32, 2800.0);
serde_default!(envelope_scale_factor, Vec3, Vec3::new(1.05, 1.07, 1.05));
serde_default!(emitter_rates, EmitterBaseRates, EmitterBaseRates::default());

/// Emission rates each emitter kind starts from before speed scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmitterBaseRates {
    /// [`EmitterKind::Sparks`] rates.
    pub sparks: RateRange,
    /// [`EmitterKind::Chunks`] rates.
    pub chunks: RateRange,
    /// [`EmitterKind::AlternateChunks`] rates.
    pub alternate_chunks: RateRange,
    /// [`EmitterKind::Smoke`] rates.
    pub smoke: RateRange,
}

impl Default for EmitterBaseRates {
    fn default() -> Self {
        Self {
            sparks: RateRange::new(40.0, 60.0),
            chunks: RateRange::new(8.0, 12.0),
            alternate_chunks: RateRange::new(4.0, 8.0),
            smoke: RateRange::new(20.0, 30.0),
        }
    }
}

impl EmitterBaseRates {
    /// Rates of one emitter kind.
    pub fn for_kind(&self, kind: EmitterKind) -> RateRange {
        match kind {
            EmitterKind::Sparks => self.sparks,
            EmitterKind::Chunks => self.chunks,
            EmitterKind::AlternateChunks => self.alternate_chunks,
            EmitterKind::Smoke => self.smoke,
        }
    }
}

/// Global tuning knobs shared by every vessel.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireflySettings {
    /// Scales the raw aerodynamic signal into entry speed. Also the reference the
    /// smoothing filter measures jumps against.
    #[serde(
        default = "default_strength_base",
        skip_serializing_if = "is_default_strength_base"
    )]
    pub strength_base: f32,

    /// Global trail length knob, applied on top of the body multiplier.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub length_multiplier: f32,

    /// Per-axis inflation of automatically derived envelopes.
    #[serde(
        default = "default_envelope_scale_factor",
        skip_serializing_if = "is_default_envelope_scale_factor"
    )]
    pub envelope_scale_factor: Vec3,

    /// Extra rate scaling for the smoke emitter only.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub smoke_emission_multiplier: f32,

    /// Parts of the effect that are switched off.
    #[serde(default, skip_serializing_if = "EffectToggles::is_empty")]
    pub toggles: EffectToggles,

    /// Full-intensity emission rates.
    #[serde(
        default = "default_emitter_rates",
        skip_serializing_if = "is_default_emitter_rates"
    )]
    pub emitter_rates: EmitterBaseRates,
}

impl Default for FireflySettings {
    fn default() -> Self {
        Self {
            strength_base: default_strength_base(),
            length_multiplier: 1.0,
            envelope_scale_factor: default_envelope_scale_factor(),
            smoke_emission_multiplier: 1.0,
            toggles: EffectToggles::default(),
            emitter_rates: EmitterBaseRates::default(),
        }
    }
}

impl FireflySettings {
    /// Whether emitters are created at all.
    pub fn particles_enabled(&self) -> bool {
        !self.toggles.contains(EffectToggles::DISABLE_PARTICLES)
    }
}
