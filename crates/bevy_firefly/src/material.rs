use bevy::prelude::*;
use bytemuck::{Pod, Zeroable};

use crate::config::{BodyColors, BodyConfigStore, BodyEffectConfig, ColorSlot, EffectToggles};
use crate::envelope::EnvelopeEntry;

/// Part identifiers that get colored streaks.
const RANDOMIZED_PARTS: &[&str] = &["PotatoRoid", "PotatoComet"];

/// Scalars fed to the effect material every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectMaterialParams {
    /// Body-adjusted smoothed entry speed.
    pub entry_speed: f32,
    /// World-space flow direction.
    pub velocity: Vec3,
    /// 0..1 aerodynamic effect state.
    pub fx_state: f32,
    /// Angle between the vessel forward axis and the flow, in radians.
    pub angle_of_attack: f32,
    /// Trail length multiplier.
    pub length_multiplier: f32,
    /// From the body config.
    pub opacity_multiplier: f32,
    /// From the body config.
    pub wrap_fresnel_modifier: f32,
    /// From the body config.
    pub streak_probability: f32,
    /// From the body config.
    pub streak_threshold: f32,
    /// Render in HDR regardless of the camera setting.
    pub hdr: bool,
    /// Skip the bow shock layer.
    pub disable_bowshock: bool,
}

impl EffectMaterialParams {
    /// Copies the body-specific scalars.
    pub fn with_body(mut self, body: &BodyEffectConfig) -> Self {
        self.opacity_multiplier = body.opacity_multiplier;
        self.wrap_fresnel_modifier = body.wrap_fresnel_modifier;
        self.streak_probability = body.streak_probability;
        self.streak_threshold = body.streak_threshold;
        self
    }

    /// Copies the flags set by the effect toggles.
    pub fn with_toggles(mut self, toggles: EffectToggles) -> Self {
        self.hdr = toggles.contains(EffectToggles::HDR_OVERRIDE);
        self.disable_bowshock = toggles.contains(EffectToggles::DISABLE_BOWSHOCK);
        self
    }

    /// Packs the parameters for upload.
    pub fn uniform(&self) -> EffectMaterialUniform {
        EffectMaterialUniform {
            velocity: self.velocity.extend(self.entry_speed).to_array(),
            state: [
                self.fx_state,
                self.angle_of_attack,
                self.length_multiplier,
                self.opacity_multiplier,
            ],
            shading: [
                self.wrap_fresnel_modifier,
                self.streak_probability,
                self.streak_threshold,
                0.0,
            ],
            flags: [self.hdr as u32, self.disable_bowshock as u32, 0, 0],
        }
    }
}

/// GPU layout of [`EffectMaterialParams`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct EffectMaterialUniform {
    /// Flow direction in xyz, entry speed in w.
    pub velocity: [f32; 4],
    /// Fx state, angle of attack, length multiplier, opacity.
    pub state: [f32; 4],
    /// Wrap fresnel, streak probability, streak threshold, unused.
    pub shading: [f32; 4],
    /// HDR, bow shock disabled, unused, unused.
    pub flags: [u32; 4],
}

/// Angle between the vessel forward axis and the flow direction.
pub fn angle_of_attack(forward: Vec3, flow: Vec3) -> f32 {
    if forward == Vec3::ZERO || flow == Vec3::ZERO {
        return 0.0;
    }
    forward.angle_between(flow)
}

/// Per-surface draw parameters of one envelope entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeDraw {
    /// Surface to draw on.
    pub entry: EnvelopeEntry,
    /// Body colors with the part override applied.
    pub colors: BodyColors,
    /// 1 for asteroids and comets, which get randomized streaks.
    pub randomness_factor: f32,
}

impl EnvelopeDraw {
    /// Linear HDR color of a slot, black when unset.
    pub fn color(&self, slot: ColorSlot) -> LinearRgba {
        self.colors
            .get(slot)
            .map(|color| color.to_linear())
            .unwrap_or(LinearRgba::BLACK)
    }
}

/// Resolves the colors of every envelope entry against the body and part overrides.
pub fn envelope_draws(
    entries: &[EnvelopeEntry],
    body: &BodyEffectConfig,
    store: &BodyConfigStore,
) -> Vec<EnvelopeDraw> {
    entries
        .iter()
        .map(|entry| {
            let colors = match store.part_override(&entry.part_identifier) {
                Some(overrides) => {
                    debug!("Envelope of {} has a part override config", entry.part_identifier);
                    body.colors.merge(overrides)
                }
                None => body.colors,
            };
            let randomness_factor = if RANDOMIZED_PARTS.contains(&entry.part_identifier.as_str()) {
                1.0
            } else {
                0.0
            };
            EnvelopeDraw {
                entry: entry.clone(),
                colors,
                randomness_factor,
            }
        })
        .collect()
}
