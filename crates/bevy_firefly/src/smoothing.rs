use bevy::math::FloatExt;

use crate::config::BodyEffectConfig;

/// Fraction of the signal let through while the aerodynamic state is still 0.
pub const STATE_EASE_FLOOR: f32 = 0.13;

/// Turns the host's aerodynamic intensity into an unsmoothed entry speed.
///
/// `fx_scalar` is the instantaneous intensity (roughly 0..1) and `fx_state` a 0..1
/// ramp, so the effect fades in instead of snapping to full strength.
pub fn raw_entry_signal(fx_scalar: f32, fx_state: f32, strength_base: f32) -> f32 {
    fx_scalar * strength_base * STATE_EASE_FLOOR.lerp(1.0, fx_state.clamp(0.0, 1.0))
}

/// Moves `last` toward `raw`, faster the further apart they are.
///
/// The interpolation factor is `dt * (1 + 2 * |raw - last| / scale_reference)`,
/// clamped to `0..=1` so the result never overshoots `raw`.
pub fn smooth(raw: f32, last: f32, dt: f32, scale_reference: f32) -> f32 {
    let delta = if scale_reference > 0.0 {
        (raw - last).abs() / scale_reference
    } else {
        0.0
    };
    let t = (dt * (1.0 + delta * 2.0)).clamp(0.0, 1.0);
    last.lerp(raw, t)
}

/// Body-adjusted entry speed that drives the whole effect.
pub fn adjusted_entry_speed(smoothed: f32, body: &BodyEffectConfig) -> f32 {
    smoothed * body.strength_multiplier
}
