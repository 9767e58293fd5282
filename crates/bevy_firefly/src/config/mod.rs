pub(crate) mod serde_helpers;
/// Global settings and effect toggles.
pub mod settings;
/// Config format version tracking and compatibility validation.
pub mod versioning;

pub use settings::{EffectToggles, EmitterBaseRates, FireflySettings};

use std::collections::HashMap;

use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use serde_helpers::*;
use versioning::{VersionStatus, current_format_version};

/// Name of the body config every lookup falls back to.
pub const DEFAULT_BODY: &str = "Default";

/// A color authored as SDRI: red, green and blue in `0..=255` plus an intensity
/// exponent. The HDR value is `rgb / 255 * 2^intensity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f32, f32, f32, f32)", into = "(f32, f32, f32, f32)")]
pub struct HdrColor {
    /// Red, `0..=255`.
    pub red: f32,
    /// Green, `0..=255`.
    pub green: f32,
    /// Blue, `0..=255`.
    pub blue: f32,
    /// Power-of-two brightness exponent.
    pub intensity: f32,
}

impl HdrColor {
    /// Creates a color from its SDRI components.
    pub const fn new(red: f32, green: f32, blue: f32, intensity: f32) -> Self {
        Self {
            red,
            green,
            blue,
            intensity,
        }
    }

    /// The HDR color the shader receives.
    pub fn to_linear(&self) -> LinearRgba {
        let factor = 2f32.powf(self.intensity);
        LinearRgba::rgb(
            self.red / 255.0 * factor,
            self.green / 255.0 * factor,
            self.blue / 255.0 * factor,
        )
    }

    fn is_finite(&self) -> bool {
        self.red.is_finite()
            && self.green.is_finite()
            && self.blue.is_finite()
            && self.intensity.is_finite()
    }
}

impl From<(f32, f32, f32, f32)> for HdrColor {
    fn from((red, green, blue, intensity): (f32, f32, f32, f32)) -> Self {
        Self::new(red, green, blue, intensity)
    }
}

impl From<HdrColor> for (f32, f32, f32, f32) {
    fn from(color: HdrColor) -> Self {
        (color.red, color.green, color.blue, color.intensity)
    }
}

/// Named color slots of the effect shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    /// Base glow around the vessel.
    Glow,
    /// Glow at peak heating.
    GlowHot,
    /// Inner trail layer.
    TrailPrimary,
    /// Middle trail layer.
    TrailSecondary,
    /// Outer trail layer.
    TrailTertiary,
    /// Streaks in the trail.
    TrailStreak,
    /// Plasma layer hugging the hull.
    WrapLayer,
    /// Streaks in the wrap layer.
    WrapStreak,
    /// Bow shock in front of the vessel.
    Shockwave,
}

impl ColorSlot {
    /// Every slot, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Glow,
        Self::GlowHot,
        Self::TrailPrimary,
        Self::TrailSecondary,
        Self::TrailTertiary,
        Self::TrailStreak,
        Self::WrapLayer,
        Self::WrapStreak,
        Self::Shockwave,
    ];
}

/// The full color set of a body, or a partial override of one.
///
/// Unset slots are `None`. Body configs must set every slot, part overrides only
/// set the slots they change.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyColors {
    /// [`ColorSlot::Glow`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow: Option<HdrColor>,
    /// [`ColorSlot::GlowHot`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow_hot: Option<HdrColor>,
    /// [`ColorSlot::TrailPrimary`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_primary: Option<HdrColor>,
    /// [`ColorSlot::TrailSecondary`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_secondary: Option<HdrColor>,
    /// [`ColorSlot::TrailTertiary`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_tertiary: Option<HdrColor>,
    /// [`ColorSlot::TrailStreak`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_streak: Option<HdrColor>,
    /// [`ColorSlot::WrapLayer`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_layer: Option<HdrColor>,
    /// [`ColorSlot::WrapStreak`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_streak: Option<HdrColor>,
    /// [`ColorSlot::Shockwave`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shockwave: Option<HdrColor>,
}

impl BodyColors {
    /// Every slot set to `color`.
    pub fn uniform(color: HdrColor) -> Self {
        let mut colors = Self::default();
        for slot in ColorSlot::ALL {
            colors.set(slot, Some(color));
        }
        colors
    }

    /// Color of one slot.
    pub fn get(&self, slot: ColorSlot) -> Option<HdrColor> {
        *self.slot(slot)
    }

    /// Sets or clears one slot.
    pub fn set(&mut self, slot: ColorSlot, color: Option<HdrColor>) {
        *self.slot_mut(slot) = color;
    }

    fn slot(&self, slot: ColorSlot) -> &Option<HdrColor> {
        match slot {
            ColorSlot::Glow => &self.glow,
            ColorSlot::GlowHot => &self.glow_hot,
            ColorSlot::TrailPrimary => &self.trail_primary,
            ColorSlot::TrailSecondary => &self.trail_secondary,
            ColorSlot::TrailTertiary => &self.trail_tertiary,
            ColorSlot::TrailStreak => &self.trail_streak,
            ColorSlot::WrapLayer => &self.wrap_layer,
            ColorSlot::WrapStreak => &self.wrap_streak,
            ColorSlot::Shockwave => &self.shockwave,
        }
    }

    fn slot_mut(&mut self, slot: ColorSlot) -> &mut Option<HdrColor> {
        match slot {
            ColorSlot::Glow => &mut self.glow,
            ColorSlot::GlowHot => &mut self.glow_hot,
            ColorSlot::TrailPrimary => &mut self.trail_primary,
            ColorSlot::TrailSecondary => &mut self.trail_secondary,
            ColorSlot::TrailTertiary => &mut self.trail_tertiary,
            ColorSlot::TrailStreak => &mut self.trail_streak,
            ColorSlot::WrapLayer => &mut self.wrap_layer,
            ColorSlot::WrapStreak => &mut self.wrap_streak,
            ColorSlot::Shockwave => &mut self.shockwave,
        }
    }

    /// Whether every slot is set.
    pub fn is_complete(&self) -> bool {
        ColorSlot::ALL.iter().all(|slot| self.get(*slot).is_some())
    }

    fn is_finite(&self) -> bool {
        ColorSlot::ALL
            .iter()
            .filter_map(|slot| self.get(*slot))
            .all(|color| color.is_finite())
    }

    /// Slots set in `overrides` win, everything else comes from `self`.
    pub fn merge(&self, overrides: &BodyColors) -> BodyColors {
        let mut merged = *self;
        for slot in ColorSlot::ALL {
            if let Some(color) = overrides.get(slot) {
                merged.set(slot, Some(color));
            }
        }
        merged
    }
}

fn default_particle_threshold() -> f32 {
    1800.0
}

/// Per-body tuning of the effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyEffectConfig {
    /// Body name, or [`DEFAULT_BODY`].
    pub name: String,
    /// Entry speed is multiplied by this before reaching the shader.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub strength_multiplier: f32,
    /// Trail length multiplier.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub length_multiplier: f32,
    /// Effect opacity multiplier.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub opacity_multiplier: f32,
    /// Fresnel strength of the wrap layer.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub wrap_fresnel_modifier: f32,
    /// Entry speed below which particles are switched off.
    #[serde(default = "default_particle_threshold")]
    pub particle_threshold: f32,
    /// Added to the shader's streak probability.
    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub streak_probability: f32,
    /// Added to the shader's streak threshold.
    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub streak_threshold: f32,
    /// Every color slot must be set.
    pub colors: BodyColors,
}

impl BodyEffectConfig {
    /// A config with neutral multipliers.
    pub fn new(name: impl Into<String>, colors: BodyColors) -> Self {
        Self {
            name: name.into(),
            strength_multiplier: 1.0,
            length_multiplier: 1.0,
            opacity_multiplier: 1.0,
            wrap_fresnel_modifier: 1.0,
            particle_threshold: default_particle_threshold(),
            streak_probability: 0.0,
            streak_threshold: 0.0,
            colors,
        }
    }

    fn validate(&self) -> Result<(), InvalidBodyConfig> {
        let scalars = [
            self.strength_multiplier,
            self.length_multiplier,
            self.opacity_multiplier,
            self.wrap_fresnel_modifier,
            self.particle_threshold,
            self.streak_probability,
            self.streak_threshold,
        ];
        if scalars.iter().any(|value| !value.is_finite()) || !self.colors.is_finite() {
            return Err(InvalidBodyConfig::NonFinite);
        }
        if !self.colors.is_complete() {
            return Err(InvalidBodyConfig::MissingColors);
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
enum InvalidBodyConfig {
    #[error("contains non-finite values")]
    NonFinite,
    #[error("doesn't define every color")]
    MissingColors,
}

/// Scales the strength of a group of bodies, typically shipped by a planet pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPackConfig {
    /// Pack name, for logging.
    pub name: String,
    /// Multiplies the strength of every affected body.
    #[serde(default = "default_one_f32", skip_serializing_if = "is_one_f32")]
    pub speed_multiplier: f32,
    /// Names of the bodies the pack rescales.
    pub affected_bodies: Vec<String>,
}

/// Color override for every part with the given config name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartColorOverride {
    /// Part config name, with `.` replaced by `_`.
    pub name: String,
    /// Slots to override.
    pub colors: BodyColors,
}

/// The on-disk config file.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct FireflyConfigAsset {
    firefly_version: String,
    /// Global settings.
    #[serde(default)]
    pub settings: FireflySettings,
    /// Planet pack strength adjustments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planet_packs: Vec<PlanetPackConfig>,
    /// Body configs. Must include [`DEFAULT_BODY`].
    pub bodies: Vec<BodyEffectConfig>,
    /// Part color overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<PartColorOverride>,
}

impl FireflyConfigAsset {
    /// A config in the current format version.
    pub fn new(
        settings: FireflySettings,
        planet_packs: Vec<PlanetPackConfig>,
        bodies: Vec<BodyEffectConfig>,
        parts: Vec<PartColorOverride>,
    ) -> Self {
        Self {
            firefly_version: current_format_version().to_string(),
            settings,
            planet_packs,
            bodies,
            parts,
        }
    }

    /// Declared format version.
    pub fn version(&self) -> &str {
        &self.firefly_version
    }

    /// Validates `firefly_version`, upgrading it in place when the change is compatible.
    pub fn try_upgrade_version(&mut self) -> VersionStatus {
        let status = versioning::validate_version(&self.firefly_version);
        if matches!(status, VersionStatus::Outdated { .. }) {
            self.firefly_version = current_format_version().to_string();
        }
        status
    }
}

/// Errors that prevent a body config store from being built.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The config has no valid [`DEFAULT_BODY`].
    #[error("no valid \"Default\" body config, the install is likely corrupted")]
    MissingDefault,
}

/// Resolved body and part configs, keyed by name.
///
/// Always holds a valid [`DEFAULT_BODY`] config that lookups fall back to.
#[derive(Resource, Debug, Clone)]
pub struct BodyConfigStore {
    bodies: HashMap<String, BodyEffectConfig>,
    default: BodyEffectConfig,
    part_overrides: HashMap<String, BodyColors>,
}

impl BodyConfigStore {
    /// A store holding only a default config.
    pub fn new(mut default: BodyEffectConfig) -> Self {
        default.name = DEFAULT_BODY.to_string();
        Self {
            bodies: HashMap::new(),
            default,
            part_overrides: HashMap::new(),
        }
    }

    /// Builds a store from a loaded config file.
    ///
    /// Invalid or duplicate bodies are skipped with a warning and never partially
    /// registered. Planet pack multipliers are folded into the affected bodies.
    pub fn from_asset(asset: &FireflyConfigAsset) -> Result<Self, ConfigError> {
        let packs: Vec<&PlanetPackConfig> = asset
            .planet_packs
            .iter()
            .filter(|pack| {
                if pack.affected_bodies.is_empty() {
                    warn!("Planet pack config '{}' affects no bodies, skipping", pack.name);
                    return false;
                }
                if !pack.speed_multiplier.is_finite() {
                    warn!("Planet pack config '{}' is not formatted correctly", pack.name);
                    return false;
                }
                true
            })
            .collect();

        let mut bodies: HashMap<String, BodyEffectConfig> = HashMap::new();
        for body in &asset.bodies {
            if bodies.contains_key(&body.name) {
                warn!("Duplicate body config found: {}", body.name);
                continue;
            }
            if let Err(err) = body.validate() {
                warn!("Body config '{}' {err}, skipping", body.name);
                continue;
            }

            let mut body = body.clone();
            for pack in packs
                .iter()
                .filter(|pack| pack.affected_bodies.iter().any(|name| *name == body.name))
            {
                body.strength_multiplier *= pack.speed_multiplier;
            }
            bodies.insert(body.name.clone(), body);
        }

        let default = bodies.remove(DEFAULT_BODY).ok_or(ConfigError::MissingDefault)?;

        let mut part_overrides = HashMap::new();
        for part in &asset.parts {
            if !part.colors.is_finite() {
                warn!("Couldn't process override config for part {}", part.name);
                continue;
            }
            debug!("Processed part override config {}", part.name);
            part_overrides.insert(part.name.clone(), part.colors);
        }

        info!(
            "Loaded {} body configs and {} part overrides",
            bodies.len() + 1,
            part_overrides.len()
        );

        Ok(Self {
            bodies,
            default,
            part_overrides,
        })
    }

    /// Adds or replaces a body config. Not validated.
    pub fn insert_body(&mut self, body: BodyEffectConfig) {
        if body.name == DEFAULT_BODY {
            self.default = body;
        } else {
            self.bodies.insert(body.name.clone(), body);
        }
    }

    /// Adds or replaces a part color override.
    pub fn insert_part_override(&mut self, part: impl Into<String>, colors: BodyColors) {
        self.part_overrides.insert(part.into(), colors);
    }

    /// The config registered for `body`, if any.
    pub fn try_get(&self, body: &str) -> Option<&BodyEffectConfig> {
        if body == DEFAULT_BODY {
            return Some(&self.default);
        }
        self.bodies.get(body)
    }

    /// The config for `body`, or the default one.
    pub fn get(&self, body: &str) -> &BodyEffectConfig {
        self.try_get(body).unwrap_or(&self.default)
    }

    /// The [`DEFAULT_BODY`] config.
    pub fn default_config(&self) -> &BodyEffectConfig {
        &self.default
    }

    /// Color override of a part, by config name.
    pub fn part_override(&self, part: &str) -> Option<&BodyColors> {
        self.part_overrides.get(part)
    }

    /// Every registered body name, including the default.
    pub fn body_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(DEFAULT_BODY).chain(self.bodies.keys().map(String::as_str))
    }
}

/// Asset loader for [`FireflyConfigAsset`] files in RON format.
#[derive(Default, TypePath)]
pub struct FireflyConfigLoader;

/// Errors that can occur when loading a [`FireflyConfigAsset`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FireflyConfigLoaderError {
    /// The file could not be read.
    #[error("Could not load config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid RON for the config format.
    #[error("Could not parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// The declared version was never released.
    #[error("Unknown firefly_version. You may need a newer version of Firefly.")]
    UnknownVersion,
    /// A breaking format change lies between the declared and the current version.
    #[error(
        "Config version \"{found}\" is incompatible with current version \"{current}\". Manual migration is required."
    )]
    IncompatibleVersion {
        /// Declared version.
        found: String,
        /// Version this crate reads.
        current: String,
    },
    /// The config parsed but can't be used.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AssetLoader for FireflyConfigLoader {
    type Asset = FireflyConfigAsset;
    type Settings = ();
    type Error = FireflyConfigLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let mut asset = ron::de::from_bytes::<FireflyConfigAsset>(&bytes)?;

        match asset.try_upgrade_version() {
            VersionStatus::Current => {}
            VersionStatus::Outdated { found, current } => {
                let path = load_context.path();
                warn!(
                    "{path:?}: loaded config with firefly_version \"{found}\", current is \"{current}\""
                );
            }
            VersionStatus::Incompatible { found, current } => {
                return Err(FireflyConfigLoaderError::IncompatibleVersion {
                    found,
                    current: current.to_string(),
                });
            }
            VersionStatus::Unknown => {
                return Err(FireflyConfigLoaderError::UnknownVersion);
            }
        }

        // a config without a usable default body can never drive the effect
        BodyConfigStore::from_asset(&asset)?;

        Ok(asset)
    }

    fn extensions(&self) -> &[&str] {
        &["ron"]
    }
}
