use super::helpers::*;

use bevy::prelude::*;
use bevy_firefly::config::{ConfigError, DEFAULT_BODY};
use bevy_firefly::prelude::*;

fn asset(bodies: Vec<BodyEffectConfig>) -> FireflyConfigAsset {
    FireflyConfigAsset::new(FireflySettings::default(), vec![], bodies, vec![])
}

#[test]
fn hdr_color_applies_intensity_exponent() {
    let color = HdrColor::new(255.0, 127.5, 0.0, 2.0).to_linear();
    assert!(approx_eq(color.red, 4.0));
    assert!(approx_eq(color.green, 2.0));
    assert!(approx_eq(color.blue, 0.0));
}

#[test]
fn lookup_falls_back_to_default() {
    let mut store = default_store();
    let mut eve = body_config("Eve");
    eve.strength_multiplier = 1.4;
    store.insert_body(eve);

    assert_eq!(store.get("Eve").strength_multiplier, 1.4);
    assert_eq!(store.get("Jool").name, DEFAULT_BODY);
    assert!(store.try_get("Jool").is_none());
    assert!(store.try_get(DEFAULT_BODY).is_some());
}

#[test]
fn store_requires_a_default_body() {
    let result = BodyConfigStore::from_asset(&asset(vec![body_config("Kerbin")]));
    assert_eq!(result.err(), Some(ConfigError::MissingDefault));
}

#[test]
fn invalid_bodies_are_skipped() {
    let mut missing_colors = body_config("Duna");
    missing_colors.colors.glow = None;

    let mut non_finite = body_config("Laythe");
    non_finite.length_multiplier = f32::NAN;

    let mut bad_color = body_config("Tylo");
    bad_color.colors.shockwave = Some(HdrColor::new(f32::INFINITY, 0.0, 0.0, 0.0));

    let store = BodyConfigStore::from_asset(&asset(vec![
        body_config("Default"),
        missing_colors,
        non_finite,
        bad_color,
        body_config("Eve"),
    ]))
    .expect("store should build");

    let mut names: Vec<&str> = store.body_names().collect();
    names.sort();
    assert_eq!(names, vec!["Default", "Eve"]);
}

#[test]
fn first_duplicate_body_wins() {
    let mut first = body_config("Eve");
    first.opacity_multiplier = 0.5;
    let mut second = body_config("Eve");
    second.opacity_multiplier = 0.9;

    let store = BodyConfigStore::from_asset(&asset(vec![body_config("Default"), first, second]))
        .expect("store should build");
    assert_eq!(store.get("Eve").opacity_multiplier, 0.5);
}

#[test]
fn invalid_default_is_missing() {
    let mut broken = body_config("Default");
    broken.colors.trail_primary = None;
    let result = BodyConfigStore::from_asset(&asset(vec![broken]));
    assert_eq!(result.err(), Some(ConfigError::MissingDefault));
}

#[test]
fn planet_packs_scale_affected_bodies() {
    let mut eve = body_config("Eve");
    eve.strength_multiplier = 2.0;

    let config = FireflyConfigAsset::new(
        FireflySettings::default(),
        vec![
            PlanetPackConfig {
                name: "Rescale".into(),
                speed_multiplier: 1.5,
                affected_bodies: vec!["Eve".into(), "Kerbin".into()],
            },
            PlanetPackConfig {
                name: "Empty".into(),
                speed_multiplier: 10.0,
                affected_bodies: vec![],
            },
        ],
        vec![body_config("Default"), eve, body_config("Kerbin"), body_config("Duna")],
        vec![],
    );

    let store = BodyConfigStore::from_asset(&config).expect("store should build");
    assert!(approx_eq(store.get("Eve").strength_multiplier, 3.0));
    assert!(approx_eq(store.get("Kerbin").strength_multiplier, 1.5));
    assert!(approx_eq(store.get("Duna").strength_multiplier, 1.0));
}

#[test]
fn part_overrides_are_registered() {
    let mut colors = BodyColors::default();
    colors.glow = Some(color(0.0, 0.0, 255.0));

    let config = FireflyConfigAsset::new(
        FireflySettings::default(),
        vec![],
        vec![body_config("Default")],
        vec![PartColorOverride {
            name: "PotatoRoid".into(),
            colors,
        }],
    );

    let store = BodyConfigStore::from_asset(&config).expect("store should build");
    assert_eq!(store.part_override("PotatoRoid"), Some(&colors));
    assert!(store.part_override("mk1pod").is_none());
}

#[test]
fn merge_prefers_set_override_slots() {
    let base = BodyColors::uniform(color(255.0, 0.0, 0.0));
    let mut overrides = BodyColors::default();
    overrides.wrap_layer = Some(color(0.0, 255.0, 0.0));

    let merged = base.merge(&overrides);

    assert_eq!(merged.get(ColorSlot::WrapLayer), Some(color(0.0, 255.0, 0.0)));
    for slot in ColorSlot::ALL.into_iter().filter(|slot| *slot != ColorSlot::WrapLayer) {
        assert_eq!(merged.get(slot), Some(color(255.0, 0.0, 0.0)));
    }
    assert_eq!(base.merge(&BodyColors::default()), base);
}

#[test]
fn body_config_defaults_from_ron() {
    let body: BodyEffectConfig = ron::from_str(
        r#"(
            name: "Eve",
            strength_multiplier: 1.2,
            colors: (glow: Some((255.0, 200.0, 100.0, 1.0))),
        )"#,
    )
    .expect("body should parse");

    assert_eq!(body.strength_multiplier, 1.2);
    assert_eq!(body.length_multiplier, 1.0);
    assert_eq!(body.particle_threshold, 1800.0);
    assert_eq!(body.streak_probability, 0.0);
    assert_eq!(body.colors.glow, Some(HdrColor::new(255.0, 200.0, 100.0, 1.0)));
    assert!(body.colors.glow_hot.is_none());
}

#[test]
fn settings_defaults() {
    let settings = FireflySettings::default();
    assert_eq!(settings.strength_base, 2800.0);
    assert_eq!(settings.length_multiplier, 1.0);
    assert_eq!(settings.envelope_scale_factor, Vec3::new(1.05, 1.07, 1.05));
    assert!(settings.particles_enabled());

    let parsed: FireflySettings = ron::from_str("()").expect("empty settings should parse");
    assert_eq!(parsed, settings);
}

#[test]
fn toggles_survive_serialization() {
    let settings = FireflySettings {
        toggles: EffectToggles::DISABLE_PARTICLES | EffectToggles::HDR_OVERRIDE,
        ..default()
    };
    let text = ron::to_string(&settings).expect("settings should serialize");

    let parsed: FireflySettings = ron::from_str(&text).expect("settings should parse");
    assert!(!parsed.particles_enabled());
    assert!(parsed.toggles.contains(EffectToggles::HDR_OVERRIDE));
}
