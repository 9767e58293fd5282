#![allow(dead_code)]

use std::path::Path;

use bevy::asset::LoadState;
use bevy::math::Affine3A;
use bevy::prelude::*;
use bevy_firefly::backend::{BackendError, EffectBackend, EffectFrame, TeardownScope};
use bevy_firefly::bounds::VesselBounds;
use bevy_firefly::config::FireflyConfigLoader;
use bevy_firefly::lifecycle::TickContext;
use bevy_firefly::material::EnvelopeDraw;
use bevy_firefly::prelude::*;

pub const ATMOSPHERE_DEPTH: f64 = 70_000.0;

pub fn fixtures_path() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .to_string_lossy()
        .to_string()
}

pub fn create_minimal_app() -> App {
    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(bevy::app::ScheduleRunnerPlugin::run_loop(
            std::time::Duration::from_millis(10),
        )),
    );

    app.add_plugins(AssetPlugin {
        file_path: fixtures_path(),
        ..default()
    });

    app.init_asset::<FireflyConfigAsset>()
        .init_asset_loader::<FireflyConfigLoader>();

    app
}

/// A minimal app running the full plugin against `tests/fixtures/<config>`.
pub fn create_firefly_app(config: &str) -> App {
    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(bevy::app::ScheduleRunnerPlugin::run_loop(
            std::time::Duration::from_millis(10),
        )),
    );

    app.add_plugins(AssetPlugin {
        file_path: fixtures_path(),
        ..default()
    });

    app.add_plugins(FireflyPlugin {
        config_path: config.to_string(),
    });

    app
}

pub fn advance_frames(app: &mut App, n: u32) {
    for _ in 0..n {
        app.update();
    }
}

/// Runs the fixed tick schedule `n` times without waiting for real time to pass.
pub fn run_fixed_ticks(app: &mut App, n: u32) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedPostUpdate);
    }
}

pub fn run_until_config_applied(app: &mut App, max_updates: u32) -> bool {
    for _ in 0..max_updates {
        app.update();
        if app.world().contains_resource::<BodyConfigStore>() {
            return true;
        }
    }
    false
}

pub fn load_config_asset(app: &mut App, fixture: &str) -> Result<FireflyConfigAsset, String> {
    let handle: Handle<FireflyConfigAsset> = app
        .world()
        .resource::<AssetServer>()
        .load(fixture.to_string());
    for _ in 0..100 {
        app.update();
        let asset_server = app.world().resource::<AssetServer>();
        match asset_server.load_state(&handle) {
            LoadState::Loaded => {
                let assets = app.world().resource::<Assets<FireflyConfigAsset>>();
                return Ok(assets.get(&handle).expect("asset should exist").clone());
            }
            LoadState::Failed(err) => return Err(format!("{err}")),
            _ => continue,
        }
    }
    panic!("fixture timed out loading: {fixture}");
}

pub fn color(red: f32, green: f32, blue: f32) -> HdrColor {
    HdrColor::new(red, green, blue, 0.0)
}

pub fn body_config(name: &str) -> BodyEffectConfig {
    BodyEffectConfig::new(name, BodyColors::uniform(color(255.0, 128.0, 0.0)))
}

pub fn default_store() -> BodyConfigStore {
    BodyConfigStore::new(body_config("Default"))
}

/// A unit-sized box mesh centered on `offset`, with half extents `half`.
pub fn box_mesh(surface: u64, name: &str, offset: Vec3, half: Vec3) -> MeshGeometry {
    MeshGeometry::new(
        SurfaceId(surface),
        name,
        MeshBounds::new(Vec3::ZERO, half),
    )
    .with_transform(Affine3A::from_translation(offset))
}

pub fn part_with_box(name: &str, surface: u64, offset: Vec3, half: Vec3) -> PartGeometry {
    PartGeometry::new(name).with_mesh(box_mesh(surface, "model", offset, half))
}

/// A vessel of `count` stacked parts, each a 2x2x2 box.
pub fn stacked_vessel(count: usize) -> VesselGeometry {
    let parts = (0..count)
        .map(|i| {
            part_with_box(
                &format!("part.{i}"),
                i as u64 + 1,
                Vec3::new(0.0, i as f32 * 2.0, 0.0),
                Vec3::ONE,
            )
        })
        .collect();
    VesselGeometry::new(Affine3A::IDENTITY, parts)
}

pub fn atmospheric_body(name: &str) -> BodyInfo {
    BodyInfo::new(name, Some(ATMOSPHERE_DEPTH))
}

pub fn flight_at(altitude: f64) -> FlightState {
    let mut flight = FlightState::new(atmospheric_body("Kerbin"), altitude);
    flight.surface_velocity = Vec3::new(0.0, -1.0, 0.0) * 2000.0;
    flight
}

pub fn hot_flight(altitude: f64) -> FlightState {
    let mut flight = flight_at(altitude);
    flight.aero = AeroSignal {
        fx_scalar: 1.0,
        fx_state: 1.0,
    };
    flight
}

pub fn tick_context<'a>(settings: &'a FireflySettings, store: &'a BodyConfigStore) -> TickContext<'a> {
    TickContext {
        settings,
        store,
        dt: 0.02,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Create(VesselId),
    Envelope(VesselId, usize),
    Frame(VesselId),
    Release(VesselId, TeardownScope),
}

/// Records every call made by the lifecycle.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub last_envelope: Vec<EnvelopeDraw>,
    pub last_frame: Option<EffectFrame>,
    pub fail_creation: bool,
}

impl RecordingBackend {
    pub fn failing() -> Self {
        Self {
            fail_creation: true,
            ..default()
        }
    }

    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn creations(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Create(_)))
    }

    pub fn releases(&self, scope: TeardownScope) -> usize {
        self.count(|call| matches!(call, BackendCall::Release(_, s) if *s == scope))
    }

    pub fn frames(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Frame(_)))
    }
}

impl EffectBackend for RecordingBackend {
    fn create_resources(&mut self, vessel: VesselId, _bounds: &VesselBounds) -> Result<(), BackendError> {
        if self.fail_creation {
            return Err(BackendError::Creation {
                resource: "material",
                reason: "shader missing".into(),
            });
        }
        self.calls.push(BackendCall::Create(vessel));
        Ok(())
    }

    fn submit_envelope(&mut self, vessel: VesselId, draws: Vec<EnvelopeDraw>) {
        self.calls.push(BackendCall::Envelope(vessel, draws.len()));
        self.last_envelope = draws;
    }

    fn submit_frame(&mut self, vessel: VesselId, frame: &EffectFrame) {
        self.calls.push(BackendCall::Frame(vessel));
        self.last_frame = Some(*frame);
    }

    fn release(&mut self, vessel: VesselId, scope: TeardownScope) {
        self.calls.push(BackendCall::Release(vessel, scope));
    }
}

/// Emitter handle that counts rate writes.
#[derive(Debug, Clone)]
pub struct CountingEmitter {
    pub kind: EmitterKind,
    pub base: RateRange,
    pub rate: RateRange,
    pub position: Vec3,
    pub velocity: (Vec3, Vec3),
    pub rate_writes: u32,
    pub active: bool,
}

impl CountingEmitter {
    pub fn new(kind: EmitterKind, base: RateRange) -> Self {
        Self {
            kind,
            base,
            rate: base,
            position: Vec3::ZERO,
            velocity: (Vec3::ZERO, Vec3::ZERO),
            rate_writes: 0,
            active: true,
        }
    }
}

impl EmitterHandle for CountingEmitter {
    fn kind(&self) -> EmitterKind {
        self.kind
    }

    fn base_rate(&self) -> RateRange {
        self.base
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_rate(&mut self, rate: RateRange) {
        self.rate = rate;
        self.rate_writes += 1;
    }

    fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_velocity_range(&mut self, min: Vec3, max: Vec3) {
        self.velocity = (min, max);
    }
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

pub fn approx_vec(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, 1e-3)
}
