//! Outdoor vignette.
//!
//! A large green ground plane under a gradient sky, exponential fog and
//! three light sources (directional sun, ambient fill, hemisphere). Trees,
//! rocks, clouds, deer and two dancing characters stream in as their files
//! arrive. Dragging looks around, the wheel moves the camera along Z and the
//! first click starts the background music.

use std::f32::consts::FRAC_PI_2;

use cgmath::{Point3, Rad, Vector3, Zero};
use instant::Duration;
use rand::Rng;

use crate::{
    audio::{AudioOutput, BackgroundMusic},
    camera::{Camera, CameraController, DragLookController, Projection},
    config::{OutdoorConfig, ShadowMapKind, ShadowSettings},
    context::Context,
    data_structures::{
        material::{Color, Material},
        scene_graph::{Fog, Light, Node, NodeHandle, Scene, ShadowCamera},
        sky::SkyGradient,
    },
    demos::{DemoEvent, SceneRuntime, jobs_out},
    flow::{GraphicsFlow, Out},
    input::PointerEvent,
    render::Render,
    resources::{loader::LoadRequest, primitives},
    scatter,
};

pub const CHARACTER_BASE: &str = "nobita/";

/// Sky and hemisphere colours.
pub fn sky_gradient() -> SkyGradient {
    SkyGradient::new(
        Color::from_hsl(0.6, 1.0, 0.6),
        Color::WHITE,
        0.033,
        0.6,
    )
}

pub fn sun_shadow() -> ShadowCamera {
    ShadowCamera {
        near: 0.1,
        far: 1000.0,
        left: -100.0,
        right: 100.0,
        top: 100.0,
        bottom: -100.0,
        bias: -0.001,
        map_size: 4096,
    }
}

/// The two animated characters.
pub fn characters() -> Vec<LoadRequest> {
    vec![
        LoadRequest::new(CHARACTER_BASE, "nobita.glb")
            .with_animation("Rumba Dancing.glb")
            .at(Vector3::new(0.0, 0.0, 5.0))
            .scaled(0.15)
            .with_shadows(true, false),
        LoadRequest::new(CHARACTER_BASE, "mouse.glb")
            .with_animation("Hip Hop Dancing.glb")
            .at(Vector3::new(50.0, -22.0, 0.0))
            .scaled(0.3)
            .with_shadows(true, false),
    ]
}

#[derive(Debug)]
pub struct OutdoorSetup {
    pub scene: Scene,
    pub camera: Camera,
    pub projection: Projection,
    pub shadows: ShadowSettings,
    pub sky: NodeHandle,
    pub sun: NodeHandle,
    pub requests: Vec<LoadRequest>,
}

/// Builds the static part of the scene and the list of models to stream in.
pub fn bootstrap<R: Rng + ?Sized>(
    config: &OutdoorConfig,
    (width, height): (u32, u32),
    rng: &mut R,
) -> OutdoorSetup {
    let mut scene = Scene::new();
    scene.background = Color::WHITE;
    scene.fog = Some(Fog::new(Color::hex(0x89b2eb), 0.002));

    let sun = scene.add(
        Node::light(
            Light::directional(Color::WHITE, 0.5, Vector3::zero()).with_shadow(sun_shadow()),
        )
        .named("sun")
        .at(Vector3::new(-10.0, 500.0, 10.0)),
    );
    scene.add(Node::light(Light::ambient(Color::WHITE, 0.6)).named("ambient"));

    let gradient = sky_gradient();
    scene.add(
        Node::light(Light::hemisphere(
            gradient.top,
            Color::from_hsl(0.095, 1.0, 0.75),
            0.5,
        ))
        .named("hemisphere")
        .at(Vector3::new(0.0, 50.0, 0.0)),
    );
    // The horizon colour wins over the configured fog colour
    if let Some(fog) = scene.fog.as_mut() {
        fog.color = gradient.bottom;
    }
    let sky = scene.add(Node::sky(primitives::sphere(1000.0, 32, 15), gradient).named("sky"));

    let mut ground = Node::mesh(
        primitives::plane(5000.0, 5000.0, 10, 10),
        Material::new(Color::hex(0x1e601c)),
    )
    .named("ground")
    .receiving_shadow(true);
    ground.transform.rotation.x = Rad(-FRAC_PI_2);
    scene.add(ground);

    let half_extent = config.scatter_half_extent;
    let mut requests = Vec::new();
    requests.extend(scatter::animals(rng, scatter::ANIMAL_COUNT, half_extent));
    requests.extend(scatter::clouds(rng, scatter::CLOUD_COUNT, half_extent));
    requests.extend(scatter::foliage(rng, scatter::FOLIAGE_COUNT, half_extent));
    requests.extend(characters());

    OutdoorSetup {
        scene,
        camera: Camera::looking_at((10.0, 20.0, 90.0), Point3::new(0.0, 20.0, 0.0)),
        projection: Projection::new(width, height, cgmath::Deg(80.0), 1.0, 1000.0),
        shadows: ShadowSettings {
            enabled: true,
            kind: ShadowMapKind::PcfSoft,
        },
        sky,
        sun,
        requests,
    }
}

pub struct OutdoorFlow {
    config: OutdoorConfig,
    runtime: SceneRuntime,
    camera: Camera,
    projection: Projection,
    shadows: ShadowSettings,
    music: BackgroundMusic,
    audio: Option<AudioOutput>,
}

impl OutdoorFlow {
    pub fn new<R: Rng + ?Sized>(config: OutdoorConfig, size: (u32, u32), rng: &mut R) -> Self {
        let setup = bootstrap(&config, size, rng);
        let mut runtime = SceneRuntime::new(setup.scene);
        for request in setup.requests {
            runtime.loader.request(request);
        }
        let music = BackgroundMusic::new(&config.music, config.music_volume);
        Self {
            config,
            runtime,
            camera: setup.camera,
            projection: setup.projection,
            shadows: setup.shadows,
            music,
            audio: None,
        }
    }

    fn on_music_gesture(&mut self, event: &PointerEvent) -> Out<(), DemoEvent> {
        let Some(action) = self.music.on_pointer(event) else {
            return Out::Empty;
        };
        if action.create_output && self.audio.is_none() {
            match AudioOutput::new() {
                Ok(output) => self.audio = Some(output),
                Err(e) => log::warn!("Audio is not available: {:#}", e),
            }
        }
        let Some(request) = action.play else {
            return Out::Empty;
        };
        let Some(output) = self.audio.as_mut() else {
            self.music.on_failed(&anyhow::anyhow!("no audio output"));
            return Out::Empty;
        };
        match output.play(&request) {
            Ok(started) => Out::FutEvent(vec![Box::new(async move {
                DemoEvent::MusicStarted(started.await)
            })]),
            Err(e) => {
                self.music.on_failed(&e);
                Out::Empty
            }
        }
    }
}

impl GraphicsFlow<(), DemoEvent> for OutdoorFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), DemoEvent> {
        log::info!("Starting outdoor scene with {} model requests", self.runtime.loader.len());
        ctx.camera.camera = self.camera;
        ctx.projection = self.projection;
        ctx.projection.resize(ctx.config.width, ctx.config.height);
        ctx.camera.controller = CameraController::DragLook(DragLookController::new(
            self.config.look_sensitivity,
            self.config.zoom_speed,
        ));
        ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
        ctx.clear_colour = self.runtime.scene.background.into();
        ctx.shadows = self.shadows;
        self.runtime.init(ctx);
        jobs_out(&mut self.runtime)
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), dt: Duration) -> Out<(), DemoEvent> {
        self.runtime.update_mixers(dt.as_secs_f32());
        self.runtime.sync(ctx);
        jobs_out(&mut self.runtime)
    }

    fn on_pointer_event(
        &mut self,
        _: &Context,
        _: &mut (),
        event: &PointerEvent,
    ) -> Out<(), DemoEvent> {
        self.on_music_gesture(event)
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut (), event: DemoEvent) -> Option<DemoEvent> {
        match self.runtime.handle_event(event)? {
            DemoEvent::MusicStarted(Ok(())) => {
                log::info!("Background music {} is playing", self.config.music);
                self.music.on_started();
                None
            }
            DemoEvent::MusicStarted(Err(e)) => {
                self.music.on_failed(&e);
                None
            }
            other => Some(other),
        }
    }

    fn on_render(&self) -> Render<'_> {
        self.runtime.render()
    }
}
