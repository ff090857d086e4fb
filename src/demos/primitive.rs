//! Focal-shape demos.
//!
//! Every demo shows the same stage: a textured ground plane, a point light
//! with a small marker sphere and one focal primitive that spins a little
//! every frame. The focal object is either a point cloud or a textured solid.
//! Except for the teapot, a left drag that starts on the focal object turns it
//! directly while the orbit controller is paused.

use std::f32::consts::{FRAC_PI_2, TAU};

use cgmath::{Point3, Rad, Vector3};
use instant::Duration;
use winit::event::MouseButton;

use crate::{
    camera::{Camera, CameraController, OrbitController, Projection},
    config::{MotionConfig, ShadowMapKind, ShadowSettings, primitive_clear_colour},
    context::Context,
    data_structures::{
        material::{Color, Material, PointsMaterial, Side, TextureMap},
        scene_graph::{Light, Node, NodeHandle, Scene, ShadowCamera},
    },
    demos::{DemoEvent, SceneRuntime, jobs_out},
    flow::{GraphicsFlow, Out},
    input::PointerEvent,
    panel::{Control, Field, Folder, Panel},
    render::Render,
    resources::primitives,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocalShape {
    ConePoint,
    SpherePoint,
    TorusPoint,
    TorusSolid,
    TeapotPoint,
}

impl FocalShape {
    pub const ALL: [FocalShape; 5] = [
        FocalShape::ConePoint,
        FocalShape::SpherePoint,
        FocalShape::TorusPoint,
        FocalShape::TorusSolid,
        FocalShape::TeapotPoint,
    ];

    pub fn from_demo(name: &str) -> Option<Self> {
        match name {
            "cone_point" => Some(FocalShape::ConePoint),
            "sphere_point" => Some(FocalShape::SpherePoint),
            "torus_point" => Some(FocalShape::TorusPoint),
            "torus_solid" => Some(FocalShape::TorusSolid),
            "teapot_point" => Some(FocalShape::TeapotPoint),
            _ => None,
        }
    }

    /// Node and panel folder name of the focal object.
    pub fn name(&self) -> &'static str {
        match self {
            FocalShape::ConePoint => "cone",
            FocalShape::SpherePoint => "sphere",
            FocalShape::TorusPoint | FocalShape::TorusSolid => "torus",
            FocalShape::TeapotPoint => "teapot",
        }
    }

    pub fn draggable(&self) -> bool {
        !matches!(self, FocalShape::TeapotPoint)
    }

    fn node(&self) -> Node {
        let points = |geometry| {
            Node::points(geometry, PointsMaterial::new(Color::BLACK, 0.05)).casting_shadow(true)
        };
        let node = match self {
            FocalShape::ConePoint => points(primitives::cone(0.8, 1.6, 64, 16)),
            FocalShape::SpherePoint => points(primitives::sphere(1.0, 24, 24)),
            FocalShape::TorusPoint => points(primitives::torus(1.0, 0.2, 16, 100)),
            FocalShape::TeapotPoint => points(primitives::teapot(0.5, 8)),
            FocalShape::TorusSolid => Node::mesh(
                primitives::torus(1.0, 0.2, 16, 100),
                Material::new(Color::rgb(120, 120, 120))
                    .with_map(TextureMap::new("torus.jpg", [1.0, 0.5])),
            )
            .casting_shadow(true),
        };
        node.named(self.name())
    }
}

/// Everything a primitive demo starts from. Built without touching the GPU.
#[derive(Debug)]
pub struct DemoSetup {
    pub scene: Scene,
    pub camera: Camera,
    pub projection: Projection,
    pub clear_colour: Color,
    pub shadows: ShadowSettings,
    pub panel: Panel,
    pub focal: NodeHandle,
    pub light: NodeHandle,
}

pub fn bootstrap(shape: FocalShape, (width, height): (u32, u32)) -> DemoSetup {
    let mut scene = Scene::new();
    scene.background = primitive_clear_colour();

    let mut plane = Node::mesh(
        primitives::plane(20.0, 20.0, 1, 1),
        Material::new(Color::rgb(219, 201, 174))
            .with_map(TextureMap::new("plane.jpg", [1.0, 1.0]))
            .with_side(Side::Double),
    )
    .named("plane")
    .at(Vector3::new(0.0, -2.0, 0.0))
    .receiving_shadow(true);
    plane.transform.rotation.x = Rad(FRAC_PI_2);
    scene.add(plane);

    let light = scene.add(
        Node::light(Light::point(Color::WHITE, 1.0).with_shadow(ShadowCamera::default()))
            .named("pointLight")
            .at(Vector3::new(0.0, 1.5, 0.0)),
    );
    scene.add_child(
        light,
        Node::mesh(primitives::sphere(0.05, 24, 24), Material::unlit(Color::WHITE)).named("marker"),
    );

    let focal = scene.add(shape.node());

    let panel = Panel::new()
        .with_folder(
            Folder::new("pointLight")
                .with(Control::new("intensity", light, Field::LightIntensity, 0.0, 10.0))
                .with(Control::new("x", light, Field::PositionX, 0.0, 5.0))
                .with(Control::new("y", light, Field::PositionY, 0.0, 5.0))
                .with(Control::new("z", light, Field::PositionZ, 0.0, 5.0)),
        )
        .with_folder(
            Folder::new(shape.name())
                .with(Control::new("scaleX", focal, Field::ScaleX, 0.0, 2.0))
                .with(Control::new("scaleY", focal, Field::ScaleY, 0.0, 2.0))
                .with(Control::new("scaleZ", focal, Field::ScaleZ, 0.0, 2.0)),
        );

    DemoSetup {
        scene,
        camera: Camera::looking_at((1.0, 2.0, 5.0), Point3::new(0.0, 0.0, 0.0)),
        projection: Projection::new(width, height, cgmath::Deg(45.0), 1.0, 1000.0),
        clear_colour: primitive_clear_colour(),
        shadows: ShadowSettings {
            enabled: true,
            kind: ShadowMapKind::Basic,
        },
        panel,
        focal,
        light,
    }
}

/// One frame of spin: `spin` radians about Z and Y, kept in `[0, 2π)`.
pub fn tick(scene: &mut Scene, focal: NodeHandle, spin: f32) {
    if let Some(node) = scene.get_mut(focal) {
        let rotation = &mut node.transform.rotation;
        rotation.z = Rad((rotation.z.0 + spin).rem_euclid(TAU));
        rotation.y = Rad((rotation.y.0 + spin).rem_euclid(TAU));
    }
}

/// Turns the focal object by a pointer drag: horizontal motion about Y,
/// vertical motion about X.
pub fn drag_rotate(scene: &mut Scene, focal: NodeHandle, dx: f64, dy: f64, speed: f32) {
    if let Some(node) = scene.get_mut(focal) {
        node.transform.rotation.y += Rad(dx as f32 * speed);
        node.transform.rotation.x += Rad(dy as f32 * speed);
    }
}

/// Whether the cursor at `(x, y)` points at the focal object's bounding sphere.
pub fn hits_focal(
    scene: &Scene,
    focal: NodeHandle,
    camera: &Camera,
    projection: &Projection,
    (x, y): (f64, f64),
    (width, height): (u32, u32),
) -> bool {
    let Some(node) = scene.get(focal) else {
        return false;
    };
    let Some(geometry) = node.geometry() else {
        return false;
    };
    let Some(world) = scene.world_transform(focal) else {
        return false;
    };
    let radius = geometry.bounding_radius() * world.max_scale();
    let center = world.transform_point(Point3::new(0.0, 0.0, 0.0));
    camera
        .cast_ray_from_mouse(x, y, width as f32, height as f32, projection)
        .and_then(|ray| ray.intersect_sphere(center, radius))
        .is_some()
}

pub struct PrimitiveFlow {
    shape: FocalShape,
    motion: MotionConfig,
    runtime: SceneRuntime,
    setup_camera: Camera,
    setup_projection: Projection,
    clear_colour: Color,
    shadows: ShadowSettings,
    panel: Panel,
    focal: NodeHandle,
    grabbed: bool,
}

impl PrimitiveFlow {
    pub fn new(shape: FocalShape, motion: MotionConfig, size: (u32, u32)) -> Self {
        let setup = bootstrap(shape, size);
        Self {
            shape,
            motion,
            runtime: SceneRuntime::new(setup.scene),
            setup_camera: setup.camera,
            setup_projection: setup.projection,
            clear_colour: setup.clear_colour,
            shadows: setup.shadows,
            panel: setup.panel,
            focal: setup.focal,
            grabbed: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.runtime.scene
    }
}

impl GraphicsFlow<(), DemoEvent> for PrimitiveFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), DemoEvent> {
        log::info!("Starting {:?}", self.shape);
        ctx.camera.camera = self.setup_camera;
        ctx.projection = self.setup_projection;
        ctx.projection.resize(ctx.config.width, ctx.config.height);
        ctx.camera.controller = CameraController::Orbit(OrbitController::new(
            Point3::new(0.0, 0.0, 0.0),
            ctx.config.height,
        ));
        ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
        ctx.clear_colour = self.clear_colour.into();
        ctx.shadows = self.shadows;
        self.runtime.init(ctx);
        jobs_out(&mut self.runtime)
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), _dt: Duration) -> Out<(), DemoEvent> {
        tick(&mut self.runtime.scene, self.focal, self.motion.spin_per_tick);
        self.runtime.sync(ctx);
        jobs_out(&mut self.runtime)
    }

    fn on_gui(&mut self, gui: &egui::Context, _: &mut ()) {
        self.panel.show(gui, &mut self.runtime.scene);
    }

    fn on_pointer_event(
        &mut self,
        ctx: &Context,
        _: &mut (),
        event: &PointerEvent,
    ) -> Out<(), DemoEvent> {
        if !self.shape.draggable() {
            return Out::Empty;
        }
        match *event {
            PointerEvent::Down {
                button: MouseButton::Left,
                x,
                y,
            } => {
                if hits_focal(
                    &self.runtime.scene,
                    self.focal,
                    &ctx.camera.camera,
                    &ctx.projection,
                    (x, y),
                    ctx.size(),
                ) {
                    self.grabbed = true;
                    return Out::Configure(Box::new(|ctx: &mut Context| {
                        ctx.camera.controller.set_enabled(false)
                    }));
                }
                Out::Empty
            }
            PointerEvent::Move { dx, dy, .. } if self.grabbed => {
                drag_rotate(
                    &mut self.runtime.scene,
                    self.focal,
                    dx,
                    dy,
                    self.motion.drag_rotate_speed,
                );
                Out::Empty
            }
            PointerEvent::Up { .. } if self.grabbed => {
                self.grabbed = false;
                Out::Configure(Box::new(|ctx: &mut Context| {
                    ctx.camera.controller.set_enabled(true)
                }))
            }
            _ => Out::Empty,
        }
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut (), event: DemoEvent) -> Option<DemoEvent> {
        self.runtime.handle_event(event)
    }

    fn on_render(&self) -> Render<'_> {
        self.runtime.render()
    }
}
