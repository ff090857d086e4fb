//! The demo flows.
//!
//! - `primitive` holds the five focal-shape demos (point cone, point sphere,
//!   point torus, solid torus, point teapot)
//! - `outdoor` holds the animated outdoor vignette
//!
//! Both keep their scene in a [`SceneRuntime`] which owns the GPU mirror of
//! the scene, the asset loader and the animation mixers, and turns queued
//! loads into futures for the flow to hand to the event loop.

use std::{collections::HashSet, future::Future, pin::Pin, sync::Arc};

use crate::{
    animation::AnimationMixer,
    context::{Context, InitContext},
    data_structures::{block::SceneBlocks, scene_graph::Scene},
    flow::{FlowConstructor, GraphicsFlow, Out},
    render::Render,
    resources::{
        ImportedModel,
        load_model,
        loader::{AssetLoader, LoadJob, TaskId},
        texture::load_texture_image,
    },
};

pub mod outdoor;
pub mod primitive;

/// Results of background work, delivered through the event loop.
pub enum DemoEvent {
    MeshLoaded(TaskId, anyhow::Result<ImportedModel>),
    AnimationLoaded(TaskId, anyhow::Result<ImportedModel>),
    TextureLoaded(String, anyhow::Result<image::RgbaImage>),
    MusicStarted(anyhow::Result<()>),
}

impl std::fmt::Debug for DemoEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeshLoaded(task, result) => {
                write!(f, "MeshLoaded({:?}, ok: {})", task, result.is_ok())
            }
            Self::AnimationLoaded(task, result) => {
                write!(f, "AnimationLoaded({:?}, ok: {})", task, result.is_ok())
            }
            Self::TextureLoaded(path, result) => {
                write!(f, "TextureLoaded({}, ok: {})", path, result.is_ok())
            }
            Self::MusicStarted(result) => write!(f, "MusicStarted(ok: {})", result.is_ok()),
        }
    }
}

pub type DemoFuture = Box<dyn Future<Output = DemoEvent>>;

/// Scene, loader and mixers of one demo plus the GPU mirror of the scene.
pub struct SceneRuntime {
    pub scene: Scene,
    pub loader: AssetLoader,
    pub mixers: Vec<AnimationMixer>,
    blocks: Option<SceneBlocks>,
    requested_textures: HashSet<String>,
}

impl SceneRuntime {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            loader: AssetLoader::new(),
            mixers: Vec::new(),
            blocks: None,
            requested_textures: HashSet::new(),
        }
    }

    /// Creates the GPU mirror and uploads the scene as it is now.
    pub fn init(&mut self, ctx: &Context) {
        let mut blocks = SceneBlocks::new(&ctx.device, &ctx.queue);
        blocks.sync(ctx, &self.scene);
        self.blocks = Some(blocks);
    }

    /// Futures for every load queued since the last call: model and
    /// animation files of the loader and texture maps nobody fetched yet.
    pub fn jobs(&mut self) -> Vec<DemoFuture> {
        let mut futures: Vec<DemoFuture> = Vec::new();
        for job in self.loader.drain_jobs() {
            match job {
                LoadJob::Mesh { task, path } => futures.push(Box::new(async move {
                    DemoEvent::MeshLoaded(task, load_model(&path).await)
                })),
                LoadJob::Animation { task, path } => futures.push(Box::new(async move {
                    DemoEvent::AnimationLoaded(task, load_model(&path).await)
                })),
            }
        }
        for path in self.scene.pending_textures() {
            if self.requested_textures.insert(path.clone()) {
                futures.push(Box::new(async move {
                    let image = load_texture_image(&path).await;
                    DemoEvent::TextureLoaded(path, image)
                }));
            }
        }
        futures
    }

    /// Applies load results. Events that are not about assets are handed back.
    pub fn handle_event(&mut self, event: DemoEvent) -> Option<DemoEvent> {
        match event {
            DemoEvent::MeshLoaded(task, result) => {
                self.loader.on_mesh_loaded(task, result, &mut self.scene);
                None
            }
            DemoEvent::AnimationLoaded(task, result) => {
                self.loader
                    .on_animation_loaded(task, result, &mut self.scene, &mut self.mixers);
                None
            }
            DemoEvent::TextureLoaded(path, Ok(image)) => {
                let applied = self.scene.apply_texture(&path, Arc::new(image));
                log::debug!("Texture {} applied to {} materials", path, applied);
                None
            }
            DemoEvent::TextureLoaded(path, Err(e)) => {
                log::warn!("Could not load texture {}: {:#}", path, e);
                None
            }
            other => Some(other),
        }
    }

    pub fn update_mixers(&mut self, dt: f32) {
        for mixer in self.mixers.iter_mut() {
            mixer.update(dt, &mut self.scene);
        }
    }

    pub fn sync(&mut self, ctx: &Context) {
        if let Some(blocks) = self.blocks.as_mut() {
            blocks.sync(ctx, &self.scene);
        }
    }

    pub fn render(&self) -> Render<'_> {
        match &self.blocks {
            Some(blocks) => blocks.render(),
            None => Render::None,
        }
    }
}

/// Wraps the queued futures of `runtime` into a flow output.
pub(crate) fn jobs_out<S>(runtime: &mut SceneRuntime) -> Out<S, DemoEvent> {
    let jobs = runtime.jobs();
    if jobs.is_empty() {
        Out::Empty
    } else {
        Out::FutEvent(jobs)
    }
}

pub const DEMO_NAMES: [&str; 6] = [
    "cone_point",
    "sphere_point",
    "torus_point",
    "torus_solid",
    "teapot_point",
    "loadmodel",
];

/// Constructor of the flow of the demo called `name`.
pub fn constructor(name: &str) -> Option<FlowConstructor<(), DemoEvent>> {
    if name == "loadmodel" {
        return Some(Box::new(|init: InitContext| {
            Box::pin(async move {
                Box::new(outdoor::OutdoorFlow::new(
                    crate::config::OutdoorConfig::default(),
                    (init.width, init.height),
                    &mut rand::thread_rng(),
                )) as Box<dyn GraphicsFlow<(), DemoEvent>>
            }) as Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<(), DemoEvent>>>>>
        }));
    }
    let shape = primitive::FocalShape::from_demo(name)?;
    Some(Box::new(move |init: InitContext| {
        Box::pin(async move {
            Box::new(primitive::PrimitiveFlow::new(
                shape,
                crate::config::MotionConfig::default(),
                (init.width, init.height),
            )) as Box<dyn GraphicsFlow<(), DemoEvent>>
        }) as Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<(), DemoEvent>>>>>
    }))
}

/// Opens a window and runs the demo called `name` until it is closed.
pub fn run_demo(name: &str) -> anyhow::Result<()> {
    let constructor = constructor(name).ok_or_else(|| {
        anyhow::anyhow!("unknown demo '{}', expected one of {:?}", name, DEMO_NAMES)
    })?;
    let window = crate::config::WindowConfig {
        title: name.to_string(),
        ..Default::default()
    };
    crate::flow::run_with(window, vec![constructor])
}
