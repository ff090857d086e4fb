//! Asynchronous model loading as an explicit state machine.
//!
//! ```text
//! Pending --mesh ok--> MeshReady --clip ok--> Animated
//!    |                     |
//!    +--mesh err--> Failed +--clip err--> Failed (model stays in the scene)
//! ```
//!
//! The loader itself performs no I/O. [`AssetLoader::request`] queues a
//! [`LoadJob`]; the owner drains the jobs, resolves them with
//! [`crate::resources::load_model`] on whatever executor the platform offers
//! and feeds the results back through `on_mesh_loaded`/`on_animation_loaded`.
//! There are no retries, no timeouts and no cancellation.

use crate::{
    animation::AnimationMixer,
    data_structures::{
        instance::Transform,
        material::Color,
        scene_graph::{Node, NodeHandle, Scene},
    },
    resources::ImportedModel,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

/// What to load and how to place it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    /// Directory below the asset root, including the trailing slash.
    pub base: String,
    pub model: String,
    pub animation: Option<String>,
    pub position: cgmath::Vector3<f32>,
    pub scale: cgmath::Vector3<f32>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    /// Emissive colour forced onto every mesh of the model.
    pub emissive: Option<Color>,
}

impl LoadRequest {
    pub fn new(base: &str, model: &str) -> Self {
        Self {
            base: base.to_string(),
            model: model.to_string(),
            animation: None,
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
            cast_shadow: false,
            receive_shadow: false,
            emissive: None,
        }
    }

    pub fn with_animation(mut self, animation: &str) -> Self {
        self.animation = Some(animation.to_string());
        self
    }

    pub fn at(mut self, position: cgmath::Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = cgmath::Vector3::new(scale, scale, scale);
        self
    }

    pub fn with_scale(mut self, scale: cgmath::Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn with_emissive(mut self, emissive: Color) -> Self {
        self.emissive = Some(emissive);
        self
    }

    pub fn model_path(&self) -> String {
        format!("{}{}", self.base, self.model)
    }

    pub fn animation_path(&self) -> Option<String> {
        self.animation
            .as_ref()
            .map(|animation| format!("{}{}", self.base, animation))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Pending,
    /// The model is in the scene; an animation may still be loading.
    MeshReady { node: NodeHandle },
    Animated { node: NodeHandle, mixer: usize },
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadJob {
    Mesh { task: TaskId, path: String },
    Animation { task: TaskId, path: String },
}

#[derive(Debug, Default)]
pub struct AssetLoader {
    tasks: Vec<(LoadRequest, LoadState)>,
    outbox: Vec<LoadJob>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, request: LoadRequest) -> TaskId {
        let task = TaskId(self.tasks.len());
        self.outbox.push(LoadJob::Mesh {
            task,
            path: request.model_path(),
        });
        self.tasks.push((request, LoadState::Pending));
        task
    }

    /// Takes all jobs queued since the last call.
    pub fn drain_jobs(&mut self) -> Vec<LoadJob> {
        std::mem::take(&mut self.outbox)
    }

    pub fn state(&self, task: TaskId) -> Option<&LoadState> {
        self.tasks.get(task.0).map(|(_, state)| state)
    }

    pub fn request_of(&self, task: TaskId) -> Option<&LoadRequest> {
        self.tasks.get(task.0).map(|(request, _)| request)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks still waiting for their mesh.
    pub fn pending(&self) -> usize {
        self.tasks
            .iter()
            .filter(|(_, state)| *state == LoadState::Pending)
            .count()
    }

    fn set_state(&mut self, task: TaskId, state: LoadState) {
        if let Some((_, current)) = self.tasks.get_mut(task.0) {
            *current = state;
        }
    }

    /// Inserts the loaded model under a root carrying the requested placement.
    /// Queues the animation job if one was requested.
    pub fn on_mesh_loaded(
        &mut self,
        task: TaskId,
        result: anyhow::Result<ImportedModel>,
        scene: &mut Scene,
    ) -> Option<NodeHandle> {
        let Some((request, state)) = self.tasks.get(task.0) else {
            log::warn!("Mesh result for unknown task {:?}", task);
            return None;
        };
        if *state != LoadState::Pending {
            log::warn!("Mesh result for task {:?} arrived twice", task);
            return None;
        }
        let request = request.clone();
        let model = match result {
            Ok(model) => model,
            Err(e) => {
                log::warn!("Could not load model {}: {:#}", request.model_path(), e);
                self.set_state(task, LoadState::Failed(format!("{:#}", e)));
                return None;
            }
        };

        let root = Node::group().named(&request.model).with_transform(Transform {
            position: request.position,
            scale: request.scale,
            ..Transform::new()
        });
        let node = model.instantiate(scene, root);
        scene.set_shadow_flags(node, request.cast_shadow, request.receive_shadow);
        if let Some(emissive) = request.emissive {
            scene.set_emissive(node, emissive);
        }
        log::info!(
            "Loaded {} ({} meshes, {} clips)",
            request.model_path(),
            model.mesh_count(),
            model.clips.len()
        );

        if let Some(path) = request.animation_path() {
            self.outbox.push(LoadJob::Animation { task, path });
        }
        self.set_state(task, LoadState::MeshReady { node });
        Some(node)
    }

    /// Binds the first clip of the loaded animation file to the task's model
    /// and starts it looping in a new mixer pushed to `mixers`.
    pub fn on_animation_loaded(
        &mut self,
        task: TaskId,
        result: anyhow::Result<ImportedModel>,
        scene: &mut Scene,
        mixers: &mut Vec<AnimationMixer>,
    ) -> Option<usize> {
        let node = match self.state(task) {
            Some(LoadState::MeshReady { node }) => *node,
            other => {
                log::warn!("Animation result for task {:?} in state {:?}", task, other);
                return None;
            }
        };
        let path = self
            .request_of(task)
            .and_then(LoadRequest::animation_path)
            .unwrap_or_default();
        let clip = match result {
            Ok(animation) => animation.clips.into_iter().next(),
            Err(e) => {
                log::warn!("Could not load animation {}: {:#}", path, e);
                self.set_state(task, LoadState::Failed(format!("{:#}", e)));
                return None;
            }
        };
        let Some(clip) = clip else {
            log::warn!("Animation file {} contains no clips", path);
            self.set_state(task, LoadState::Failed(format!("{} contains no clips", path)));
            return None;
        };

        let mut mixer = AnimationMixer::new(node);
        let action = mixer.clip_action(clip, scene);
        mixer.play(action);
        mixers.push(mixer);
        let mixer = mixers.len() - 1;
        self.set_state(task, LoadState::Animated { node, mixer });
        Some(mixer)
    }
}
