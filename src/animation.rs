//! Animation playback.
//!
//! An [`AnimationMixer`] is bound to the root node of one loaded model. Clips
//! are turned into actions whose channels are resolved once, by node name,
//! against the root's subtree. Every frame the mixer advances its actions by
//! the elapsed real time and writes the sampled values into the bound nodes'
//! local transforms.

use crate::{
    data_structures::scene_graph::{NodeHandle, Scene},
    resources::animation::{AnimationClip, Sample},
};

#[derive(Clone, Debug)]
pub struct ClipAction {
    clip: AnimationClip,
    bindings: Vec<Option<NodeHandle>>,
    time: f32,
    playing: bool,
    pub looping: bool,
}

impl ClipAction {
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Number of channels that found their target node.
    pub fn bound_channels(&self) -> usize {
        self.bindings.iter().filter(|b| b.is_some()).count()
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let duration = self.clip.duration;
        self.time += dt;
        if duration <= 0.0 {
            self.time = 0.0;
        } else if self.looping {
            self.time = self.time.rem_euclid(duration);
        } else if self.time >= duration {
            self.time = duration;
            self.playing = false;
        }
    }

    fn apply(&self, scene: &mut Scene) {
        for (channel, binding) in self.clip.channels.iter().zip(self.bindings.iter()) {
            let Some(handle) = binding else { continue };
            let Some(sample) = channel.sample(self.time) else {
                continue;
            };
            let Some(node) = scene.get_mut(*handle) else {
                continue;
            };
            match sample {
                Sample::Translation(position) => node.transform.position = position,
                Sample::Rotation(rotation) => node.transform.rotation = rotation.into(),
                Sample::Scale(scale) => node.transform.scale = scale,
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnimationMixer {
    root: NodeHandle,
    actions: Vec<ClipAction>,
}

impl AnimationMixer {
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            actions: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Binds `clip` to the mixer's subtree and returns the action index. The
    /// action is created stopped and looping.
    pub fn clip_action(&mut self, clip: AnimationClip, scene: &Scene) -> usize {
        let bindings: Vec<Option<NodeHandle>> = clip
            .channels
            .iter()
            .map(|channel| scene.find_in_subtree(self.root, &channel.target))
            .collect();
        let unbound = bindings.iter().filter(|b| b.is_none()).count();
        if unbound > 0 {
            log::warn!(
                "{} of {} channels of clip '{}' have no matching node",
                unbound,
                bindings.len(),
                clip.name
            );
        }
        self.actions.push(ClipAction {
            clip,
            bindings,
            time: 0.0,
            playing: false,
            looping: true,
        });
        self.actions.len() - 1
    }

    pub fn play(&mut self, action: usize) {
        if let Some(action) = self.actions.get_mut(action) {
            action.playing = true;
        }
    }

    pub fn stop(&mut self, action: usize) {
        if let Some(action) = self.actions.get_mut(action) {
            action.playing = false;
            action.time = 0.0;
        }
    }

    pub fn action(&self, action: usize) -> Option<&ClipAction> {
        self.actions.get(action)
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    /// Advances all playing actions by `dt` seconds and poses the bound nodes.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in self.actions.iter_mut().filter(|a| a.playing) {
            action.advance(dt);
            action.apply(scene);
        }
    }
}
