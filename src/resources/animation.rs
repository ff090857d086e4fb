//! Keyframe animation clips and their glTF import.
//!
//! A clip is a set of channels; every channel animates one property of one
//! node, identified by node name so that clips shipped in a separate file can
//! be bound to an already loaded model.

use cgmath::{InnerSpace, VectorSpace};

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

/// A sampled value of a single channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    Translation(cgmath::Vector3<f32>),
    Rotation(cgmath::Quaternion<f32>),
    Scale(cgmath::Vector3<f32>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub target: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

impl Channel {
    /// Linear (spherical for rotations) interpolation between the keyframes
    /// around `time`. Times outside the keyed range clamp to the first/last key.
    pub fn sample(&self, time: f32) -> Option<Sample> {
        let (a, b, t) = self.segment(time)?;
        match &self.keyframes {
            Keyframes::Translation(values) => Some(Sample::Translation(
                values.get(a)?.lerp(*values.get(b)?, t),
            )),
            Keyframes::Rotation(values) => {
                let from = *values.get(a)?;
                let to = *values.get(b)?;
                // take the short way around
                let to = if from.dot(to) < 0.0 { -to } else { to };
                Some(Sample::Rotation(from.nlerp(to, t).normalize()))
            }
            Keyframes::Scale(values) => {
                Some(Sample::Scale(values.get(a)?.lerp(*values.get(b)?, t)))
            }
            Keyframes::Other => None,
        }
    }

    fn segment(&self, time: f32) -> Option<(usize, usize, f32)> {
        let first = *self.timestamps.first()?;
        let last = *self.timestamps.last()?;
        if self.timestamps.len() == 1 || time <= first {
            return Some((0, 0, 0.0));
        }
        if time >= last {
            let end = self.timestamps.len() - 1;
            return Some((end, end, 0.0));
        }
        let b = self.timestamps.partition_point(|&ts| ts <= time);
        let a = b - 1;
        let span = self.timestamps[b] - self.timestamps[a];
        let t = if span > 0.0 {
            (time - self.timestamps[a]) / span
        } else {
            0.0
        };
        Some((a, b, t))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: &str, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|c| c.timestamps.last().copied())
            .fold(0.0, f32::max);
        Self {
            name: name.to_string(),
            channels,
            duration,
        }
    }
}

/// Name under which an imported node is stored; unnamed nodes get `#<index>`.
pub fn node_name(node: &gltf::Node) -> String {
    match node.name() {
        Some(name) => name.to_string(),
        None => format!("#{}", node.index()),
    }
}

pub fn load_clips(gltf: &gltf::Document, buffer_data: &[Vec<u8>]) -> Vec<AnimationClip> {
    gltf.animations()
        .enumerate()
        .map(|(idx, animation)| {
            let channels = animation
                .channels()
                .filter_map(|channel| {
                    let reader =
                        channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
                    let timestamps: Vec<f32> = match reader.read_inputs() {
                        Some(times) => times.collect(),
                        None => {
                            log::warn!("No keyframe times found in channel {}", channel.index());
                            return None;
                        }
                    };
                    let keyframes = match reader.read_outputs() {
                        Some(gltf::animation::util::ReadOutputs::Translations(t)) => {
                            Keyframes::Translation(t.map(Into::into).collect())
                        }
                        Some(gltf::animation::util::ReadOutputs::Rotations(r)) => {
                            Keyframes::Rotation(
                                r.into_f32()
                                    // glTF stores quaternions as [x, y, z, w]
                                    .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                                    .collect(),
                            )
                        }
                        Some(gltf::animation::util::ReadOutputs::Scales(s)) => {
                            Keyframes::Scale(s.map(Into::into).collect())
                        }
                        Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => {
                            Keyframes::Other
                        }
                        None => {
                            log::warn!("No keyframes found in channel {}", channel.index());
                            return None;
                        }
                    };
                    Some(Channel {
                        target: node_name(&channel.target().node()),
                        keyframes,
                        timestamps,
                    })
                })
                .collect();
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("clip{}", idx));
            AnimationClip::new(&name, channels)
        })
        .collect()
}
