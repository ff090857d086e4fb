use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    scene_graph::{LightKind, Scene},
};

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

/// All scene lighting folded into one uniform: every ambient light is summed,
/// the first hemisphere, directional and point light are used, and the fog
/// rides along. Every field is a vec4 to satisfy uniform alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    /// w: intensity
    pub hemi_sky: [f32; 4],
    pub hemi_ground: [f32; 4],
    /// Direction the light travels in.
    pub dir_direction: [f32; 4],
    pub dir_color: [f32; 4],
    /// w is 1 when the scene has a point light.
    pub point_position: [f32; 4],
    pub point_color: [f32; 4],
    /// w: exp2 density, 0 disables fog
    pub fog: [f32; 4],
}

impl LightUniform {
    /// No lights and no fog: lit surfaces render black, unlit ones unchanged.
    pub fn dark() -> Self {
        bytemuck::Zeroable::zeroed()
    }

    /// `world` holds the world transform of every node, indexed by handle.
    pub fn from_scene(scene: &Scene, world: &[Instance]) -> Self {
        let mut uniform = Self::dark();
        let mut hemisphere = false;
        let mut directional = false;
        let mut point = false;
        for (handle, light) in scene.lights() {
            let position = world
                .get(handle.0)
                .map(|instance| instance.position())
                .unwrap_or(Vector3::new(0.0, 0.0, 0.0));
            let color = light.color.to_array().map(|c| c * light.intensity);
            match light.kind {
                LightKind::Ambient => {
                    for (sum, c) in uniform.ambient.iter_mut().zip(color) {
                        *sum += c;
                    }
                }
                LightKind::Hemisphere { ground } if !hemisphere => {
                    hemisphere = true;
                    uniform.hemi_sky = light.color.to_vec4(light.intensity);
                    uniform.hemi_ground = ground.to_vec4(0.0);
                }
                LightKind::Directional { target } if !directional => {
                    let direction = target - position;
                    if direction.magnitude2() > 0.0 {
                        directional = true;
                        let d = direction.normalize();
                        uniform.dir_direction = [d.x, d.y, d.z, 0.0];
                        uniform.dir_color = [color[0], color[1], color[2], 0.0];
                    }
                }
                LightKind::Point if !point => {
                    point = true;
                    uniform.point_position = [position.x, position.y, position.z, 1.0];
                    uniform.point_color = [color[0], color[1], color[2], 0.0];
                }
                _ => log::debug!("Ignoring additional light {:?}", handle),
            }
        }
        if let Some(fog) = scene.fog {
            uniform.fog = fog.color.to_vec4(fog.density);
        }
        uniform
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
