//! Joint palette of skinned meshes (bind group 3 of the solid pipelines).
//!
//! WebGL2 has no storage buffers in vertex shaders, so the palette is a
//! fixed size uniform array. Rigid meshes bind a palette of identities and
//! carry zero weights.

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

/// Joints beyond this count keep their rest pose.
pub const MAX_JOINTS: usize = 64;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct JointPaletteUniform {
    matrices: [[[f32; 4]; 4]; MAX_JOINTS],
}

impl JointPaletteUniform {
    pub fn identity() -> Self {
        Self {
            matrices: [Matrix4::identity().into(); MAX_JOINTS],
        }
    }

    /// Packs `palette` and fills the unused slots with identities.
    pub fn from_matrices(palette: &[Matrix4<f32>]) -> Self {
        if palette.len() > MAX_JOINTS {
            log::warn!("Skin has {} joints, only {} are animated", palette.len(), MAX_JOINTS);
        }
        let mut uniform = Self::identity();
        for (slot, matrix) in uniform.matrices.iter_mut().zip(palette) {
            *slot = (*matrix).into();
        }
        uniform
    }

    pub fn matrix(&self, joint: usize) -> Option<Matrix4<f32>> {
        self.matrices.get(joint).map(|m| (*m).into())
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("skin_bind_group_layout"),
    })
}

pub fn mk_buffer(device: &wgpu::Device, uniform: &JointPaletteUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Joint Palette Buffer"),
        contents: bytemuck::bytes_of(uniform),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("skin_bind_group"),
    })
}
