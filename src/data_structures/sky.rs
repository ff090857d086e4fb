//! Two-colour vertical sky gradient.
//!
//! [`SkyGradient::shade`] is the CPU reference of `pipelines/sky.wgsl`; both
//! compute `mix(bottom, top, clamp(pow(max(h + offset, 0), exponent), 0, 1))`
//! where `h` is the normalized height of the world-space view direction.

use cgmath::InnerSpace;

use crate::data_structures::material::Color;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyGradient {
    pub top: Color,
    pub bottom: Color,
    pub offset: f32,
    pub exponent: f32,
}

impl SkyGradient {
    pub fn new(top: Color, bottom: Color, offset: f32, exponent: f32) -> Self {
        Self {
            top,
            bottom,
            offset,
            exponent,
        }
    }

    /// Blend factor for a normalized height.
    pub fn weight(&self, h: f32) -> f32 {
        (h + self.offset).max(0.0).powf(self.exponent).clamp(0.0, 1.0)
    }

    /// Colour for a normalized height in `[-1, 1]`.
    pub fn shade(&self, h: f32) -> Color {
        self.bottom.lerp(&self.top, self.weight(h))
    }

    /// Colour seen along a world-space position on the dome.
    pub fn shade_direction(&self, world_position: cgmath::Vector3<f32>) -> Color {
        if world_position.magnitude2() == 0.0 {
            return self.bottom;
        }
        self.shade(world_position.normalize().y)
    }

    pub fn to_uniform(&self) -> SkyUniform {
        SkyUniform {
            top: self.top.to_vec4(1.0),
            bottom: self.bottom.to_vec4(1.0),
            params: [self.offset, self.exponent, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    pub top: [f32; 4],
    pub bottom: [f32; 4],
    /// x: offset, y: exponent
    pub params: [f32; 4],
}
