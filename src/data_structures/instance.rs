//! Instance transformation data for GPU rendering.
//!
//! Scene nodes keep an editable [`Transform`] (Euler rotation, so per-axis spin
//! and slider bindings stay exact) and compose world transforms as
//! [`Instance`] matrices. An instance is packed into an [`InstanceRaw`] for the
//! vertex shader.

use std::ops::Mul;

use cgmath::{InnerSpace, Matrix, One, Rad, SquareMatrix, Transform as _};

use crate::data_structures::model;

/// Editable local transform of a scene node.
///
/// `rotation` is stored as Euler angles in radians so that per-frame spin
/// increments and panel bindings address a single axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Euler<Rad<f32>>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(position: cgmath::Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(cgmath::Quaternion::from(self.rotation))
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_instance(&self) -> Instance {
        Instance::from(self.to_matrix())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// World transformation of one node.
///
/// Composed parent-first as a full affine matrix (`parent * local`), so a
/// rotated child under a non-uniformly scaled parent keeps its shear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub model: cgmath::Matrix4<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            model: cgmath::Matrix4::one(),
        }
    }

    pub fn position(&self) -> cgmath::Vector3<f32> {
        self.model.w.truncate()
    }

    pub fn transform_point(&self, point: cgmath::Point3<f32>) -> cgmath::Point3<f32> {
        self.model.transform_point(point)
    }

    /// Length of the longest basis vector, i.e. the largest stretch the
    /// transform applies to any axis.
    pub fn max_scale(&self) -> f32 {
        self.model
            .x
            .truncate()
            .magnitude()
            .max(self.model.y.truncate().magnitude())
            .max(self.model.z.truncate().magnitude())
    }

    /// Inverse transpose of the upper 3x3. Falls back to the plain 3x3 for
    /// degenerate (zero scale) transforms.
    pub fn normal_matrix(&self) -> cgmath::Matrix3<f32> {
        let linear = cgmath::Matrix3::from_cols(
            self.model.x.truncate(),
            self.model.y.truncate(),
            self.model.z.truncate(),
        );
        linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.model.into(),
            normal: self.normal_matrix().into(),
        }
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        Instance {
            model: self.model * rhs.model,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Matrix4<f32>> for Instance {
    fn from(model: cgmath::Matrix4<f32>) -> Self {
        Instance { model }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            model: cgmath::Matrix4::from_translation(position),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to:
 *
 * offset: zero as we want to use the full space.
 * stride: length of a vertex
 *
 * Stride layout here: position + rotation + scale as 4x4 matrix (hence the four 4d vectors)
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders only advance to the next instance when a new instance starts
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix as 3x3
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
