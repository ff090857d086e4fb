//! CPU-side vertex data shared by primitives, imported models and the GPU mirror.

use cgmath::InnerSpace;

use crate::data_structures::model::ModelVertex;

/// Indexed triangle geometry.
///
/// `positions`, `normals` and `uvs` always have the same length. Point clouds
/// use the same data and simply ignore `indices`.
///
/// Skinned geometry also carries four joint indices and weights per vertex.
/// Both lists are empty for rigid geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub joints: Vec<[u32; 4]>,
    pub weights: Vec<[f32; 4]>,
}

impl Geometry {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            joints: Vec::new(),
            weights: Vec::new(),
        }
    }

    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty() && self.joints.len() == self.weights.len()
    }

    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        (self.positions.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Distance of the farthest vertex from the local origin.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| cgmath::Vector3::from(*p).magnitude())
            .fold(0.0, f32::max)
    }

    /// Expands every vertex into a quad of four corners sharing its position.
    ///
    /// The corner is stored in the uv as `(±1, ±1)`; the points shader offsets
    /// it in clip space so each point faces the camera.
    pub fn point_sprites(&self) -> Geometry {
        const CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
        let mut sprites = Geometry::with_capacity(self.vertex_count() * 4, self.vertex_count() * 6);
        for (position, normal) in self.positions.iter().zip(self.normals.iter()) {
            let first = sprites.vertex_count() as u32;
            for corner in CORNERS {
                sprites.push_vertex(*position, *normal, corner);
            }
            sprites.push_triangle(first, first + 1, first + 2);
            sprites.push_triangle(first, first + 2, first + 3);
        }
        sprites
    }

    /// Rigid vertices get zero weights, which the shader treats as unskinned.
    pub fn to_vertices(&self) -> Vec<ModelVertex> {
        let skinned = self.is_skinned();
        self.positions
            .iter()
            .zip(self.normals.iter())
            .zip(self.uvs.iter())
            .enumerate()
            .map(|(i, ((position, normal), tex_coords))| ModelVertex {
                position: *position,
                tex_coords: *tex_coords,
                normal: *normal,
                joints: if skinned { self.joints[i] } else { [0; 4] },
                weights: if skinned { self.weights[i] } else { [0.0; 4] },
            })
            .collect()
    }
}
