//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn with a [`Render`] tree. The engine
//! flattens the trees of all flows into one batch per pipeline and draws the
//! batches in a fixed order: sky, solids (grouped by material side), points.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the enum returned from `GraphicsFlow::on_render`
//! - [`Instanced<'a>`] references an uploaded mesh, its material bind group
//!   and an instance buffer
//!

use crate::data_structures::{material::Side, model::Mesh};

/// Everything needed for one instanced draw call.
#[derive(Clone, Copy)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    /// Material group (or sky group for the dome).
    pub material: &'a wgpu::BindGroup,
    pub amount: usize,
    pub side: Side,
    /// Joint palette group of skinned solids.
    pub skin: Option<&'a wgpu::BindGroup>,
}

/// Specifies how a flow's objects should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Solid(Instanced)` renders a single lit mesh
/// - `Solids(Vec<Instanced>)` renders a batch of lit meshes
/// - `Points(Vec<Instanced>)` renders the vertices of meshes as point clouds
/// - `Sky(Instanced)` renders a gradient dome behind everything else
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
///
pub enum Render<'a> {
    None,
    Solid(Instanced<'a>),
    Solids(Vec<Instanced<'a>>),
    Points(Vec<Instanced<'a>>),
    Sky(Instanced<'a>),
    Composed(Vec<Render<'a>>),
}

/// Draw lists filled from the render trees of all flows.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub skies: Vec<Instanced<'a>>,
    pub front: Vec<Instanced<'a>>,
    pub back: Vec<Instanced<'a>>,
    pub double: Vec<Instanced<'a>>,
    pub points: Vec<Instanced<'a>>,
}

impl<'a> Batches<'a> {
    fn push_solid(&mut self, instanced: Instanced<'a>) {
        match instanced.side {
            Side::Front => self.front.push(instanced),
            Side::Back => self.back.push(instanced),
            Side::Double => self.double.push(instanced),
        }
    }

    pub fn len(&self) -> usize {
        self.skies.len()
            + self.front.len()
            + self.back.len()
            + self.double.len()
            + self.points.len()
    }
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Solid(instanced) => batches.push_solid(instanced),
            Render::Solids(vec) => vec.into_iter().for_each(|i| batches.push_solid(i)),
            Render::Points(mut vec) => batches.points.append(&mut vec),
            Render::Sky(instanced) => batches.skies.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }
}
