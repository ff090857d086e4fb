//! Render pipelines.
//!
//! - `basic` builds the solid (one per material side) and point pipelines
//!   sharing `solid.wgsl`
//! - `sky` holds the gradient dome pipeline and its uniform
//! - `light` folds scene lights and fog into the light uniform (group 2)
//! - `skin` holds the joint palette of skinned meshes (group 3)
//!
//! Bind group 0 is the material (or sky) group, 1 the camera, 2 the lights and
//! 3 the joint palette of the solids.

pub mod basic;
pub mod light;
pub mod skin;
pub mod sky;

use crate::{data_structures::material::Side, resources::texture::material_layout};

#[derive(Debug)]
pub struct Pipelines {
    pub solid_front: wgpu::RenderPipeline,
    pub solid_back: wgpu::RenderPipeline,
    pub solid_double: wgpu::RenderPipeline,
    pub points: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
    pub material_layout: wgpu::BindGroupLayout,
    pub sky_layout: wgpu::BindGroupLayout,
    pub skin_layout: wgpu::BindGroupLayout,
    /// Identity palette bound for rigid solids.
    pub rigid_skin: wgpu::BindGroup,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let material_layout = material_layout(device);
        let sky_layout = sky::mk_bind_group_layout(device);
        let skin_layout = skin::mk_bind_group_layout(device);
        let rigid_palette = skin::mk_buffer(device, &skin::JointPaletteUniform::identity());
        let rigid_skin = skin::mk_bind_group(device, &skin_layout, &rigid_palette);
        let solid = |side| {
            basic::mk_solid_pipeline(
                device,
                config,
                side,
                &material_layout,
                camera_bind_group_layout,
                light_bind_group_layout,
                &skin_layout,
            )
        };
        Self {
            solid_front: solid(Side::Front),
            solid_back: solid(Side::Back),
            solid_double: solid(Side::Double),
            points: basic::mk_points_pipeline(
                device,
                config,
                &material_layout,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            sky: sky::mk_sky_pipeline(device, config, &sky_layout, camera_bind_group_layout),
            material_layout,
            sky_layout,
            skin_layout,
            rigid_skin,
        }
    }

    pub fn solid(&self, side: Side) -> &wgpu::RenderPipeline {
        match side {
            Side::Front => &self.solid_front,
            Side::Back => &self.solid_back,
            Side::Double => &self.solid_double,
        }
    }
}
