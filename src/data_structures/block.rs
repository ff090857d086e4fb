//! GPU mirror of a [`Scene`].
//!
//! Every drawable node (mesh, points, sky) gets a [`RenderBlock`]: its uploaded
//! geometry, a one-instance buffer with the node's world transform and the
//! bind group of its material. [`SceneBlocks::sync`] runs once per frame; it
//! creates blocks for new nodes, rewrites instance buffers whose transform
//! changed and rebuilds material groups whose `revision` moved (a texture
//! arrived, the emissive colour was replaced). Until a map is loaded the
//! material binds a 1x1 white texture. Skinned meshes also own a joint
//! palette that is rewritten every frame.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        material::{MaterialUniform, Side},
        model::Mesh,
        scene_graph::{Node, NodeHandle, NodeKind, Scene},
        texture::{Texture, create_default_sampler},
    },
    pipelines::{
        light::LightUniform,
        skin::{self, JointPaletteUniform},
        sky,
    },
    render::{Instanced, Render},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Solid(Side),
    Points,
    Sky,
}

pub struct RenderBlock {
    pub kind: BlockKind,
    pub mesh: Mesh,
    pub instance_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    map: Option<(Arc<image::RgbaImage>, Texture)>,
    revision: u64,
    instance: InstanceRaw,
    skin: Option<(wgpu::Buffer, wgpu::BindGroup)>,
}

impl RenderBlock {
    fn instanced(&self) -> Instanced<'_> {
        let side = match self.kind {
            BlockKind::Solid(side) => side,
            BlockKind::Points => Side::Double,
            BlockKind::Sky => Side::Back,
        };
        Instanced {
            instance: &self.instance_buffer,
            mesh: &self.mesh,
            material: &self.bind_group,
            amount: 1,
            side,
            skin: self.skin.as_ref().map(|(_, bind_group)| bind_group),
        }
    }
}

pub struct SceneBlocks {
    blocks: Vec<Option<RenderBlock>>,
    white: Texture,
    sampler: wgpu::Sampler,
}

impl SceneBlocks {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            blocks: Vec::new(),
            white: Texture::white(device, queue),
            sampler: create_default_sampler(device),
        }
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&RenderBlock> {
        self.blocks.get(handle.0).and_then(Option::as_ref)
    }

    /// Number of uploaded blocks.
    pub fn len(&self) -> usize {
        self.blocks.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Brings the GPU state in line with `scene` and uploads the scene lights.
    pub fn sync(&mut self, ctx: &Context, scene: &Scene) {
        let world = scene.world_transforms();
        if self.blocks.len() < scene.len() {
            self.blocks.resize_with(scene.len(), || None);
        }

        for (handle, node) in scene.iter() {
            let raw = world[handle.0].to_raw();
            match self.blocks[handle.0].as_mut() {
                Some(block) => {
                    if bytemuck::bytes_of(&block.instance) != bytemuck::bytes_of(&raw) {
                        ctx.queue
                            .write_buffer(&block.instance_buffer, 0, bytemuck::bytes_of(&raw));
                        block.instance = raw;
                    }
                    if let Some((buffer, _)) = &block.skin {
                        if let Some(palette) = scene.joint_palette(handle, &world) {
                            let uniform = JointPaletteUniform::from_matrices(&palette);
                            ctx.queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniform));
                        }
                    }
                    if let NodeKind::Mesh { material, .. } = &node.kind {
                        if material.revision != block.revision {
                            self.refresh_material(ctx, handle, material);
                        }
                    }
                }
                None => {
                    let label = node
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("node {}", handle.0));
                    let palette = scene.joint_palette(handle, &world);
                    self.blocks[handle.0] =
                        self.create_block(ctx, &label, node, raw, palette.as_deref());
                }
            }
        }

        let light = LightUniform::from_scene(scene, &world);
        ctx.queue
            .write_buffer(&ctx.light.buffer, 0, bytemuck::cast_slice(&[light]));
    }

    fn create_block(
        &self,
        ctx: &Context,
        label: &str,
        node: &Node,
        instance: InstanceRaw,
        palette: Option<&[cgmath::Matrix4<f32>]>,
    ) -> Option<RenderBlock> {
        let device = &ctx.device;
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::bytes_of(&instance),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let (kind, mesh, uniform_buffer, bind_group, map, revision) = match &node.kind {
            NodeKind::Mesh { geometry, material } => {
                let mesh = Mesh::from_geometry(device, label, geometry);
                let buffer = mk_material_buffer(device, material.to_uniform());
                let map = material
                    .map
                    .as_ref()
                    .and_then(|m| m.image.clone())
                    .map(|image| {
                        let texture = Texture::from_image(device, &ctx.queue, &image, Some(label));
                        (image, texture)
                    });
                let view = map.as_ref().map_or(&self.white.view, |(_, t)| &t.view);
                let bind_group = self.mk_material_bind_group(ctx, view, &buffer);
                (
                    BlockKind::Solid(material.side),
                    mesh,
                    buffer,
                    bind_group,
                    map,
                    material.revision,
                )
            }
            NodeKind::Points { geometry, material } => {
                let mesh = Mesh::from_geometry(device, label, &geometry.point_sprites());
                let buffer = mk_material_buffer(device, material.to_uniform());
                let bind_group = self.mk_material_bind_group(ctx, &self.white.view, &buffer);
                (BlockKind::Points, mesh, buffer, bind_group, None, 0)
            }
            NodeKind::Sky { geometry, gradient } => {
                let mesh = Mesh::from_geometry(device, label, geometry);
                let buffer = sky::mk_buffer(device, gradient.to_uniform());
                let bind_group = sky::mk_bind_group(device, &ctx.pipelines.sky_layout, &buffer);
                (BlockKind::Sky, mesh, buffer, bind_group, None, 0)
            }
            NodeKind::Group | NodeKind::Light(_) => return None,
        };
        let skin = match (kind, palette) {
            (BlockKind::Solid(_), Some(palette)) => {
                let buffer = skin::mk_buffer(device, &JointPaletteUniform::from_matrices(palette));
                let bind_group = skin::mk_bind_group(device, &ctx.pipelines.skin_layout, &buffer);
                Some((buffer, bind_group))
            }
            _ => None,
        };
        Some(RenderBlock {
            kind,
            mesh,
            instance_buffer,
            uniform_buffer,
            bind_group,
            map,
            revision,
            instance,
            skin,
        })
    }

    fn refresh_material(
        &mut self,
        ctx: &Context,
        handle: NodeHandle,
        material: &crate::data_structures::material::Material,
    ) {
        let image = material.map.as_ref().and_then(|m| m.image.clone());
        let Some(block) = self.blocks[handle.0].as_mut() else {
            return;
        };
        ctx.queue.write_buffer(
            &block.uniform_buffer,
            0,
            bytemuck::cast_slice(&[material.to_uniform()]),
        );
        block.revision = material.revision;

        let stale = match (&block.map, &image) {
            (Some((current, _)), Some(new)) => !Arc::ptr_eq(current, new),
            (None, None) => false,
            _ => true,
        };
        if !stale {
            return;
        }
        block.map = image.map(|image| {
            log::debug!("Uploading map of {}", block.mesh.name);
            let texture =
                Texture::from_image(&ctx.device, &ctx.queue, &image, Some(&block.mesh.name));
            (image, texture)
        });
        let view = block.map.as_ref().map_or(&self.white.view, |(_, t)| &t.view);
        block.bind_group = mk_material_bind_group(
            &ctx.device,
            &ctx.pipelines.material_layout,
            view,
            &self.sampler,
            &block.uniform_buffer,
        );
    }

    fn mk_material_bind_group(
        &self,
        ctx: &Context,
        view: &wgpu::TextureView,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        mk_material_bind_group(
            &ctx.device,
            &ctx.pipelines.material_layout,
            view,
            &self.sampler,
            buffer,
        )
    }

    /// Draw description of every uploaded block, in node order.
    pub fn render(&self) -> Render<'_> {
        let mut solids = Vec::new();
        let mut points = Vec::new();
        let mut renders = Vec::new();
        for block in self.blocks.iter().flatten() {
            match block.kind {
                BlockKind::Solid(_) => solids.push(block.instanced()),
                BlockKind::Points => points.push(block.instanced()),
                BlockKind::Sky => renders.push(Render::Sky(block.instanced())),
            }
        }
        renders.push(Render::Solids(solids));
        renders.push(Render::Points(points));
        Render::Composed(renders)
    }
}

fn mk_material_buffer(device: &wgpu::Device, uniform: MaterialUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Material Uniform Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn mk_material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.as_entire_binding(),
            },
        ],
        label: Some("material_bind_group"),
    })
}
