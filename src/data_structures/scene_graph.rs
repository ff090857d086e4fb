//! Scene graph and hierarchical scene organization.
//!
//! The scene is an arena of [`Node`]s addressed by [`NodeHandle`]. Nodes are
//! never removed, so a handle stays valid for the whole session. Each node
//! carries a local [`Transform`]; world transforms are composed parent-first
//! when they are needed (rendering, light upload, picking).

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::{
    geometry::Geometry,
    instance::{Instance, Transform},
    material::{Color, Material, PointsMaterial},
    sky::SkyGradient,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub usize);

/// Orthographic frustum and map parameters of a shadow casting light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCamera {
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub bias: f32,
    pub map_size: u32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            near: 0.5,
            far: 500.0,
            left: -5.0,
            right: 5.0,
            top: 5.0,
            bottom: -5.0,
            bias: 0.0,
            map_size: 512,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Emits from the node's world position.
    Point,
    /// Shines from the node's world position towards `target`.
    Directional { target: cgmath::Vector3<f32> },
    Ambient,
    /// Sky colour from above, `ground` colour from below.
    Hemisphere { ground: Color },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow: Option<ShadowCamera>,
}

impl Light {
    pub fn new(kind: LightKind, color: Color, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            cast_shadow: false,
            shadow: None,
        }
    }

    pub fn point(color: Color, intensity: f32) -> Self {
        Self::new(LightKind::Point, color, intensity)
    }

    pub fn directional(color: Color, intensity: f32, target: cgmath::Vector3<f32>) -> Self {
        Self::new(LightKind::Directional { target }, color, intensity)
    }

    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self::new(LightKind::Ambient, color, intensity)
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Self::new(LightKind::Hemisphere { ground }, sky, intensity)
    }

    pub fn with_shadow(mut self, shadow: ShadowCamera) -> Self {
        self.cast_shadow = true;
        self.shadow = Some(shadow);
        self
    }
}

/// Joints deforming a skinned mesh, in palette order, with the inverse bind
/// matrix of each joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Skin {
    pub joints: Vec<NodeHandle>,
    pub inverse_bind: Vec<Matrix4<f32>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: Arc<Geometry>,
        material: Material,
    },
    Points {
        geometry: Arc<Geometry>,
        material: PointsMaterial,
    },
    Sky {
        geometry: Arc<Geometry>,
        gradient: SkyGradient,
    },
    Light(Light),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub kind: NodeKind,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    /// Set on skinned meshes only.
    pub skin: Option<Arc<Skin>>,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform::new(),
            kind,
            cast_shadow: false,
            receive_shadow: false,
            skin: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn mesh(geometry: Geometry, material: Material) -> Self {
        Self::new(NodeKind::Mesh {
            geometry: Arc::new(geometry),
            material,
        })
    }

    pub fn shared_mesh(geometry: Arc<Geometry>, material: Material) -> Self {
        Self::new(NodeKind::Mesh { geometry, material })
    }

    pub fn points(geometry: Geometry, material: PointsMaterial) -> Self {
        Self::new(NodeKind::Points {
            geometry: Arc::new(geometry),
            material,
        })
    }

    pub fn sky(geometry: Geometry, gradient: SkyGradient) -> Self {
        Self::new(NodeKind::Sky {
            geometry: Arc::new(geometry),
            gradient,
        })
    }

    pub fn light(light: Light) -> Self {
        let cast_shadow = light.cast_shadow;
        Self {
            cast_shadow,
            ..Self::new(NodeKind::Light(light))
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn at(mut self, position: cgmath::Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }

    pub fn casting_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast;
        self
    }

    pub fn with_skin(mut self, skin: Arc<Skin>) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn receiving_shadow(mut self, receive: bool) -> Self {
        self.receive_shadow = receive;
        self
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn geometry(&self) -> Option<&Arc<Geometry>> {
        match &self.kind {
            NodeKind::Mesh { geometry, .. }
            | NodeKind::Points { geometry, .. }
            | NodeKind::Sky { geometry, .. } => Some(geometry),
            NodeKind::Group | NodeKind::Light(_) => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }
}

/// Exponential squared fog: `factor = 1 - exp(-(density * depth)^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    pub fn new(color: Color, density: f32) -> Self {
        Self { color, density }
    }

    pub fn factor(&self, depth: f32) -> f32 {
        let d = self.density * depth;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeHandle>,
    pub background: Color,
    pub fog: Option<Fog>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            background: Color::BLACK,
            fog: None,
        }
    }

    /// Inserts `node` at the top level.
    pub fn add(&mut self, mut node: Node) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        self.roots.push(handle);
        handle
    }

    /// Inserts `node` below `parent`. Falls back to the top level if the
    /// parent handle is unknown.
    pub fn add_child(&mut self, parent: NodeHandle, mut node: Node) -> NodeHandle {
        if parent.0 >= self.nodes.len() {
            log::warn!("Parent node {:?} does not exist, adding to the root", parent);
            return self.add(node);
        }
        let handle = NodeHandle(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(handle);
        handle
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeHandle(i), node))
    }

    /// First node in insertion order carrying `name`.
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.iter()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(handle, _)| handle)
    }

    /// `root` followed by all of its descendants, depth first.
    pub fn subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            if let Some(node) = self.get(handle) {
                out.push(handle);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn find_in_subtree(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.subtree(root)
            .into_iter()
            .find(|h| self.nodes[h.0].name.as_deref() == Some(name))
    }

    pub fn world_transform(&self, handle: NodeHandle) -> Option<Instance> {
        let mut node = self.get(handle)?;
        let mut world = node.transform.to_instance();
        while let Some(parent) = node.parent {
            node = self.get(parent)?;
            world = &node.transform.to_instance() * &world;
        }
        Some(world)
    }

    /// World transforms of all nodes, indexed by handle.
    pub fn world_transforms(&self) -> Vec<Instance> {
        let mut world = vec![Instance::new(); self.nodes.len()];
        let mut stack: Vec<(NodeHandle, Instance)> = self
            .roots
            .iter()
            .map(|root| (*root, Instance::new()))
            .collect();
        while let Some((handle, parent)) = stack.pop() {
            let node = &self.nodes[handle.0];
            let own = &parent * &node.transform.to_instance();
            world[handle.0] = own;
            stack.extend(node.children.iter().map(|child| (*child, own)));
        }
        world
    }

    /// Joint matrices of the skinned mesh `handle` in the mesh's own space:
    /// `inverse(world(mesh)) * world(joint) * inverse_bind`. `world` comes
    /// from [`Scene::world_transforms`].
    pub fn joint_palette(
        &self,
        handle: NodeHandle,
        world: &[Instance],
    ) -> Option<Vec<Matrix4<f32>>> {
        let skin = self.get(handle)?.skin.as_ref()?;
        let to_mesh = world
            .get(handle.0)?
            .model
            .invert()
            .unwrap_or_else(Matrix4::identity);
        let palette = skin
            .joints
            .iter()
            .enumerate()
            .map(|(i, joint)| {
                let joint_world = world.get(joint.0).map_or_else(Matrix4::identity, |w| w.model);
                let inverse_bind = skin
                    .inverse_bind
                    .get(i)
                    .copied()
                    .unwrap_or_else(Matrix4::identity);
                to_mesh * joint_world * inverse_bind
            })
            .collect();
        Some(palette)
    }

    pub fn lights(&self) -> impl Iterator<Item = (NodeHandle, &Light)> {
        self.iter().filter_map(|(handle, node)| match &node.kind {
            NodeKind::Light(light) => Some((handle, light)),
            _ => None,
        })
    }

    pub fn set_shadow_flags(&mut self, root: NodeHandle, cast: bool, receive: bool) {
        for handle in self.subtree(root) {
            let node = &mut self.nodes[handle.0];
            node.cast_shadow = cast;
            node.receive_shadow = receive;
        }
    }

    pub fn set_emissive(&mut self, root: NodeHandle, emissive: Color) {
        for handle in self.subtree(root) {
            if let Some(material) = self.nodes[handle.0].material_mut() {
                material.set_emissive(emissive);
            }
        }
    }

    /// Applies a decoded texture to every material in the scene that maps `path`.
    pub fn apply_texture(&mut self, path: &str, image: Arc<image::RgbaImage>) -> usize {
        let mut applied = 0;
        for node in self.nodes.iter_mut() {
            if let Some(material) = node.material_mut() {
                let matches = material.map.as_ref().is_some_and(|map| map.path == path);
                if matches && material.apply_texture(image.clone()) {
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Paths of all texture maps that have not been loaded yet.
    pub fn pending_textures(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Mesh { material, .. } => material.map.as_ref(),
                _ => None,
            })
            .filter(|map| !map.is_loaded())
            .map(|map| map.path.clone())
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
