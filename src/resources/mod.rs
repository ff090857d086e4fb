use std::{
    io::{BufReader, Cursor},
    sync::Arc,
};

use anyhow::Context as _;

use crate::{
    data_structures::{
        geometry::Geometry,
        instance::Transform,
        material::{Color, Material, TextureMap},
        scene_graph::{Node, NodeHandle, Scene, Skin},
        texture::Texture,
    },
    resources::{
        animation::{AnimationClip, load_clips, node_name},
        texture::{load_binary, load_string},
    },
};

/**
 * This module contains all logic for loading mesh/textures/etc. from external files.
 *
 * Imports produce CPU-side [`ImportedModel`]s; nothing here touches the GPU, so
 * loads can resolve on any executor and are turned into scene nodes by the
 * asset loader.
 */
pub mod animation;
pub mod loader;
pub mod mesh;
pub mod primitives;
pub mod texture;

/// One node of an imported hierarchy. A node may carry several meshes (one
/// per glTF primitive); `skin` indexes [`ImportedModel::skins`] and applies
/// to all of them.
#[derive(Clone, Debug, Default)]
pub struct ImportedNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub meshes: Vec<(Arc<Geometry>, Material)>,
    pub children: Vec<usize>,
    pub skin: Option<usize>,
}

/// Joint node indices and their inverse bind matrices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedSkin {
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<cgmath::Matrix4<f32>>,
}

#[derive(Clone, Debug, Default)]
pub struct ImportedModel {
    pub nodes: Vec<ImportedNode>,
    pub roots: Vec<usize>,
    pub clips: Vec<AnimationClip>,
    pub skins: Vec<ImportedSkin>,
}

impl ImportedModel {
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().map(|n| n.meshes.len()).sum()
    }

    /// Adds the hierarchy to `scene` below a new root node and returns the root.
    /// Skinned meshes are bound to the instantiated joint nodes.
    pub fn instantiate(&self, scene: &mut Scene, root: Node) -> NodeHandle {
        let root = scene.add(root);
        let mut handles: Vec<Option<NodeHandle>> = vec![None; self.nodes.len()];
        let mut skinned: Vec<(NodeHandle, usize)> = Vec::new();
        let mut stack: Vec<(usize, NodeHandle)> =
            self.roots.iter().rev().map(|idx| (*idx, root)).collect();
        while let Some((idx, parent)) = stack.pop() {
            let Some(imported) = self.nodes.get(idx) else {
                log::warn!("Imported node {} does not exist", idx);
                continue;
            };
            let mut node = Node::group().with_transform(imported.transform);
            node.name = imported.name.clone();
            let handle = scene.add_child(parent, node);
            handles[idx] = Some(handle);
            for (geometry, material) in &imported.meshes {
                let mesh = Node::shared_mesh(geometry.clone(), material.clone());
                let mesh = scene.add_child(handle, mesh);
                if let Some(skin) = imported.skin {
                    skinned.push((mesh, skin));
                }
            }
            stack.extend(imported.children.iter().rev().map(|child| (*child, handle)));
        }

        let skins: Vec<Option<Arc<Skin>>> = self
            .skins
            .iter()
            .map(|skin| {
                let joints: Option<Vec<NodeHandle>> = skin
                    .joints
                    .iter()
                    .map(|joint| handles.get(*joint).copied().flatten())
                    .collect();
                match joints {
                    Some(joints) => Some(Arc::new(Skin {
                        joints,
                        inverse_bind: skin.inverse_bind.clone(),
                    })),
                    None => {
                        log::warn!("Skin references joints outside the instantiated scene");
                        None
                    }
                }
            })
            .collect();
        for (mesh, skin) in skinned {
            let skin = skins.get(skin).cloned().flatten();
            if let (Some(node), Some(skin)) = (scene.get_mut(mesh), skin) {
                node.skin = Some(skin);
            }
        }
        root
    }
}

fn directory_of(file_name: &str) -> &str {
    match file_name.rfind('/') {
        Some(idx) => &file_name[..=idx],
        None => "",
    }
}

fn extension_of(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Loads a model file (`.glb`, `.gltf` or `.obj`) relative to the asset root.
pub async fn load_model(file_name: &str) -> anyhow::Result<ImportedModel> {
    match extension_of(file_name).as_str() {
        "glb" | "gltf" => load_model_gltf(file_name).await,
        "obj" => load_model_obj(file_name).await,
        other => anyhow::bail!("unsupported model format '{}' ({})", other, file_name),
    }
}

pub async fn load_model_obj(file_name: &str) -> anyhow::Result<ImportedModel> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));
    let dir = directory_of(file_name).to_string();

    let (models, obj_materials) =
        tobj::load_obj_buf_async(&mut obj_reader, &mesh::load_options(), |p| {
            let path = format!("{}{}", dir, p);
            async move {
                match load_string(&path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("Material file {} could not be loaded: {}", path, e);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        })
        .await
        .with_context(|| format!("parsing {}", file_name))?;
    let materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("{} references no usable materials: {}", file_name, e);
        Vec::new()
    });
    Ok(mesh::to_imported_model(file_name, &models, &materials, &dir))
}

pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<ImportedModel> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)
        .with_context(|| format!("parsing {}", file_name))?;
    let dir = directory_of(file_name);

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                buffer_data.push(gltf.blob.clone().unwrap_or_default());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&format!("{}{}", dir, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    import_gltf(&gltf.document, &buffer_data, dir)
}

/// Converts a parsed glTF document with resolved buffers. Embedded images are
/// decoded right away, external ones are left for the texture fetch.
pub fn import_gltf(
    document: &gltf::Document,
    buffer_data: &[Vec<u8>],
    dir: &str,
) -> anyhow::Result<ImportedModel> {
    let materials: Vec<Material> = document
        .materials()
        .map(|material| to_material(&material, buffer_data, dir))
        .collect();

    let mut imported = ImportedModel {
        nodes: Vec::with_capacity(document.nodes().len()),
        roots: Vec::new(),
        clips: load_clips(document, buffer_data),
        skins: document
            .skins()
            .map(|skin| to_skin(&skin, buffer_data))
            .collect(),
    };
    for node in document.nodes() {
        let (translation, rotation, scale) = node.transform().decomposed();
        let [x, y, z, w] = rotation;
        let meshes = match node.mesh() {
            Some(mesh) => mesh
                .primitives()
                .filter_map(|primitive| {
                    let geometry = to_geometry(&primitive, buffer_data)?;
                    let material = primitive
                        .material()
                        .index()
                        .and_then(|idx| materials.get(idx).cloned())
                        .unwrap_or_default();
                    Some((Arc::new(geometry), material))
                })
                .collect(),
            None => Vec::new(),
        };
        imported.nodes.push(ImportedNode {
            name: Some(node_name(&node)),
            transform: Transform {
                position: translation.into(),
                rotation: cgmath::Quaternion::new(w, x, y, z).into(),
                scale: scale.into(),
            },
            meshes,
            children: node.children().map(|child| child.index()).collect(),
            skin: node.skin().map(|skin| skin.index()),
        });
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF file contains no scene")?;
    imported.roots = scene.nodes().map(|node| node.index()).collect();
    Ok(imported)
}

fn to_geometry(primitive: &gltf::Primitive, buffer_data: &[Vec<u8>]) -> Option<Geometry> {
    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let count = positions.len();
    let mut normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    normals.resize(count, [0.0, 1.0, 0.0]);
    let mut uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    uvs.resize(count, [0.0, 0.0]);
    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..count as u32).collect(),
    };
    let (joints, weights) = match (reader.read_joints(0), reader.read_weights(0)) {
        (Some(joints), Some(weights)) => {
            let joints: Vec<[u32; 4]> = joints
                .into_u16()
                .map(|[a, b, c, d]| [a as u32, b as u32, c as u32, d as u32])
                .collect();
            let weights: Vec<[f32; 4]> = weights.into_f32().collect();
            if joints.len() == count && weights.len() == count {
                (joints, weights)
            } else {
                log::warn!("Skin attributes do not cover every vertex, drawing rigid");
                (Vec::new(), Vec::new())
            }
        }
        _ => (Vec::new(), Vec::new()),
    };
    Some(Geometry {
        positions,
        normals,
        uvs,
        indices,
        joints,
        weights,
    })
}

fn to_skin(skin: &gltf::Skin, buffer_data: &[Vec<u8>]) -> ImportedSkin {
    let joints: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
    let reader = skin.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
    let inverse_bind = match reader.read_inverse_bind_matrices() {
        Some(matrices) => matrices.map(cgmath::Matrix4::from).collect(),
        // glTF defaults every inverse bind matrix to the identity
        None => vec![cgmath::SquareMatrix::identity(); joints.len()],
    };
    ImportedSkin {
        joints,
        inverse_bind,
    }
}

fn to_material(material: &gltf::Material, buffer_data: &[Vec<u8>], dir: &str) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let mut out = Material::new(Color::new(r, g, b));
    let [er, eg, eb] = material.emissive_factor();
    out.emissive = Color::new(er, eg, eb);
    if material.double_sided() {
        out.side = crate::data_structures::material::Side::Double;
    }
    out.map = pbr.base_color_texture().and_then(|info| {
        let image = info.texture().source();
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                let bytes = buffer_data.get(view.buffer().index())?.get(start..end)?;
                match Texture::decode(bytes, mime_type.split('/').next_back()) {
                    Ok(decoded) => Some(TextureMap {
                        path: format!("{}#image{}", dir, image.index()),
                        repeat: [1.0, 1.0],
                        image: Some(Arc::new(decoded)),
                    }),
                    Err(e) => {
                        log::warn!("Embedded image {} could not be decoded: {}", image.index(), e);
                        None
                    }
                }
            }
            gltf::image::Source::Uri { uri, .. } => {
                Some(TextureMap::new(&format!("{}{}", dir, uri), [1.0, 1.0]))
            }
        }
    });
    out
}
