use std::sync::Arc;

use crate::{
    data_structures::{
        geometry::Geometry,
        material::{Color, Material, TextureMap},
    },
    resources::{ImportedModel, ImportedNode},
};

/**
 * Wavefront OBJ import. Every OBJ object becomes one node holding a single
 * mesh; face indices are unified (`single_index`) so positions, uvs and
 * normals share one index buffer.
 */
pub fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

pub fn to_geometry(mesh: &tobj::Mesh) -> Geometry {
    let count = mesh.positions.len() / 3;
    let mut geometry = Geometry::with_capacity(count, mesh.indices.len());
    for i in 0..count {
        geometry.push_vertex(
            [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            [
                mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 1).map_or(1.0, |f| *f),
                mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
            [
                mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
        );
    }
    geometry.indices = mesh.indices.clone();
    geometry
}

pub fn to_material(material: Option<&tobj::Material>, dir: &str) -> Material {
    let Some(material) = material else {
        return Material::default();
    };
    let color = material
        .diffuse
        .map(|[r, g, b]| Color::new(r, g, b))
        .unwrap_or(Color::WHITE);
    let mut out = Material::new(color);
    if let Some(texture) = &material.diffuse_texture {
        out.map = Some(TextureMap::new(&format!("{}{}", dir, texture), [1.0, 1.0]));
    }
    out
}

/// Builds the CPU model from parsed OBJ data. `dir` is prefixed to texture paths.
pub fn to_imported_model(
    name: &str,
    models: &[tobj::Model],
    materials: &[tobj::Material],
    dir: &str,
) -> ImportedModel {
    let mut imported = ImportedModel::default();
    for (idx, model) in models.iter().enumerate() {
        let geometry = to_geometry(&model.mesh);
        if geometry.vertex_count() == 0 {
            log::warn!("Mesh at index {} in file {} has no vertices", idx, name);
            continue;
        }
        let material = to_material(
            model.mesh.material_id.and_then(|id| materials.get(id)),
            dir,
        );
        let node_name = if model.name.is_empty() {
            format!("#{}", idx)
        } else {
            model.name.clone()
        };
        imported.roots.push(imported.nodes.len());
        imported.nodes.push(ImportedNode {
            name: Some(node_name),
            meshes: vec![(Arc::new(geometry), material)],
            ..Default::default()
        });
    }
    imported
}
