use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use flow_vignette::{
    InnerSpace, Point3, Rad, Vector3,
    data_structures::{
        instance::Transform,
        material::{Color, Material, TextureMap},
        scene_graph::{Fog, Node, NodeHandle, Scene},
    },
    resources::primitives,
};

#[test]
fn children_inherit_parent_transform() {
    let mut scene = Scene::new();
    let mut parent = Node::group().at(Vector3::new(0.0, 1.5, 0.0));
    parent.transform.scale = Vector3::new(2.0, 2.0, 2.0);
    let parent = scene.add(parent);
    let child = scene.add_child(parent, Node::group().at(Vector3::new(1.0, 0.0, 0.0)));

    let world = scene.world_transform(child).expect("world");
    assert_eq!(world.position(), Vector3::new(2.0, 1.5, 0.0));
    assert!((world.max_scale() - 2.0).abs() < 1e-6);

    let all = scene.world_transforms();
    assert_eq!(all.len(), 2);
    assert_eq!(all[child.0], world);
}

#[test]
fn rotation_applies_to_child_offsets() {
    let mut scene = Scene::new();
    let mut parent = Node::group();
    parent.transform.rotation.y = Rad(FRAC_PI_2);
    let parent = scene.add(parent);
    let child = scene.add_child(parent, Node::group().at(Vector3::new(1.0, 0.0, 0.0)));
    let world = scene.world_transform(child).expect("world");
    // +X turned a quarter about +Y lands on -Z
    assert!(world.position().x.abs() < 1e-5);
    assert!((world.position().z + 1.0).abs() < 1e-5);
}

#[test]
fn rotated_child_under_stretched_parent_keeps_parent_axes() {
    let mut scene = Scene::new();
    let mut parent = Node::group();
    parent.transform.scale = Vector3::new(10.0, 15.0, 12.0);
    let parent = scene.add(parent);
    let mut child = Node::group();
    child.transform.rotation.x = Rad(-FRAC_PI_2);
    let child = scene.add_child(parent, child);

    // Local +Y turns onto -Z and is then stretched by the parent's Z scale
    let world = scene.world_transform(child).expect("world");
    let p = world.transform_point(Point3::new(0.0, 1.0, 0.0));
    assert!(p.x.abs() < 1e-4);
    assert!(p.y.abs() < 1e-4);
    assert!((p.z + 12.0).abs() < 1e-4);
    assert_eq!(scene.world_transforms()[child.0], world);
}

#[test]
fn normals_follow_inverse_transpose() {
    let mut scene = Scene::new();
    let mut node = Node::group();
    node.transform.scale = Vector3::new(1.0, 2.0, 1.0);
    let node = scene.add(node);

    // The plane y = x has normal (1, -1, 0); stretched along Y it becomes y = 2x
    let world = scene.world_transform(node).expect("world");
    let n = (world.normal_matrix() * Vector3::new(1.0, -1.0, 0.0)).normalize();
    let expected = Vector3::new(2.0, -1.0, 0.0).normalize();
    assert!((n - expected).magnitude() < 1e-5);
}

#[test]
fn unknown_parent_falls_back_to_root() {
    let mut scene = Scene::new();
    let handle = scene.add_child(NodeHandle(42), Node::group().named("orphan"));
    assert_eq!(scene.roots(), &[handle]);
    assert_eq!(scene.get(handle).and_then(|n| n.parent()), None);
}

#[test]
fn names_resolve_in_insertion_order_and_subtrees() {
    let mut scene = Scene::new();
    let a = scene.add(Node::group().named("model"));
    let a_bone = scene.add_child(a, Node::group().named("bone"));
    let b = scene.add(Node::group().named("model"));
    let b_bone = scene.add_child(b, Node::group().named("bone"));

    assert_eq!(scene.find_by_name("model"), Some(a));
    assert_eq!(scene.find_in_subtree(a, "bone"), Some(a_bone));
    assert_eq!(scene.find_in_subtree(b, "bone"), Some(b_bone));
    assert_eq!(scene.subtree(b), vec![b, b_bone]);
    assert_eq!(scene.find_by_name("missing"), None);
}

#[test]
fn textures_apply_to_every_matching_material() {
    let mut scene = Scene::new();
    let map = || TextureMap::new("plane.jpg", [1.0, 1.0]);
    let material = || Material::new(Color::WHITE).with_map(map());
    scene.add(Node::mesh(primitives::plane(1.0, 1.0, 1, 1), material()));
    scene.add(Node::mesh(primitives::plane(2.0, 2.0, 1, 1), material()));
    scene.add(Node::mesh(
        primitives::plane(2.0, 2.0, 1, 1),
        Material::new(Color::WHITE).with_map(TextureMap::new("torus.jpg", [1.0, 0.5])),
    ));
    assert_eq!(scene.pending_textures(), vec!["plane.jpg".to_string(), "torus.jpg".to_string()]);

    let image = Arc::new(image::RgbaImage::new(2, 2));
    assert_eq!(scene.apply_texture("plane.jpg", image), 2);
    assert_eq!(scene.pending_textures(), vec!["torus.jpg".to_string()]);
}

#[test]
fn shadow_flags_and_emissive_cover_subtree() {
    let mut scene = Scene::new();
    let root = scene.add(Node::group().with_transform(Transform::new()));
    let mesh = scene.add_child(
        root,
        Node::mesh(primitives::sphere(1.0, 8, 6), Material::new(Color::WHITE)),
    );
    let other = scene.add(Node::mesh(primitives::sphere(1.0, 8, 6), Material::new(Color::WHITE)));

    scene.set_shadow_flags(root, true, true);
    scene.set_emissive(root, Color::hex(0x808080));
    let mesh_node = scene.get(mesh).expect("mesh");
    assert!(mesh_node.cast_shadow && mesh_node.receive_shadow);
    assert!(!scene.get(other).expect("other").cast_shadow);
    match &mesh_node.kind {
        flow_vignette::data_structures::scene_graph::NodeKind::Mesh { material, .. } => {
            assert_eq!(material.emissive, Color::hex(0x808080));
            assert_eq!(material.revision, 1);
        }
        _ => unreachable!(),
    }
}

#[test]
fn fog_factor_grows_with_depth() {
    let fog = Fog::new(Color::WHITE, 0.002);
    assert_eq!(fog.factor(0.0), 0.0);
    assert!(fog.factor(100.0) < fog.factor(1000.0));
    assert!(fog.factor(1.0e6) > 0.999);
}
