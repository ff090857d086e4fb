use std::{f32::consts::FRAC_PI_2, sync::Arc};

use flow_vignette::{
    Euler, Matrix4, Point3, Rad, SquareMatrix, Transform as _, Vector3,
    data_structures::{
        geometry::Geometry,
        instance::Transform,
        material::{Color, Material},
        scene_graph::{Node, NodeKind, Scene},
    },
    pipelines::skin::{JointPaletteUniform, MAX_JOINTS},
    resources::{ImportedModel, ImportedNode, ImportedSkin},
};

/// Two vertices: the shoulder follows the first joint, the tip the second.
fn arm_geometry() -> Geometry {
    let mut geometry = Geometry::with_capacity(2, 0);
    geometry.push_vertex([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0]);
    geometry.push_vertex([0.0, 2.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0]);
    geometry.joints = vec![[0, 0, 0, 0], [1, 0, 0, 0]];
    geometry.weights = vec![[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]];
    geometry
}

fn arm() -> ImportedModel {
    ImportedModel {
        nodes: vec![
            ImportedNode {
                name: Some("Armature".to_string()),
                children: vec![1, 3],
                ..Default::default()
            },
            ImportedNode {
                name: Some("Shoulder".to_string()),
                children: vec![2],
                ..Default::default()
            },
            ImportedNode {
                name: Some("Elbow".to_string()),
                transform: Transform::at(Vector3::new(0.0, 1.0, 0.0)),
                ..Default::default()
            },
            ImportedNode {
                name: Some("Arm".to_string()),
                meshes: vec![(Arc::new(arm_geometry()), Material::new(Color::WHITE))],
                skin: Some(0),
                ..Default::default()
            },
        ],
        roots: vec![0],
        skins: vec![ImportedSkin {
            joints: vec![1, 2],
            inverse_bind: vec![
                Matrix4::identity(),
                Matrix4::from_translation(Vector3::new(0.0, -1.0, 0.0)),
            ],
        }],
        ..Default::default()
    }
}

fn assert_close(a: Point3<f32>, b: Point3<f32>) {
    assert!(
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5,
        "{:?} != {:?}",
        a,
        b
    );
}

#[test]
fn instantiate_binds_skinned_meshes_to_joint_nodes() {
    let mut scene = Scene::new();
    arm().instantiate(&mut scene, Node::group().at(Vector3::new(5.0, 0.0, 0.0)));

    let shoulder = scene.find_by_name("Shoulder").expect("shoulder");
    let elbow = scene.find_by_name("Elbow").expect("elbow");
    let arm = scene.find_by_name("Arm").expect("arm");
    let mesh = scene.get(arm).expect("arm node").children()[0];
    let node = scene.get(mesh).expect("mesh node");
    assert!(matches!(node.kind, NodeKind::Mesh { .. }));

    let skin = node.skin.as_ref().expect("skin");
    assert_eq!(skin.joints, vec![shoulder, elbow]);
    assert_eq!(skin.inverse_bind.len(), 2);
}

#[test]
fn rest_pose_palette_is_identity_wherever_the_model_stands() {
    let mut scene = Scene::new();
    arm().instantiate(&mut scene, Node::group().at(Vector3::new(5.0, 0.0, 0.0)));
    let arm = scene.find_by_name("Arm").expect("arm");
    let mesh = scene.get(arm).expect("arm node").children()[0];

    let palette = scene
        .joint_palette(mesh, &scene.world_transforms())
        .expect("palette");
    assert_eq!(palette.len(), 2);
    let tip = Point3::new(0.0, 2.0, 0.0);
    for joint in palette {
        assert_close(joint.transform_point(tip), tip);
    }
}

#[test]
fn bent_elbow_swings_the_tip() {
    let mut scene = Scene::new();
    arm().instantiate(&mut scene, Node::group().at(Vector3::new(5.0, 0.0, 0.0)));
    let elbow = scene.find_by_name("Elbow").expect("elbow");
    let arm = scene.find_by_name("Arm").expect("arm");
    let mesh = scene.get(arm).expect("arm node").children()[0];

    scene.get_mut(elbow).expect("elbow").transform.rotation =
        Euler::new(Rad(0.0), Rad(0.0), Rad(FRAC_PI_2));
    let palette = scene
        .joint_palette(mesh, &scene.world_transforms())
        .expect("palette");

    // the shoulder stays, the tip turns about the elbow at (0, 1, 0)
    assert_close(
        palette[0].transform_point(Point3::new(0.0, 0.0, 0.0)),
        Point3::new(0.0, 0.0, 0.0),
    );
    assert_close(
        palette[1].transform_point(Point3::new(0.0, 2.0, 0.0)),
        Point3::new(-1.0, 1.0, 0.0),
    );
}

#[test]
fn rigid_nodes_have_no_palette() {
    let mut scene = Scene::new();
    let ball = scene.add(Node::mesh(arm_geometry(), Material::new(Color::WHITE)));
    assert!(scene.joint_palette(ball, &scene.world_transforms()).is_none());
}

#[test]
fn palette_uniform_pads_with_identities() {
    let bend = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
    let uniform = JointPaletteUniform::from_matrices(&[Matrix4::identity(), bend]);

    assert_eq!(uniform.matrix(1), Some(bend));
    assert_eq!(uniform.matrix(MAX_JOINTS - 1), Some(Matrix4::identity()));
    assert_eq!(uniform.matrix(MAX_JOINTS), None);

    // extra joints are dropped rather than overflowing the uniform
    let many = vec![bend; MAX_JOINTS + 8];
    let uniform = JointPaletteUniform::from_matrices(&many);
    assert_eq!(uniform.matrix(MAX_JOINTS - 1), Some(bend));
}

#[test]
fn rigid_vertices_carry_zero_weights() {
    let skinned = arm_geometry().to_vertices();
    assert_eq!(skinned[1].joints, [1, 0, 0, 0]);
    assert_eq!(skinned[1].weights, [1.0, 0.0, 0.0, 0.0]);

    let mut rigid = arm_geometry();
    rigid.joints.clear();
    rigid.weights.clear();
    assert!(!rigid.is_skinned());
    assert!(rigid.to_vertices().iter().all(|v| v.weights == [0.0; 4]));
}
