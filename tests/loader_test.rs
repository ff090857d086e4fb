use std::sync::Arc;

use flow_vignette::{
    Vector3,
    animation::AnimationMixer,
    data_structures::{
        instance::Transform,
        material::{Color, Material},
        scene_graph::{NodeKind, Scene},
    },
    resources::{
        ImportedModel, ImportedNode,
        animation::{AnimationClip, Channel, Keyframes},
        loader::{AssetLoader, LoadJob, LoadRequest, LoadState},
        primitives,
    },
};

fn character() -> ImportedModel {
    ImportedModel {
        nodes: vec![
            ImportedNode {
                name: Some("Hips".to_string()),
                transform: Transform::new(),
                meshes: vec![],
                children: vec![1],
                skin: None,
            },
            ImportedNode {
                name: Some("Body".to_string()),
                transform: Transform::at(Vector3::new(0.0, 1.0, 0.0)),
                meshes: vec![(
                    Arc::new(primitives::sphere(1.0, 8, 6)),
                    Material::new(Color::WHITE),
                )],
                children: vec![],
                skin: None,
            },
        ],
        roots: vec![0],
        clips: vec![],
        skins: vec![],
    }
}

fn dance() -> ImportedModel {
    ImportedModel {
        clips: vec![AnimationClip::new(
            "dance",
            vec![Channel {
                target: "Hips".to_string(),
                keyframes: Keyframes::Translation(vec![
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(2.0, 0.0, 0.0),
                ]),
                timestamps: vec![0.0, 1.0],
            }],
        )],
        ..Default::default()
    }
}

fn request() -> LoadRequest {
    LoadRequest::new("nobita/", "nobita.glb")
        .with_animation("Rumba Dancing.glb")
        .at(Vector3::new(0.0, 0.0, 5.0))
        .scaled(0.15)
        .with_shadows(true, false)
}

#[test]
fn request_queues_mesh_job() {
    let mut loader = AssetLoader::new();
    let task = loader.request(request());
    assert_eq!(loader.state(task), Some(&LoadState::Pending));
    assert_eq!(
        loader.drain_jobs(),
        vec![LoadJob::Mesh {
            task,
            path: "nobita/nobita.glb".to_string()
        }]
    );
    assert!(loader.drain_jobs().is_empty());
    assert_eq!(loader.pending(), 1);
}

#[test]
fn loaded_mesh_is_placed_and_queues_animation() {
    let mut scene = Scene::new();
    let mut loader = AssetLoader::new();
    let task = loader.request(request());
    loader.drain_jobs();

    let node = loader
        .on_mesh_loaded(task, Ok(character()), &mut scene)
        .expect("model inserted");
    assert_eq!(loader.state(task), Some(&LoadState::MeshReady { node }));
    assert_eq!(loader.pending(), 0);

    let root = scene.get(node).expect("root");
    assert_eq!(root.name.as_deref(), Some("nobita.glb"));
    assert_eq!(root.transform.position, Vector3::new(0.0, 0.0, 5.0));
    assert_eq!(root.transform.scale, Vector3::new(0.15, 0.15, 0.15));

    // root, Hips, Body and the body mesh
    let subtree = scene.subtree(node);
    assert_eq!(subtree.len(), 4);
    assert!(subtree.iter().all(|h| {
        let n = scene.get(*h).expect("node");
        n.cast_shadow && !n.receive_shadow
    }));
    assert_eq!(
        subtree
            .iter()
            .filter(|h| matches!(scene.get(**h).map(|n| &n.kind), Some(NodeKind::Mesh { .. })))
            .count(),
        1
    );

    let body = scene.find_in_subtree(node, "Body").expect("body");
    let world = scene.world_transform(body).expect("world");
    assert!((world.position().y - 0.15).abs() < 1e-6);
    assert!((world.position().z - 5.0).abs() < 1e-6);

    assert_eq!(
        loader.drain_jobs(),
        vec![LoadJob::Animation {
            task,
            path: "nobita/Rumba Dancing.glb".to_string()
        }]
    );
}

#[test]
fn animation_starts_a_looping_mixer() {
    let mut scene = Scene::new();
    let mut mixers: Vec<AnimationMixer> = Vec::new();
    let mut loader = AssetLoader::new();
    let task = loader.request(request());
    let node = loader
        .on_mesh_loaded(task, Ok(character()), &mut scene)
        .expect("model inserted");

    let mixer = loader
        .on_animation_loaded(task, Ok(dance()), &mut scene, &mut mixers)
        .expect("mixer created");
    assert_eq!(loader.state(task), Some(&LoadState::Animated { node, mixer }));
    assert_eq!(mixers.len(), 1);
    assert_eq!(mixers[0].root(), node);
    let action = mixers[0].action(0).expect("action");
    assert!(action.is_playing());
    assert!(action.looping);
    assert_eq!(action.bound_channels(), 1);

    mixers[0].update(1.25, &mut scene);
    let hips = scene.find_in_subtree(node, "Hips").expect("hips");
    let x = scene.get(hips).expect("hips node").transform.position.x;
    assert!((x - 0.5).abs() < 1e-5);
}

#[test]
fn failed_mesh_marks_task_failed() {
    let mut scene = Scene::new();
    let mut loader = AssetLoader::new();
    let task = loader.request(request());
    loader.drain_jobs();

    let node = loader.on_mesh_loaded(task, Err(anyhow::anyhow!("404")), &mut scene);
    assert!(node.is_none());
    assert!(matches!(loader.state(task), Some(LoadState::Failed(_))));
    assert!(scene.is_empty());
    assert!(loader.drain_jobs().is_empty());

    // a late duplicate result is ignored
    assert!(loader.on_mesh_loaded(task, Ok(character()), &mut scene).is_none());
    assert!(scene.is_empty());
}

#[test]
fn failed_animation_keeps_the_model() {
    let mut scene = Scene::new();
    let mut mixers = Vec::new();
    let mut loader = AssetLoader::new();
    let task = loader.request(request());
    let node = loader
        .on_mesh_loaded(task, Ok(character()), &mut scene)
        .expect("model inserted");

    assert!(
        loader
            .on_animation_loaded(task, Ok(ImportedModel::default()), &mut scene, &mut mixers)
            .is_none()
    );
    assert!(matches!(loader.state(task), Some(LoadState::Failed(_))));
    assert!(mixers.is_empty());
    assert!(scene.get(node).is_some());
}

#[test]
fn emissive_is_forced_onto_meshes() {
    let mut scene = Scene::new();
    let mut loader = AssetLoader::new();
    let grey = Color::hex(0x808080);
    let request = LoadRequest::new("nature2/glb/", "Cloud1.glb").with_emissive(grey);
    let task = loader.request(request);
    let node = loader
        .on_mesh_loaded(task, Ok(character()), &mut scene)
        .expect("model inserted");
    let emissive: Vec<Color> = scene
        .subtree(node)
        .into_iter()
        .filter_map(|h| match &scene.get(h)?.kind {
            NodeKind::Mesh { material, .. } => Some(material.emissive),
            _ => None,
        })
        .collect();
    assert_eq!(emissive, vec![Color::hex(0x808080)]);
}
