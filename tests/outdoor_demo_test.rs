use flow_vignette::{
    InnerSpace, Point3, Vector3,
    config::{OutdoorConfig, ShadowMapKind},
    data_structures::{
        material::Color,
        scene_graph::{LightKind, NodeKind},
    },
    demos::outdoor::{self, CHARACTER_BASE},
    pipelines::light::LightUniform,
    scatter,
};
use rand::{SeedableRng, rngs::StdRng};

fn setup() -> outdoor::OutdoorSetup {
    outdoor::bootstrap(&OutdoorConfig::default(), (1280, 720), &mut StdRng::seed_from_u64(5))
}

#[test]
fn static_scene_is_complete() {
    let setup = setup();
    let scene = &setup.scene;
    for name in ["sun", "ambient", "hemisphere", "sky", "ground"] {
        assert!(scene.find_by_name(name).is_some(), "missing {}", name);
    }
    assert_eq!(scene.find_by_name("sun"), Some(setup.sun));
    assert_eq!(scene.find_by_name("sky"), Some(setup.sky));
    assert_eq!(scene.background, Color::WHITE);
    let fog = scene.fog.expect("fog");
    assert_eq!(fog.color, Color::WHITE);
    assert_eq!(fog.density, 0.002);

    let kinds: Vec<_> = scene.lights().map(|(_, light)| light.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(matches!(kinds[0], LightKind::Directional { .. }));
    assert_eq!(kinds[1], LightKind::Ambient);
    assert!(matches!(kinds[2], LightKind::Hemisphere { .. }));

    let sun = scene.get(setup.sun).expect("sun");
    assert!(sun.cast_shadow);
    assert_eq!(sun.transform.position, Vector3::new(-10.0, 500.0, 10.0));

    let ground = scene.get(scene.find_by_name("ground").expect("ground")).expect("ground node");
    assert!(ground.receive_shadow);
    match &scene.get(setup.sky).expect("sky node").kind {
        NodeKind::Sky { gradient, .. } => {
            assert_eq!(gradient.offset, 0.033);
            assert_eq!(gradient.exponent, 0.6);
            assert_eq!(gradient.bottom, Color::WHITE);
        }
        other => panic!("sky should be a gradient dome, got {:?}", other),
    }

    assert_eq!(setup.camera.position, Point3::new(10.0, 20.0, 90.0));
    assert!((setup.projection.zfar() - 1000.0).abs() < 1e-3);
    assert_eq!(setup.shadows.kind, ShadowMapKind::PcfSoft);
}

#[test]
fn requests_cover_scenery_and_characters() {
    let setup = setup();
    let requests = &setup.requests;
    assert_eq!(
        requests.len(),
        scatter::ANIMAL_COUNT + scatter::CLOUD_COUNT + scatter::FOLIAGE_COUNT + 2
    );
    assert_eq!(requests.len(), 25);
    assert!(requests[..5].iter().all(|r| r.model == "Deer.glb"));
    assert!(requests[5..13].iter().all(|r| r.base == scatter::CLOUD_BASE));
    assert!(requests[13..23].iter().all(|r| r.base == scatter::FOLIAGE_BASE));

    let characters = &requests[23..];
    assert!(characters.iter().all(|r| r.base == CHARACTER_BASE));
    assert_eq!(
        characters[0].animation_path().as_deref(),
        Some("nobita/Rumba Dancing.glb")
    );
    assert_eq!(characters[1].model_path(), "nobita/mouse.glb");
    assert!(characters.iter().all(|r| r.cast_shadow && !r.receive_shadow));
}

#[test]
fn light_uniform_folds_outdoor_lights() {
    let setup = setup();
    let world = setup.scene.world_transforms();
    let uniform = LightUniform::from_scene(&setup.scene, &world);

    assert!((uniform.ambient[0] - 0.6).abs() < 1e-6);
    assert_eq!(uniform.hemi_sky[3], 0.5);
    let expected = Vector3::new(10.0f32, -500.0, -10.0).normalize();
    assert!((uniform.dir_direction[1] - expected.y).abs() < 1e-6);
    assert!((uniform.dir_color[0] - 0.5).abs() < 1e-6);
    assert_eq!(uniform.point_position[3], 0.0);
    assert_eq!(uniform.fog, [1.0, 1.0, 1.0, 0.002]);
}

#[test]
fn light_uniform_without_lights_is_dark() {
    let scene = flow_vignette::data_structures::scene_graph::Scene::new();
    let uniform = LightUniform::from_scene(&scene, &scene.world_transforms());
    assert_eq!(uniform, LightUniform::dark());
}
