use std::f32::consts::TAU;

use flow_vignette::{
    Point3,
    config::{MotionConfig, ShadowMapKind},
    data_structures::scene_graph::{LightKind, NodeKind},
    demos::primitive::{self, FocalShape},
    panel::Field,
};

#[test]
fn cone_stage_is_built_in_order() {
    let setup = primitive::bootstrap(FocalShape::ConePoint, (800, 600));
    let scene = &setup.scene;

    let plane = scene.find_by_name("plane").expect("plane");
    let light = scene.find_by_name("pointLight").expect("light");
    let cone = scene.find_by_name("cone").expect("cone");
    assert_eq!(light, setup.light);
    assert_eq!(cone, setup.focal);
    assert!(plane < light && light < cone);

    let plane_node = scene.get(plane).expect("plane node");
    assert_eq!(plane_node.transform.position.y, -2.0);
    assert!(plane_node.receive_shadow);

    let lights: Vec<_> = scene.lights().collect();
    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0].1.kind, LightKind::Point);
    assert!(lights[0].1.cast_shadow);

    let marker = scene.find_by_name("marker").expect("marker");
    assert_eq!(scene.get(marker).and_then(|n| n.parent()), Some(light));

    let named = |name: &str| {
        scene
            .iter()
            .filter(|(_, n)| n.name.as_deref() == Some(name))
            .count()
    };
    assert_eq!(named("cone"), 1);
    assert_eq!(named("plane"), 1);
    let grounds = scene
        .iter()
        .filter(|(_, n)| matches!(n.kind, NodeKind::Mesh { .. }) && n.transform.position.y == -2.0)
        .count();
    assert_eq!(grounds, 1);

    let cone_node = scene.get(cone).expect("cone node");
    assert!(cone_node.cast_shadow);
    match &cone_node.kind {
        NodeKind::Points { geometry, material } => {
            assert_eq!(geometry.vertex_count(), 1234);
            assert_eq!(material.size, 0.05);
        }
        other => panic!("cone should be a point cloud, got {:?}", other),
    }

    assert_eq!(setup.camera.position, Point3::new(1.0, 2.0, 5.0));
    assert!((setup.projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert!(setup.shadows.enabled);
    assert_eq!(setup.shadows.kind, ShadowMapKind::Basic);
}

#[test]
fn every_shape_names_its_node_and_folder() {
    for shape in FocalShape::ALL {
        let setup = primitive::bootstrap(shape, (640, 480));
        assert_eq!(setup.scene.find_by_name(shape.name()), Some(setup.focal));
        let folders: Vec<_> = setup.panel.folders().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(folders, vec!["pointLight", shape.name()]);
        let scale = setup.panel.folder(shape.name()).expect("shape folder");
        let labels: Vec<_> = scale.controls.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["scaleX", "scaleY", "scaleZ"]);
        assert!(scale.controls.iter().all(|c| c.min == 0.0 && c.max == 2.0));
    }
}

#[test]
fn solid_torus_is_a_textured_mesh() {
    let setup = primitive::bootstrap(FocalShape::TorusSolid, (800, 600));
    let node = setup.scene.get(setup.focal).expect("torus");
    assert!(node.cast_shadow);
    match &node.kind {
        NodeKind::Mesh { material, .. } => {
            let map = material.map.as_ref().expect("torus map");
            assert_eq!(map.path, "torus.jpg");
            assert_eq!(map.repeat, [1.0, 0.5]);
        }
        other => panic!("solid torus should be a mesh, got {:?}", other),
    }
    assert!(setup.scene.pending_textures().contains(&"torus.jpg".to_string()));
}

#[test]
fn demo_names_map_to_shapes() {
    assert_eq!(FocalShape::from_demo("teapot_point"), Some(FocalShape::TeapotPoint));
    assert_eq!(FocalShape::from_demo("torus_solid"), Some(FocalShape::TorusSolid));
    assert_eq!(FocalShape::from_demo("loadmodel"), None);
    assert!(!FocalShape::TeapotPoint.draggable());
    assert!(FocalShape::ConePoint.draggable());
}

#[test]
fn tick_spins_about_z_and_y() {
    let mut setup = primitive::bootstrap(FocalShape::SpherePoint, (800, 600));
    let spin = MotionConfig::default().spin_per_tick;
    for _ in 0..100 {
        primitive::tick(&mut setup.scene, setup.focal, spin);
    }
    let rotation = setup.scene.get(setup.focal).expect("sphere").transform.rotation;
    assert!((rotation.y.0 - 1.0).abs() < 1e-3);
    assert!((rotation.z.0 - 1.0).abs() < 1e-3);
    assert_eq!(rotation.x.0, 0.0);
}

#[test]
fn tick_wraps_rotation() {
    let mut setup = primitive::bootstrap(FocalShape::ConePoint, (800, 600));
    for _ in 0..700 {
        primitive::tick(&mut setup.scene, setup.focal, 0.01);
    }
    let rotation = setup.scene.get(setup.focal).expect("cone").transform.rotation;
    assert!(rotation.y.0 >= 0.0 && rotation.y.0 < TAU);
    assert!((rotation.y.0 - 7.0f32.rem_euclid(TAU)).abs() < 1e-2);
}

#[test]
fn drag_rotates_about_y_and_x() {
    let mut setup = primitive::bootstrap(FocalShape::TorusPoint, (800, 600));
    primitive::drag_rotate(&mut setup.scene, setup.focal, 10.0, -5.0, 0.01);
    let rotation = setup.scene.get(setup.focal).expect("torus").transform.rotation;
    assert!((rotation.y.0 - 0.1).abs() < 1e-6);
    assert!((rotation.x.0 + 0.05).abs() < 1e-6);
    assert_eq!(rotation.z.0, 0.0);
}

#[test]
fn pointer_at_screen_centre_hits_focal() {
    let setup = primitive::bootstrap(FocalShape::ConePoint, (800, 600));
    let hit = |x, y| {
        primitive::hits_focal(
            &setup.scene,
            setup.focal,
            &setup.camera,
            &setup.projection,
            (x, y),
            (800, 600),
        )
    };
    assert!(hit(400.0, 300.0));
    assert!(!hit(0.0, 0.0));
    assert!(!hit(799.0, 599.0));
}

#[test]
fn panel_writes_bound_fields_without_range_checks() {
    let mut setup = primitive::bootstrap(FocalShape::ConePoint, (800, 600));
    let panel = &setup.panel;
    assert_eq!(panel.len(), 7);
    assert_eq!(panel.get(&setup.scene, 0), Some(1.0));

    assert!(panel.set(&mut setup.scene, 1, 0.05));
    let light = setup.scene.get(setup.light).expect("light");
    assert!((light.transform.position.x - 0.05).abs() < 1e-6);

    // the range only bounds the slider
    assert!(panel.set(&mut setup.scene, 6, 3.5));
    let cone = setup.scene.get(setup.focal).expect("cone");
    assert_eq!(cone.transform.scale.z, 3.5);
    assert!(!panel.set(&mut setup.scene, 7, 1.0));

    // intensity is only bound on lights
    assert!(!Field::LightIntensity.write(&mut setup.scene, setup.focal, 2.0));
}

fn texts(shape: &egui::Shape, out: &mut Vec<String>) {
    match shape {
        egui::Shape::Text(text) => out.push(text.galley.text().to_string()),
        egui::Shape::Vec(shapes) => shapes.iter().for_each(|s| texts(s, out)),
        _ => {}
    }
}

#[test]
fn panel_shows_a_header_per_folder_and_a_slider_per_control() {
    let mut setup = primitive::bootstrap(FocalShape::TorusSolid, (800, 600));
    let values = |setup: &primitive::DemoSetup| {
        (0..setup.panel.len())
            .map(|i| setup.panel.get(&setup.scene, i))
            .collect::<Vec<_>>()
    };
    let before = values(&setup);
    let gui = egui::Context::default();

    // the first frame of a window only measures it
    let mut output = None;
    for _ in 0..3 {
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(800.0, 600.0),
            )),
            ..Default::default()
        };
        output = Some(gui.run(input, |ctx| {
            assert_eq!(setup.panel.show(ctx, &mut setup.scene), None);
        }));
    }

    let mut labels = Vec::new();
    for clipped in output.expect("frame").shapes {
        texts(&clipped.shape, &mut labels);
    }
    for expected in ["pointLight", "torus", "intensity", "x", "scaleZ"] {
        assert!(labels.iter().any(|l| l == expected), "{} in {:?}", expected, labels);
    }
    // untouched sliders leave the scene alone
    assert_eq!(values(&setup), before);
}

#[test]
fn every_demo_name_has_a_constructor() {
    for name in flow_vignette::demos::DEMO_NAMES {
        assert!(flow_vignette::demos::constructor(name).is_some(), "{}", name);
    }
    assert!(flow_vignette::demos::constructor("terrain").is_none());
}
