use flow_vignette::resources::primitives;

fn assert_indices_in_range(geometry: &flow_vignette::data_structures::geometry::Geometry) {
    let count = geometry.vertex_count() as u32;
    assert!(geometry.indices.iter().all(|i| *i < count));
    assert_eq!(geometry.index_count() % 3, 0);
    assert_eq!(geometry.positions.len(), geometry.normals.len());
    assert_eq!(geometry.positions.len(), geometry.uvs.len());
}

#[test]
fn plane_is_a_grid_in_the_xy_plane() {
    let plane = primitives::plane(20.0, 20.0, 1, 1);
    assert_eq!(plane.vertex_count(), 4);
    assert_eq!(plane.index_count(), 6);
    assert!(plane.positions.iter().all(|p| p[2] == 0.0));
    assert!(plane.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
    assert_indices_in_range(&plane);

    let ground = primitives::plane(5000.0, 5000.0, 10, 10);
    assert_eq!(ground.vertex_count(), 11 * 11);
    assert_eq!(ground.index_count(), 10 * 10 * 6);
    let max_x = ground.positions.iter().map(|p| p[0]).fold(f32::MIN, f32::max);
    assert!((max_x - 2500.0).abs() < 1e-3);
}

#[test]
fn sphere_has_expected_topology() {
    let sphere = primitives::sphere(1.0, 24, 24);
    assert_eq!(sphere.vertex_count(), 625);
    assert_eq!(sphere.index_count(), 3312);
    assert_indices_in_range(&sphere);
    for p in &sphere.positions {
        let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!((r - 1.0).abs() < 1e-4);
    }
    assert!((sphere.bounding_radius() - 1.0).abs() < 1e-4);
}

#[test]
fn sky_dome_uses_large_radius() {
    let dome = primitives::sphere(1000.0, 32, 15);
    assert_eq!(dome.vertex_count(), 33 * 16);
    assert!((dome.bounding_radius() - 1000.0).abs() < 0.1);
}

#[test]
fn cone_has_expected_topology() {
    let cone = primitives::cone(0.8, 1.6, 64, 16);
    assert_eq!(cone.vertex_count(), 1234);
    assert_eq!(cone.index_count(), 6144);
    assert_indices_in_range(&cone);
    let top = cone.positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
    let bottom = cone.positions.iter().map(|p| p[1]).fold(f32::MAX, f32::min);
    assert!((top - 0.8).abs() < 1e-4);
    assert!((bottom + 0.8).abs() < 1e-4);
}

#[test]
fn torus_has_expected_topology() {
    let torus = primitives::torus(1.0, 0.2, 16, 100);
    assert_eq!(torus.vertex_count(), 1717);
    assert_eq!(torus.index_count(), 9600);
    assert_indices_in_range(&torus);
    assert!((torus.bounding_radius() - 1.2).abs() < 1e-3);
}

#[test]
fn teapot_has_expected_topology() {
    let teapot = primitives::teapot(0.5, 8);
    assert_eq!(teapot.vertex_count(), 2592);
    assert_eq!(teapot.index_count(), 12288);
    assert_indices_in_range(&teapot);
    for n in &teapot.normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-3);
    }
}

#[test]
fn primitives_are_deterministic() {
    assert_eq!(primitives::torus(1.0, 0.2, 16, 100), primitives::torus(1.0, 0.2, 16, 100));
    assert_eq!(primitives::teapot(0.5, 8), primitives::teapot(0.5, 8));
}

#[test]
fn point_sprites_expand_each_vertex_into_a_quad() {
    let cone = primitives::cone(0.8, 1.6, 64, 16);
    let sprites = cone.point_sprites();

    assert_eq!(sprites.vertex_count(), cone.vertex_count() * 4);
    assert_eq!(sprites.triangle_count(), cone.vertex_count() * 2);
    assert_indices_in_range(&sprites);

    let quad = &sprites.positions[4..8];
    assert!(quad.iter().all(|p| *p == cone.positions[1]));
    assert_eq!(
        &sprites.uvs[4..8],
        &[[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]
    );
    assert_eq!(&sprites.indices[6..12], &[4, 5, 6, 4, 6, 7]);
}
