use flow_vignette::{
    data_structures::material::Color,
    scatter::{self, ANIMAL_BASE, CLOUD_BASE, FOLIAGE_BASE, FOLIAGE_NAMES},
};
use rand::{SeedableRng, rngs::StdRng};

#[test]
fn rand_int_stays_inclusive() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut seen = [false; 5];
    for _ in 0..1000 {
        let value = scatter::rand_int(&mut rng, 1, 5);
        assert!((1..=5).contains(&value));
        seen[(value - 1) as usize] = true;
    }
    assert!(seen.iter().all(|s| *s), "every value in 1..=5 should appear");
    assert_eq!(scatter::rand_int(&mut rng, 3, 3), 3);
}

#[test]
fn foliage_is_spread_on_the_ground() {
    let mut rng = StdRng::seed_from_u64(42);
    let foliage = scatter::foliage(&mut rng, scatter::FOLIAGE_COUNT, 500.0);
    assert_eq!(foliage.len(), 10);
    for request in &foliage {
        assert_eq!(request.base, FOLIAGE_BASE);
        let (name, variant) = request
            .model
            .strip_suffix(".glb")
            .and_then(|stem| stem.rsplit_once('_'))
            .expect("foliage model is <name>_<variant>.glb");
        assert!(FOLIAGE_NAMES.contains(&name), "unknown foliage {}", name);
        let variant: u32 = variant.parse().expect("numeric variant");
        assert!((1..=5).contains(&variant));
        assert_eq!(request.position.y, 0.0);
        assert!(request.position.x.abs() <= 500.0 && request.position.z.abs() <= 500.0);
        assert_eq!(request.scale.x, 0.25);
        assert!(request.cast_shadow && request.receive_shadow);
        assert_eq!(request.emissive, Some(Color::BLACK));
        assert!(request.animation.is_none());
    }
}

#[test]
fn clouds_float_above_the_ground() {
    let mut rng = StdRng::seed_from_u64(1);
    let clouds = scatter::clouds(&mut rng, scatter::CLOUD_COUNT, 500.0);
    assert_eq!(clouds.len(), 8);
    for request in &clouds {
        assert_eq!(request.base, CLOUD_BASE);
        assert!(["Cloud1.glb", "Cloud2.glb", "Cloud3.glb"].contains(&request.model.as_str()));
        assert_eq!(request.position.y, 150.0);
        for s in [request.scale.x, request.scale.y, request.scale.z] {
            assert!((10.0..15.0).contains(&s));
        }
        assert_eq!(request.emissive, Some(Color::hex(0x808080)));
        assert!(!request.cast_shadow);
    }
}

#[test]
fn animals_are_small_deer() {
    let mut rng = StdRng::seed_from_u64(3);
    let animals = scatter::animals(&mut rng, scatter::ANIMAL_COUNT, 500.0);
    assert_eq!(animals.len(), 5);
    for request in &animals {
        assert_eq!(request.model_path(), format!("{}Deer.glb", ANIMAL_BASE));
        assert_eq!(request.scale.x, 0.1);
        assert_eq!(request.position.y, 0.0);
    }
}

#[test]
fn same_seed_gives_same_layout() {
    let a = scatter::foliage(&mut StdRng::seed_from_u64(9), 10, 500.0);
    let b = scatter::foliage(&mut StdRng::seed_from_u64(9), 10, 500.0);
    assert_eq!(a, b);
}
