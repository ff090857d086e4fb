use flow_vignette::{
    Vector3,
    data_structures::{material::Color, sky::SkyGradient},
};

fn gradient() -> SkyGradient {
    SkyGradient::new(Color::new(0.0, 0.0, 1.0), Color::WHITE, 0.033, 0.6)
}

#[test]
fn weight_is_clamped_to_unit_range() {
    let sky = gradient();
    assert_eq!(sky.weight(-1.0), 0.0);
    assert_eq!(sky.weight(-0.5), 0.0);
    assert_eq!(sky.weight(1.0), 1.0);
    let horizon = sky.weight(0.0);
    assert!((horizon - 0.033f32.powf(0.6)).abs() < 1e-6);
}

#[test]
fn shade_blends_bottom_to_top() {
    let sky = gradient();
    assert_eq!(sky.shade(-1.0), Color::WHITE);
    assert_eq!(sky.shade(1.0), Color::new(0.0, 0.0, 1.0));
    let mid = sky.shade(0.3);
    assert!(mid.r < 1.0 && mid.r > 0.0);
    assert_eq!(mid.b, 1.0);
}

#[test]
fn weight_grows_with_height() {
    let sky = gradient();
    let mut last = 0.0;
    for step in 0..=20 {
        let h = -1.0 + step as f32 * 0.1;
        let w = sky.weight(h);
        assert!(w >= last);
        last = w;
    }
}

#[test]
fn direction_only_depends_on_height() {
    let sky = gradient();
    assert_eq!(
        sky.shade_direction(Vector3::new(0.0, 1000.0, 0.0)),
        sky.shade(1.0)
    );
    assert_eq!(sky.shade_direction(Vector3::new(0.0, 0.0, 0.0)), Color::WHITE);
    let a = sky.shade_direction(Vector3::new(3.0, 4.0, 0.0));
    let b = sky.shade_direction(Vector3::new(0.0, 4.0, 3.0));
    assert_eq!(a, b);
}

#[test]
fn uniform_packs_offset_and_exponent() {
    let uniform = gradient().to_uniform();
    assert_eq!(uniform.params[0], 0.033);
    assert_eq!(uniform.params[1], 0.6);
    assert_eq!(uniform.top, [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(uniform.bottom, [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn ground_colour_at_negative_offset() {
    let sky = gradient();
    assert_eq!(sky.weight(-sky.offset), 0.0);
    assert_eq!(sky.shade(-sky.offset), sky.bottom);
}

#[test]
fn exponent_sharpens_towards_the_zenith() {
    let top = Color::new(0.0, 0.0, 1.0);
    let mut last_low = 1.0;
    for exponent in [0.3, 0.6, 1.0, 2.0, 4.0] {
        let sky = SkyGradient::new(top, Color::WHITE, 0.033, exponent);
        // Straight up is always the sky colour
        assert_eq!(sky.shade(1.0), top);
        // Close to the zenith the colour is close to the sky colour
        let near = sky.shade(0.95);
        assert!(near.r < 0.2, "exponent {} gave {:?}", exponent, near);
        // Lower down a larger exponent keeps more of the ground colour
        let low = sky.weight(0.3);
        assert!(low < last_low);
        last_low = low;
    }
}
