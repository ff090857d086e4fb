#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use flow_vignette::{
        context::Context, data_structures::scene_graph::Scene, flow::ImageTestResult,
    };
    use wgpu::Color;

    use crate::common::test_utils::{TestRender, to_pixel, validate};

    golden_image_test!(TestRender::new(
        Scene::new(),
        |ctx: &mut Context| {
            ctx.clear_colour = Color::WHITE;
            ctx.camera.camera.position = [0.0, 5.0, 2.0].into();
        },
        validate(|_, state, texture| {
            if state.frame() == 0 {
                return Ok(ImageTestResult::Waiting);
            }
            let desired_pixel = to_pixel(Color::WHITE);
            for pixel in texture.pixels() {
                assert_eq!(*pixel, desired_pixel);
            }
            Ok(ImageTestResult::Passed)
        }),
    ));
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_cover_centre_with_unlit_plane() {
    use flow_vignette::{
        Point3, Vector3,
        camera::Camera,
        context::Context,
        data_structures::{
            material::{Color, Material, Side},
            scene_graph::{Node, Scene},
        },
        flow::ImageTestResult,
        resources::primitives,
    };

    use crate::common::test_utils::{TestRender, to_pixel, validate};

    let mut scene = Scene::new();
    scene.add(
        Node::mesh(
            primitives::plane(2.0, 2.0, 1, 1),
            Material::unlit(Color::BLACK).with_side(Side::Double),
        )
        .at(Vector3::new(0.0, 0.0, -5.0)),
    );

    golden_image_test!(TestRender::new(
        scene,
        |ctx: &mut Context| {
            ctx.clear_colour = wgpu::Color::WHITE;
            ctx.camera.camera = Camera::looking_at((0.0, 0.0, 0.0), Point3::new(0.0, 0.0, -1.0));
        },
        validate(|_, state, texture| {
            if state.frame() < 2 {
                return Ok(ImageTestResult::Waiting);
            }
            let (width, height) = texture.dimensions();
            assert_eq!(
                *texture.get_pixel(width / 2, height / 2),
                to_pixel(wgpu::Color::BLACK)
            );
            assert_eq!(*texture.get_pixel(0, 0), to_pixel(wgpu::Color::WHITE));
            Ok(ImageTestResult::Passed)
        }),
    ));
}
