#![allow(dead_code)]
use flow_vignette::flow::ImageTestResult;
use flow_vignette::{
    context::Context,
    data_structures::scene_graph::Scene,
    demos::{DemoEvent, SceneRuntime},
    flow::{GraphicsFlow, Out},
    render::Render,
};

pub(crate) struct State {
    frame_counter: u32,
    init_invocations: u32,
    update_invocations: u32,
    custom_invocations: u32,
    pub dummy_state: String,
}
impl State {
    pub fn new() -> Self {
        Self {
            frame_counter: 0,
            init_invocations: 0,
            update_invocations: 0,
            custom_invocations: 0,
            dummy_state: String::new(),
        }
    }

    pub fn frame(&mut self) {
        self.frame_counter += 1;
    }

    pub fn init(&mut self) {
        self.init_invocations += 1;
    }

    pub fn update(&mut self) {
        self.update_invocations += 1;
    }

    pub fn custom(&mut self) {
        self.custom_invocations += 1;
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn init_invocations(&self) -> u32 {
        self.init_invocations
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations
    }

    pub fn custom_invocations(&self) -> u32 {
        self.custom_invocations
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub(crate) struct FrameCounter(pub(crate) u32);

impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

pub(crate) type Validate =
    Box<dyn Fn(&Context, &mut FrameCounter, &mut Frame) -> Result<ImageTestResult, anyhow::Error>>;

pub(crate) type Frame = image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>;

pub(crate) fn validate(
    check: impl Fn(&Context, &mut FrameCounter, &mut Frame) -> anyhow::Result<ImageTestResult>
    + 'static,
) -> Validate {
    Box::new(check)
}

/// Renders a fixed scene and hands every frame to `validate`.
pub(crate) struct TestRender {
    setup: Box<dyn Fn(&mut Context)>,
    runtime: SceneRuntime,
    validate: Validate,
}

impl TestRender {
    pub(crate) fn new(
        scene: Scene,
        setup: impl Fn(&mut Context) + 'static,
        validate: Validate,
    ) -> Self {
        Self {
            setup: Box::new(setup),
            runtime: SceneRuntime::new(scene),
            validate,
        }
    }
}

impl GraphicsFlow<FrameCounter, DemoEvent> for TestRender {
    fn on_init(&mut self, ctx: &mut Context, _: &mut FrameCounter) -> Out<FrameCounter, DemoEvent> {
        (self.setup)(ctx);
        ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
        self.runtime.init(ctx);
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut FrameCounter,
        _: std::time::Duration,
    ) -> Out<FrameCounter, DemoEvent> {
        state.progress();
        self.runtime.sync(ctx);
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        self.runtime.render()
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut FrameCounter,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        (self.validate)(ctx, state, texture)
    }
}

pub(crate) fn to_pixel(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}

#[macro_export]
macro_rules! golden_image_test {
    ($graphics_elem:expr) => {{
        use flow_vignette::context::InitContext;
        use flow_vignette::demos::DemoEvent;
        use flow_vignette::flow::FlowConstructor;
        use flow_vignette::flow::GraphicsFlow;
        use std::{future::Future, pin::Pin};
        use $crate::common::test_utils::FrameCounter;
        let constructor: FlowConstructor<FrameCounter, DemoEvent> = Box::new(|_: InitContext| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<FrameCounter, DemoEvent>> =
                    Box::new($graphics_elem);
                g_flow
            }) as Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<FrameCounter, DemoEvent>>>>>
        });

        flow_vignette::flow::run(vec![constructor])
            .expect("Failed to run flow for integration test.");
    }};
}
