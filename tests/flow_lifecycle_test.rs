#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod lifecycle {
    use std::{future::Future, pin::Pin};

    use flow_vignette::{
        context::{Context, InitContext},
        flow::{FlowConstructor, GraphicsFlow, ImageTestResult, Out},
        input::PointerEvent,
        render::Render,
    };
    use wgpu::Color;

    use crate::common::test_utils::State;

    pub(crate) enum Event {
        Test,
    }

    pub(crate) struct GraphicsElement;

    impl GraphicsFlow<State, Event> for GraphicsElement {
        fn on_init(&mut self, ctx: &mut Context, state: &mut State) -> Out<State, Event> {
            ctx.clear_colour = Color::TRANSPARENT;
            assert_eq!(state.frame_counter(), 0);
            assert_eq!(state.init_invocations(), 0);
            assert_eq!(state.update_invocations(), 0);

            state.init();
            Out::Empty
        }

        fn on_update(
            &mut self,
            _: &Context,
            state: &mut State,
            _: std::time::Duration,
        ) -> Out<State, Event> {
            assert_eq!(state.frame_counter(), state.update_invocations());
            assert_eq!(state.init_invocations(), 1);
            state.frame();
            state.update();

            let serve_sencha: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
                state.dummy_state.push('🍵');
            });
            let serve_mate: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
                state.dummy_state.push('🧉');
            });
            match state.frame_counter() {
                3 => Out::FutEvent(vec![Box::new(async move { Event::Test })]),
                5 => Out::FutFn(vec![
                    Box::new(async move { serve_sencha }),
                    Box::new(async move { serve_mate }),
                ]),
                _ => Out::Empty,
            }
        }

        fn on_pointer_event(
            &mut self,
            _: &Context,
            _: &mut State,
            _: &PointerEvent,
        ) -> Out<State, Event> {
            Out::Empty
        }

        fn on_custom_events(
            &mut self,
            _: &Context,
            state: &mut State,
            event: Event,
        ) -> Option<Event> {
            match event {
                Event::Test => {
                    // sent in frame 3
                    assert!(state.frame_counter() >= 3);
                    state.custom();
                    None
                }
            }
        }

        fn on_render(&self) -> Render<'_> {
            Render::None
        }

        fn render_to_texture(
            &self,
            _: &Context,
            state: &mut State,
            _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error> {
            if state.frame_counter() < 7 || state.dummy_state.chars().count() < 2 {
                return Ok(ImageTestResult::Waiting);
            }
            assert!(state.dummy_state.contains('🧉'));
            assert!(state.dummy_state.contains('🍵'));
            // both emojis are four bytes wide
            assert_eq!(state.dummy_state.len(), 8, "{}", state.dummy_state);
            assert_eq!(state.custom_invocations(), 1);
            Ok(ImageTestResult::Passed)
        }
    }

    type FlowFuture = Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<State, Event>>>>>;

    pub(crate) fn constructor() -> FlowConstructor<State, Event> {
        Box::new(|_: InitContext| {
            let flow: Box<dyn GraphicsFlow<State, Event>> = Box::new(GraphicsElement);
            Box::pin(async move { flow }) as FlowFuture
        })
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_run_hooks_in_order_and_resolve_futures() {
    if let Err(e) = flow_vignette::flow::run(vec![lifecycle::constructor()]) {
        panic!("{}", e);
    }
}
