//! egui overlay drawn on top of the scene.
//!
//! Window events go to egui first; events it consumes (a drag on a slider,
//! a click on a header) never reach the camera controller or the flows.

use std::fmt::Debug;

use winit::{event::WindowEvent, window::Window};

pub struct Gui {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Gui {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let max_texture_side = device.limits().max_texture_dimension_2d as usize;
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::viewport::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(max_texture_side),
        );
        let options = egui_wgpu::RendererOptions::default();
        let renderer = egui_wgpu::Renderer::new(device, format, options);
        Self {
            ctx,
            state,
            renderer,
        }
    }

    pub fn context(&self) -> &egui::Context {
        &self.ctx
    }

    /// Feeds a window event to egui. Returns whether egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Runs one egui frame with `ui` and records its draw into `encoder` as a
    /// pass that loads `view`. The returned command buffers must be submitted
    /// before `encoder`.
    pub fn paint(
        &mut self,
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        ui: impl FnMut(&egui::Context),
    ) -> Vec<wgpu::CommandBuffer> {
        let raw_input = self.state.take_egui_input(window);
        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = self.ctx.run(raw_input, ui);
        self.state.handle_platform_output(window, platform_output);

        let paint_jobs = self.ctx.tessellate(shapes, pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point,
        };
        for (id, delta) in &textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let commands = self
            .renderer
            .update_buffers(device, queue, encoder, &paint_jobs, &screen);
        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Gui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            self.renderer.render(&mut render_pass, &paint_jobs, &screen);
        }
        for id in &textures_delta.free {
            self.renderer.free_texture(id);
        }
        commands
    }
}

// egui's renderer and winit state carry no Debug impl
impl Debug for Gui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gui").finish_non_exhaustive()
    }
}
