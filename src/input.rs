//! Pointer input translation.
//!
//! winit reports cursor positions, button changes and wheel deltas as separate
//! window events. [`PointerTracker`] folds them into [`PointerEvent`]s carrying
//! the information camera controllers and flows react to: press/release
//! positions, motion deltas while a button is held, wheel steps in DOM units
//! and clicks. A click follows every press and release of the same button,
//! dragged or not, like a DOM `click`.

use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixels per wheel line, as reported by browsers in `deltaY`.
pub const WHEEL_LINE_PIXELS: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down {
        button: MouseButton,
        x: f64,
        y: f64,
    },
    Up {
        button: MouseButton,
        x: f64,
        y: f64,
    },
    /// Cursor motion. `dx`/`dy` are relative to the previous position,
    /// `pressed` tells whether any button is held.
    Move {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        pressed: bool,
    },
    /// Wheel step; positive values scroll towards the user (DOM convention).
    Wheel { delta_y: f64 },
    /// Follows the `Up` of the button that was pressed. `dragged` is set
    /// when the pointer moved while the button was held.
    Click {
        button: MouseButton,
        x: f64,
        y: f64,
        dragged: bool,
    },
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    position: Option<(f64, f64)>,
    pressed: Option<(MouseButton, f64, f64)>,
    travelled: f64,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> (f64, f64) {
        self.position.unwrap_or((0.0, 0.0))
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }

    /// Translates one window event. Most events produce nothing, a button
    /// release may produce an `Up` followed by a `Click`.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Vec<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.moved(position.x, position.y),
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.pressed(*button),
                ElementState::Released => self.released(*button),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    // winit reports lines scrolled away from the user as positive
                    MouseScrollDelta::LineDelta(_, y) => -(*y as f64) * WHEEL_LINE_PIXELS,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y,
                };
                vec![PointerEvent::Wheel { delta_y }]
            }
            WindowEvent::CursorLeft { .. } => {
                self.position = None;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn moved(&mut self, x: f64, y: f64) -> Vec<PointerEvent> {
        let (dx, dy) = match self.position {
            Some((px, py)) => (x - px, y - py),
            None => (0.0, 0.0),
        };
        self.position = Some((x, y));
        if self.pressed.is_some() {
            self.travelled += dx.abs() + dy.abs();
        }
        vec![PointerEvent::Move {
            x,
            y,
            dx,
            dy,
            pressed: self.pressed.is_some(),
        }]
    }

    pub fn pressed(&mut self, button: MouseButton) -> Vec<PointerEvent> {
        let (x, y) = self.position();
        self.pressed = Some((button, x, y));
        self.travelled = 0.0;
        vec![PointerEvent::Down { button, x, y }]
    }

    pub fn released(&mut self, button: MouseButton) -> Vec<PointerEvent> {
        let (x, y) = self.position();
        let mut events = vec![PointerEvent::Up { button, x, y }];
        if let Some((pressed_button, _, _)) = self.pressed.take() {
            if pressed_button == button {
                events.push(PointerEvent::Click {
                    button,
                    x,
                    y,
                    dragged: self.travelled > 0.0,
                });
            }
        }
        self.travelled = 0.0;
        events
    }
}
