//! Translates winit window events into [`Controls`] calls.
//!
//! | Input | Effect |
//! |-------|--------|
//! | mouse move | attractor follows the cursor |
//! | left / right button | attract / repel while held |
//! | Up / Down | acceleration slider |
//! | Left / Right (hold) | particle-count slider, applied on release |
//! | `[` / `]` | point size |
//! | `S` | toggle screensaver |

use glam::Vec2;
use rand::Rng;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::controls::{Controls, Trigger};

impl From<MouseButton> for Trigger {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Right => Trigger::Secondary,
            _ => Trigger::Primary,
        }
    }
}

/// Cursor position in pixels to normalized device coordinates, y up.
pub fn cursor_to_ndc(x: f64, y: f64, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }
    Some(Vec2::new(
        (x as f32 / width as f32) * 2.0 - 1.0,
        1.0 - (y as f32 / height as f32) * 2.0, // Y flipped
    ))
}

/// Window-side input state.
#[derive(Debug)]
pub struct Input {
    // Window size for NDC calculation
    window_size: (u32, u32),
    // Points slider key currently held, committed on release
    points_drag: Option<KeyCode>,
}

impl Input {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            points_drag: None,
        }
    }

    /// Update window size for NDC calculations.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Process a winit window event. Returns `true` if it was consumed.
    pub fn handle_event<R: Rng>(
        &mut self,
        event: &WindowEvent,
        controls: &mut Controls,
        rng: &mut R,
    ) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let (w, h) = self.window_size;
                if let Some(ndc) = cursor_to_ndc(position.x, position.y, w, h) {
                    controls.pointer_moved(ndc);
                }
                true
            }

            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => controls.pointer_down(Trigger::from(*button)),
                    ElementState::Released => controls.pointer_up(),
                }
                true
            }

            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event, controls, rng),

            _ => false,
        }
    }

    fn handle_key<R: Rng>(
        &mut self,
        event: &KeyEvent,
        controls: &mut Controls,
        rng: &mut R,
    ) -> bool {
        let PhysicalKey::Code(key) = event.physical_key else {
            return false;
        };

        if event.state == ElementState::Released {
            if self.points_drag == Some(key) {
                self.points_drag = None;
                controls.commit_points_slider();
                log::info!("particle count set to {}", controls.count());
            }
            return matches!(key, KeyCode::ArrowLeft | KeyCode::ArrowRight);
        }

        // Pressed, including key repeat
        match key {
            KeyCode::ArrowUp => controls.nudge_accel_slider(1.0),
            KeyCode::ArrowDown => controls.nudge_accel_slider(-1.0),
            KeyCode::ArrowRight | KeyCode::ArrowLeft => {
                let steps = if key == KeyCode::ArrowRight { 1.0 } else { -1.0 };
                self.points_drag = Some(key);
                controls.nudge_points_slider(steps);
            }
            KeyCode::BracketRight => controls.nudge_point_size(1.0),
            KeyCode::BracketLeft => controls.nudge_point_size(-1.0),
            KeyCode::KeyS if !event.repeat => controls.toggle_screensaver(rng),
            _ => return false,
        }
        true
    }
}
