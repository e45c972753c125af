use std::collections::HashSet;

use landscape_render::{Camera, CameraMovement};
use tracing::warn;
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window};

const MOVEMENT_KEYS: [(KeyCode, CameraMovement); 4] = [
    (KeyCode::KeyW, CameraMovement::Forward),
    (KeyCode::KeyS, CameraMovement::Backward),
    (KeyCode::KeyA, CameraMovement::Left),
    (KeyCode::KeyD, CameraMovement::Right),
];

/// Keyboard and mouse state accumulated between frames.
#[derive(Debug, Default)]
pub struct InputState {
    keys_pressed: HashSet<KeyCode>,
    /// Raw mouse delta reported by DeviceEvents
    mouse_delta: (f64, f64),
    scroll_delta: f32,
    pub cursor_captured: bool,
}

impl InputState {
    pub fn press(&mut self, key: KeyCode) {
        self.keys_pressed.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys_pressed.remove(&key);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn add_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Handle a window event and update state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press(keycode),
                        ElementState::Released => self.release(keycode),
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match *delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 120.0) as f32,
                };
                self.add_scroll(scroll);
            }
            WindowEvent::Focused(false) => self.keys_pressed.clear(),
            _ => {}
        }
    }

    /// Handle device-level events (raw mouse motion).
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_captured {
                self.add_mouse_delta(delta.0, delta.1);
            }
        }
    }

    /// Grab or release the cursor for mouse look.
    pub fn set_cursor_capture(&mut self, window: &Window, capture: bool) {
        if capture {
            // Locked mode stops raw motion delivery on some Linux compositors.
            #[cfg(target_os = "linux")]
            let grab_result = window.set_cursor_grab(CursorGrabMode::Confined);

            #[cfg(not(target_os = "linux"))]
            let grab_result = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));

            if let Err(err) = grab_result {
                warn!("Failed to capture cursor: {err}");
                self.cursor_captured = false;
                return;
            }
            window.set_cursor_visible(false);
            self.cursor_captured = true;
        } else {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                warn!("Failed to release cursor grab: {err}");
            }
            window.set_cursor_visible(true);
            self.cursor_captured = false;
            self.mouse_delta = (0.0, 0.0);
        }
    }

    /// Move, turn and zoom `camera` from the input gathered since the last call.
    pub fn apply_to_camera(&mut self, camera: &mut Camera, delta_seconds: f32) {
        for (key, movement) in MOVEMENT_KEYS {
            if self.is_key_pressed(key) {
                camera.move_by(movement, delta_seconds);
            }
        }

        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        if dx != 0.0 || dy != 0.0 {
            // Screen y grows downward.
            camera.rotate(dx as f32, -dy as f32);
        }

        let scroll = std::mem::take(&mut self.scroll_delta);
        if scroll != 0.0 {
            camera.zoom(scroll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn held_keys_move_camera() {
        let mut input = InputState::default();
        let mut camera = Camera::new(Vec3::ZERO);
        input.press(KeyCode::KeyW);
        input.apply_to_camera(&mut camera, 1.0);
        assert!((camera.position.z + camera.speed).abs() < 1e-4);

        input.release(KeyCode::KeyW);
        input.apply_to_camera(&mut camera, 1.0);
        assert!((camera.position.z + camera.speed).abs() < 1e-4);
    }

    #[test]
    fn mouse_and_scroll_are_consumed_once() {
        let mut input = InputState::default();
        let mut camera = Camera::default();
        input.add_mouse_delta(100.0, -50.0);
        input.add_scroll(10.0);
        input.apply_to_camera(&mut camera, 0.016);

        assert!((camera.yaw - (-90.0 + 100.0 * camera.sensitivity)).abs() < 1e-4);
        assert!((camera.pitch - 50.0 * camera.sensitivity).abs() < 1e-4);
        assert_eq!(camera.fov, 35.0);

        let before = camera.clone();
        input.apply_to_camera(&mut camera, 0.016);
        assert_eq!(camera, before);
    }
}
