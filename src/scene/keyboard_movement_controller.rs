use std::f32::consts::{PI, TAU};

use glam::{vec3, Vec3};
use winit::event::VirtualKeyCode;

use super::TransformComponent;
use crate::app_input::AppInput;
use crate::config::CameraConfig;

/// Pitch is kept a bit under 90dgr so the view basis never degenerates
const MAX_PITCH: f32 = 1.5;

/// Fly camera. WASD moves in the XZ plane relative to the yaw, E/Q go
/// up/down, arrow keys look around. World is y-down, so "up" is -y.
pub struct KeyboardMovementController {
  pub move_speed: f32,
  pub look_speed: f32,
}

impl KeyboardMovementController {
  pub fn new(cfg: &CameraConfig) -> Self {
    Self {
      move_speed: cfg.move_speed,
      look_speed: cfg.look_speed,
    }
  }

  /// Apply held keys to `transform`, scaled by `dt` (seconds)
  pub fn move_in_plane_xz(&self, input: &AppInput, dt: f32, transform: &mut TransformComponent) {
    let axis = |positive: VirtualKeyCode, negative: VirtualKeyCode| -> f32 {
      let mut value = 0.0;
      if input.is_pressed(positive) {
        value += 1.0;
      }
      if input.is_pressed(negative) {
        value -= 1.0;
      }
      value
    };

    let rotate = vec3(
      axis(VirtualKeyCode::Up, VirtualKeyCode::Down),
      axis(VirtualKeyCode::Right, VirtualKeyCode::Left),
      0.0,
    );
    if rotate.length_squared() > f32::EPSILON {
      transform.rotation += self.look_speed * dt * rotate.normalize();
    }
    transform.rotation.x = transform.rotation.x.clamp(-MAX_PITCH, MAX_PITCH);
    transform.rotation.y = wrap_angle(transform.rotation.y);

    let yaw = transform.rotation.y;
    let forward = vec3(yaw.sin(), 0.0, yaw.cos());
    let right = vec3(forward.z, 0.0, -forward.x);
    let up = vec3(0.0, -1.0, 0.0);

    let move_dir: Vec3 = forward * axis(VirtualKeyCode::W, VirtualKeyCode::S)
      + right * axis(VirtualKeyCode::D, VirtualKeyCode::A)
      + up * axis(VirtualKeyCode::E, VirtualKeyCode::Q);
    if move_dir.length_squared() > f32::EPSILON {
      transform.translation += self.move_speed * dt * move_dir.normalize();
    }
  }
}

/// Into `[-PI, PI)`
fn wrap_angle(angle: f32) -> f32 {
  (angle + PI).rem_euclid(TAU) - PI
}
