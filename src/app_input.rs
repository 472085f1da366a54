use std::collections::HashSet;

use log::info;
use winit::event::{ElementState, VirtualKeyCode, WindowEvent};

/// Other implementations:
/// * https://github.com/rukai/winit_input_helper/blob/main/src/current_input.rs
pub struct AppInput {
  pub close_requested: bool,
  pub key_held: HashSet<VirtualKeyCode>,
}

impl AppInput {
  pub fn new() -> Self {
    Self {
      close_requested: false,
      key_held: HashSet::new(),
    }
  }

  pub fn handle_window_event(&mut self, event: &WindowEvent) {
    match event {
      // on clicked 'x'
      WindowEvent::CloseRequested => {
        self.close_requested = true;
      }
      WindowEvent::KeyboardInput { input, .. } => match (input.state, input.virtual_keycode) {
        (_, Some(VirtualKeyCode::Escape)) => {
          self.close_requested = true;
        }
        (ElementState::Pressed, Some(key)) => {
          self.key_held.insert(key);
        }
        (ElementState::Released, Some(key)) => {
          self.key_held.remove(&key);
        }
        _ => {}
      },
      // keys released while unfocused never reach us
      WindowEvent::Focused(false) => {
        info!("Window lost focus, releasing held keys");
        self.key_held.clear();
      }
      _ => {}
    }
  }

  /// `Winit` emits `KEY_PRESS`, waits 0.5s and only then starts repeating it
  /// while the key is held. Query this per frame instead of reacting to the
  /// events, or the camera stutters for the first 0.5s.
  pub fn is_pressed(&self, key: VirtualKeyCode) -> bool {
    self.key_held.contains(&key)
  }
}
