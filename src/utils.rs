use glam::{vec3, Vec3};

/// `rs_vk_pbr::render_systems::PbrRenderSystem` -> `PbrRenderSystem`
pub fn get_simple_type_name<T>() -> &'static str {
  let name = std::any::type_name::<T>();
  match name.rfind("::") {
    Some(idx) => &name[idx + 2..],
    None => name,
  }
}

/// Convert u8 [0..255) into float
pub fn color_u8_to_float(col_u8: u8) -> f32 {
  (col_u8 as f32) / 255.0
}

/// Convert u8 [0..255) into float vector
pub fn color_hex_to_vec(c0: u8, c1: u8, c2: u8) -> Vec3 {
  vec3(
    color_u8_to_float(c0),
    color_u8_to_float(c1),
    color_u8_to_float(c2),
  )
}

pub fn vec3_to_pretty_str(v: Vec3) -> String {
  format!("[{:.1}, {:.1}, {:.1}]", v.x, v.y, v.z)
}
