use glam::{vec3, Mat4, Vec3, Vec4};

/// Vulkan conventions: y points down, depth in `[0, 1]`, camera looks along +z.
///
/// Matrix math follows:
/// - https://matthewwellings.com/blog/the-new-vulkan-coordinate-system/
/// - https://www.saschawillems.de/blog/2019/03/29/flipping-the-vulkan-viewport/
pub struct Camera {
  projection_matrix: Mat4,
  view_matrix: Mat4,
  inverse_view_matrix: Mat4,
}

impl Default for Camera {
  fn default() -> Self {
    Self {
      projection_matrix: Mat4::IDENTITY,
      view_matrix: Mat4::IDENTITY,
      inverse_view_matrix: Mat4::IDENTITY,
    }
  }
}

impl Camera {
  pub fn set_orthographic_projection(
    &mut self,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    near: f32,
    far: f32,
  ) {
    self.projection_matrix = Mat4::from_cols(
      Vec4::new(2.0 / (right - left), 0.0, 0.0, 0.0),
      Vec4::new(0.0, 2.0 / (bottom - top), 0.0, 0.0),
      Vec4::new(0.0, 0.0, 1.0 / (far - near), 0.0),
      Vec4::new(
        -(right + left) / (right - left),
        -(bottom + top) / (bottom - top),
        -near / (far - near),
        1.0,
      ),
    );
  }

  /// - fovy: radians
  pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
    assert!(aspect.abs() > f32::EPSILON, "Camera aspect ratio cannot be 0");
    let tan_half_fovy = (fovy / 2.0).tan();
    self.projection_matrix = Mat4::from_cols(
      Vec4::new(1.0 / (aspect * tan_half_fovy), 0.0, 0.0, 0.0),
      Vec4::new(0.0, 1.0 / tan_half_fovy, 0.0, 0.0),
      Vec4::new(0.0, 0.0, far / (far - near), 1.0),
      Vec4::new(0.0, 0.0, -(far * near) / (far - near), 0.0),
    );
  }

  /// Orthonormal camera basis `u` (right), `v` (down), `w` (forward)
  fn set_view_from_basis(&mut self, u: Vec3, v: Vec3, w: Vec3, position: Vec3) {
    self.view_matrix = Mat4::from_cols(
      Vec4::new(u.x, v.x, w.x, 0.0),
      Vec4::new(u.y, v.y, w.y, 0.0),
      Vec4::new(u.z, v.z, w.z, 0.0),
      Vec4::new(-u.dot(position), -v.dot(position), -w.dot(position), 1.0),
    );
    self.inverse_view_matrix = Mat4::from_cols(
      u.extend(0.0),
      v.extend(0.0),
      w.extend(0.0),
      position.extend(1.0),
    );
  }

  pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
    let w = direction.normalize();
    let u = w.cross(up).normalize();
    let v = w.cross(u);
    self.set_view_from_basis(u, v, w, position);
  }

  pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
    self.set_view_direction(position, target - position, up);
  }

  /// Tait-Bryan angles, applied Y(1), X(2), Z(3)
  pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
    let (s3, c3) = rotation.z.sin_cos();
    let (s2, c2) = rotation.x.sin_cos();
    let (s1, c1) = rotation.y.sin_cos();
    let u = vec3(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1);
    let v = vec3(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3);
    let w = vec3(c2 * s1, -s2, c1 * c2);
    self.set_view_from_basis(u, v, w, position);
  }

  pub fn projection(&self) -> &Mat4 {
    &self.projection_matrix
  }

  pub fn view(&self) -> &Mat4 {
    &self.view_matrix
  }

  pub fn inverse_view(&self) -> &Mat4 {
    &self.inverse_view_matrix
  }

  pub fn position(&self) -> Vec3 {
    self.inverse_view_matrix.w_axis.truncate()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_vec_eq(a: Vec3, b: Vec3) {
    assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
  }

  #[test]
  fn inverse_view_inverts_view() {
    let mut camera = Camera::default();
    camera.set_view_yxz(vec3(1.0, -2.0, 3.0), vec3(0.3, -1.2, 0.1));
    let product = *camera.view() * *camera.inverse_view();
    assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    assert_vec_eq(camera.position(), vec3(1.0, -2.0, 3.0));
  }

  #[test]
  fn view_target_looks_along_positive_z() {
    let mut camera = Camera::default();
    let position = vec3(0.0, 0.0, -5.0);
    camera.set_view_target(position, Vec3::ZERO, vec3(0.0, -1.0, 0.0));
    // target ends up straight ahead
    let target_in_view = camera.view().transform_point3(Vec3::ZERO);
    assert_vec_eq(target_in_view, vec3(0.0, 0.0, 5.0));
  }

  #[test]
  fn perspective_maps_near_and_far_to_unit_depth() {
    let mut camera = Camera::default();
    camera.set_perspective_projection(50f32.to_radians(), 1.5, 0.1, 100.0);
    let near = camera.projection().project_point3(vec3(0.0, 0.0, 0.1));
    let far = camera.projection().project_point3(vec3(0.0, 0.0, 100.0));
    assert!(near.z.abs() < 1e-5);
    assert!((far.z - 1.0).abs() < 1e-5);
  }

  #[test]
  fn orthographic_maps_box_to_clip_volume() {
    let mut camera = Camera::default();
    camera.set_orthographic_projection(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0);
    let corner = camera.projection().transform_point3(vec3(2.0, 1.0, 10.0));
    assert_vec_eq(corner, vec3(1.0, 1.0, 1.0));
  }
}
