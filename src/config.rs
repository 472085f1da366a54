use std::path::PathBuf;

use ash::vk;
use glam::{vec3, Vec3, Vec4};

#[derive(Clone, Debug)]
pub struct CameraConfig {
  pub position: Vec3,
  /// Euler angles in radians, applied Y then X then Z
  pub rotation: Vec3,
  pub fov_dgr: f32,
  pub z_near: f32,
  pub z_far: f32,
  /// Units per second
  pub move_speed: f32,
  /// Radians per second
  pub look_speed: f32,
}

impl Default for CameraConfig {
  fn default() -> Self {
    Self {
      position: vec3(0.0, -0.5, -2.5),
      rotation: Vec3::ZERO,
      fov_dgr: 45.0,
      z_near: 0.1,
      z_far: 100.0,
      move_speed: 3.0,
      look_speed: 1.5,
    }
  }
}

/// Compiled SPIR-V binaries. Compile with:
/// `glslangValidator -V shaders/pbr.vert -o assets/shaders/pbr.vert.spv`
#[derive(Clone, Debug)]
pub struct ShaderPaths {
  pub pbr_vert: PathBuf,
  pub pbr_frag: PathBuf,
  pub irradiance_comp: PathBuf,
  pub basic_vert: PathBuf,
  pub basic_frag: PathBuf,
  pub point_light_vert: PathBuf,
  pub point_light_frag: PathBuf,
  pub tonemap_vert: PathBuf,
  pub tonemap_frag: PathBuf,
}

impl ShaderPaths {
  fn in_dir(dir: &str) -> Self {
    let path = |name: &str| PathBuf::from(dir).join(name);
    Self {
      pbr_vert: path("pbr.vert.spv"),
      pbr_frag: path("pbr.frag.spv"),
      irradiance_comp: path("irmap.comp.spv"),
      basic_vert: path("basic.vert.spv"),
      basic_frag: path("basic.frag.spv"),
      point_light_vert: path("point_light.vert.spv"),
      point_light_frag: path("point_light.frag.spv"),
      tonemap_vert: path("tonemap.vert.spv"),
      tonemap_frag: path("tonemap.frag.spv"),
    }
  }
}

/// Render system used for meshes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingModel {
  Pbr,
  /// Blinn-Phong, diffuse map only
  Basic,
}

/// Files the demo scene is built from
#[derive(Clone, Debug)]
pub struct SceneAssets {
  pub mesh: PathBuf,
  pub albedo: PathBuf,
  pub normal: PathBuf,
  pub roughness: PathBuf,
  pub metallic: PathBuf,
  /// Filtered into an irradiance map by the PBR compute pass every frame.
  /// Ignored by `ShadingModel::Basic`.
  pub env_map: Option<PathBuf>,
  pub model_scale: f32,
}

#[derive(Clone, Debug)]
pub struct Config {
  pub window_title: String,
  pub window_width: f64,
  pub window_height: f64,
  /// Validation layers + debug messenger
  pub graphics_debugging: bool,
  pub log_level: log::LevelFilter,
  pub frames_in_flight: usize,
  // clear values
  pub clear_color: Vec4,
  pub clear_depth: f32,
  pub clear_stencil: u32,
  /// w is intensity
  pub ambient_light: Vec4,
  /// Point lights orbit the y axis at this speed (radians per second), 0 to disable
  pub light_rotation_speed: f32,
  pub shading_model: ShadingModel,
  pub camera: CameraConfig,
  pub shaders: ShaderPaths,
  pub scene: SceneAssets,
}

impl Config {
  pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

  pub fn new() -> Config {
    Config {
      window_title: "rs-vk-pbr".to_string(),
      window_width: 800f64,
      window_height: 600f64,
      graphics_debugging: cfg!(debug_assertions),
      log_level: if cfg!(debug_assertions) {
        log::LevelFilter::Trace
      } else {
        log::LevelFilter::Info
      },
      frames_in_flight: Self::MAX_FRAMES_IN_FLIGHT,
      clear_color: Vec4::new(0.01, 0.01, 0.01, 1.0),
      clear_depth: 1.0,
      clear_stencil: 0,
      ambient_light: Vec4::new(1.0, 1.0, 1.0, 0.02),
      light_rotation_speed: 0.5,
      shading_model: ShadingModel::Pbr,
      camera: CameraConfig::default(),
      shaders: ShaderPaths::in_dir("assets/shaders"),
      scene: SceneAssets {
        mesh: PathBuf::from("assets/models/sphere.obj"),
        albedo: PathBuf::from("assets/textures/albedo.jpg"),
        normal: PathBuf::from("assets/textures/normal.jpg"),
        roughness: PathBuf::from("assets/textures/roughness.jpg"),
        metallic: PathBuf::from("assets/textures/metallic.jpg"),
        env_map: Some(PathBuf::from("assets/textures/environment.jpg")),
        model_scale: 0.5,
      },
    }
  }

  pub fn clear_color(&self) -> vk::ClearValue {
    let cc = self.clear_color;
    vk::ClearValue {
      color: vk::ClearColorValue {
        float32: [cc.x, cc.y, cc.z, cc.w],
      },
    }
  }

  pub fn clear_depth_stencil(&self) -> vk::ClearValue {
    vk::ClearValue {
      depth_stencil: vk::ClearDepthStencilValue {
        depth: self.clear_depth,
        stencil: self.clear_stencil,
      },
    }
  }

  /// One per attachment of the main render pass, same order
  pub fn clear_values(&self) -> Vec<vk::ClearValue> {
    vec![
      self.clear_color(),
      self.clear_depth_stencil(),
      self.clear_color(),
    ]
  }
}
