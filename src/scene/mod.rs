use std::path::Path;
use std::rc::Rc;

use ash::vk;
use glam::{vec3, Vec3};
use log::info;

use crate::assets::{load_image, load_mesh};
use crate::config::{Config, ShadingModel};
use crate::error::{EngineResult, VkResultExt};
use crate::utils::{color_hex_to_vec, vec3_to_pretty_str};
use crate::vk_ctx::GpuDeviceRef;
use crate::vk_utils::{quad_vertices, Model, VkTexture};

pub use self::camera::*;
pub use self::game_object::*;
pub use self::keyboard_movement_controller::*;

mod camera;
mod game_object;
mod keyboard_movement_controller;

const FLOOR_SCALE: f32 = 6.0;
const LIGHT_RING_RADIUS: f32 = 1.5;

fn load_texture(
  device: &GpuDeviceRef,
  path: &Path,
  format: vk::Format,
) -> EngineResult<Rc<VkTexture>> {
  let image = load_image(path)?;
  let name = path.to_string_lossy();
  let texture =
    VkTexture::from_image_data(device, &name, &image, format).context("Upload texture")?;
  Ok(Rc::new(texture))
}

/// Demo scene: PBR mesh on a floor quad, lit by a ring of colored point lights
pub fn load_scene(
  device: &GpuDeviceRef,
  config: &Config,
  game_objects: &mut GameObjectManager,
) -> EngineResult<()> {
  let assets = &config.scene;

  let mesh = load_mesh(&assets.mesh)?;
  let mesh_name = assets.mesh.to_string_lossy();
  let model = Rc::new(
    Model::new(device, &mesh_name, &mesh.vertices, &mesh.indices).context("Upload mesh")?,
  );
  let raw = VkTexture::RAW_DATA_TEXTURE_FORMAT;
  let albedo = load_texture(device, &assets.albedo, VkTexture::COLOR_TEXTURE_FORMAT)?;
  let normal = load_texture(device, &assets.normal, raw)?;
  let roughness = load_texture(device, &assets.roughness, raw)?;
  let metallic = load_texture(device, &assets.metallic, raw)?;
  let env_map = match (&assets.env_map, config.shading_model) {
    (Some(path), ShadingModel::Pbr) => {
      let image = load_image(path)?;
      let texture = VkTexture::storage_from_image_data(device, &path.to_string_lossy(), &image)
        .context("Upload environment map")?;
      Some(Rc::new(texture))
    }
    _ => None,
  };

  let obj = game_objects.create_game_object();
  obj.model = Some(model);
  obj.transform.scale = Vec3::splat(assets.model_scale);
  obj.diffuse_map = albedo;
  obj.normal_map = normal;
  obj.roughness_map = roughness;
  obj.metallic_map = metallic;
  obj.env_map = env_map;

  let (vertices, indices) = quad_vertices();
  let floor_model =
    Rc::new(Model::new(device, "floor", &vertices, &indices).context("Upload mesh")?);
  let floor = game_objects.create_game_object();
  floor.model = Some(floor_model);
  floor.transform.translation = vec3(0.0, 0.5, 0.0);
  floor.transform.scale = Vec3::splat(FLOOR_SCALE);

  let light_colors = [
    color_hex_to_vec(255, 25, 25),
    color_hex_to_vec(25, 25, 255),
    color_hex_to_vec(25, 255, 25),
    color_hex_to_vec(255, 255, 25),
    color_hex_to_vec(25, 255, 255),
    color_hex_to_vec(255, 255, 255),
  ];
  let light_count = light_colors.len();
  for (i, color) in light_colors.iter().enumerate() {
    let angle = (i as f32) * std::f32::consts::TAU / (light_count as f32);
    let light =
      game_objects.make_point_light(DEFAULT_LIGHT_INTENSITY, DEFAULT_LIGHT_RADIUS, *color);
    light.transform.translation = vec3(
      angle.cos() * LIGHT_RING_RADIUS,
      -1.0,
      angle.sin() * LIGHT_RING_RADIUS,
    );
    info!(
      "Point light {} at {}",
      light.id(),
      vec3_to_pretty_str(light.transform.translation)
    );
  }

  info!("Scene loaded: {} game objects", game_objects.len());
  Ok(())
}
