use ash::vk;
use glam::Mat3;
use log::{error, info, trace};

use crate::app_input::AppInput;
use crate::app_timer::FrameTimer;
use crate::config::Config;
use crate::error::{EngineResult, VkResultExt};
use crate::render_systems::{
  MeshRenderSystem, PointLightSystem, RenderSystem, TonemapRenderSystem,
};
use crate::renderer::{FrameDescriptorPools, FrameInfo, GlobalDescriptors, GlobalUbo, Renderer};
use crate::scene::{Camera, GameObjectManager, KeyboardMovementController, TransformComponent};
use crate::vk_ctx::GpuDeviceRef;
use crate::window::AppWindow;

/// Owns the renderer, the render systems and the scene. `draw_frame` runs one
/// iteration of the main loop: update phase first, then recording.
pub struct App {
  device: GpuDeviceRef,
  config: Config,
  renderer: Renderer,
  global_descriptors: GlobalDescriptors,
  frame_pools: FrameDescriptorPools,
  mesh_system: MeshRenderSystem,
  point_light_system: PointLightSystem,
  tonemap_system: TonemapRenderSystem,
  game_objects: GameObjectManager,
  camera: Camera,
  /// Camera position + orientation, driven by `controller`
  viewer: TransformComponent,
  controller: KeyboardMovementController,
  timer: FrameTimer,
}

impl App {
  pub fn new(device: &GpuDeviceRef, window: &dyn AppWindow, config: Config) -> EngineResult<Self> {
    let frames_in_flight = config.frames_in_flight;
    let renderer = Renderer::new(device, window, &config)?;
    let global_descriptors = GlobalDescriptors::new(device, frames_in_flight)?;
    let frame_pools = FrameDescriptorPools::new(device, frames_in_flight)?;

    // pipelines stay valid across swapchain recreation, formats never change
    let render_pass = renderer.render_pass();
    let global_layout = global_descriptors.layout();
    let mesh_system = MeshRenderSystem::new(
      device,
      render_pass,
      global_layout,
      &config.shaders,
      config.shading_model,
    )?;
    let point_light_system =
      PointLightSystem::new(device, render_pass, global_layout, &config.shaders)?;
    let tonemap_system = TonemapRenderSystem::new(device, render_pass, &config.shaders)?;

    let game_objects =
      GameObjectManager::new(device, frames_in_flight).context("Allocate game object buffers")?;
    let viewer = TransformComponent {
      translation: config.camera.position,
      rotation: config.camera.rotation,
      ..Default::default()
    };
    let controller = KeyboardMovementController::new(&config.camera);
    info!("App initialized ({:?} shading)", config.shading_model);

    Ok(Self {
      device: device.clone(),
      config,
      renderer,
      global_descriptors,
      frame_pools,
      mesh_system,
      point_light_system,
      tonemap_system,
      game_objects,
      camera: Camera::default(),
      viewer,
      controller,
      timer: FrameTimer::new(),
    })
  }

  pub fn game_objects_mut(&mut self) -> &mut GameObjectManager {
    &mut self.game_objects
  }

  pub fn renderer(&self) -> &Renderer {
    &self.renderer
  }

  /// Everything that mutates the scene. Must run before recording starts.
  fn update(&mut self, input: &AppInput, dt: f32) {
    self
      .controller
      .move_in_plane_xz(input, dt, &mut self.viewer);
    self
      .camera
      .set_view_yxz(self.viewer.translation, self.viewer.rotation);

    let speed = self.config.light_rotation_speed;
    if speed != 0.0 {
      // orbit around world up, which is -y
      let rotate_light = Mat3::from_rotation_y(-speed * dt);
      self
        .game_objects
        .iter_mut()
        .filter(|obj| obj.point_light.is_some())
        .for_each(|obj| obj.transform.translation = rotate_light * obj.transform.translation);
    }
  }

  pub fn draw_frame(&mut self, window: &mut dyn AppWindow, input: &AppInput) -> EngineResult<()> {
    let dt = self.timer.mark_start_frame();
    self.update(input, dt);

    let command_buffer = match self.renderer.begin_frame(window)? {
      Some(command_buffer) => command_buffer,
      None => {
        trace!("Frame {} skipped", self.timer.frame_idx());
        return Ok(());
      }
    };

    match self.record_frame(command_buffer, dt) {
      Ok(()) => self.renderer.end_frame(window),
      Err(e) => {
        // keep the renderer usable, the recording error is what the caller sees
        if let Err(abort_err) = self.renderer.abort_frame(window) {
          error!("Could not abort frame: {}", abort_err);
        }
        Err(e)
      }
    }
  }

  fn record_frame(&mut self, command_buffer: vk::CommandBuffer, dt: f32) -> EngineResult<()> {
    // after begin_frame, the swapchain (and its aspect) may have been recreated
    let cam_cfg = &self.config.camera;
    self.camera.set_perspective_projection(
      cam_cfg.fov_dgr.to_radians(),
      self.renderer.aspect_ratio(),
      cam_cfg.z_near,
      cam_cfg.z_far,
    );

    let frame_index = self.renderer.frame_index();
    let frame_pool = self.frame_pools.begin_frame(frame_index)?;
    let frame = FrameInfo {
      frame_index,
      frame_time: dt,
      command_buffer,
      camera: &self.camera,
      global_descriptor_set: self.global_descriptors.set(frame_index),
      frame_pool,
      game_objects: &self.game_objects,
      main_color_view: self.renderer.main_color_view(),
    };

    // per-frame data
    let mut ubo = GlobalUbo {
      projection: *self.camera.projection(),
      view: *self.camera.view(),
      inverse_view: *self.camera.inverse_view(),
      ambient_light_color: self.config.ambient_light,
      ..Default::default()
    };
    self.point_light_system.update(&frame, &mut ubo);
    self.global_descriptors.write_ubo(frame_index, &ubo);
    self.game_objects.update_buffer(frame_index);

    // compute, dispatch is not allowed inside a render pass
    self.mesh_system.compute(&frame)?;

    // render
    self.renderer.begin_render_pass(command_buffer);
    self.mesh_system.render(&frame)?;
    self.point_light_system.render(&frame)?;
    self.renderer.next_subpass(command_buffer);
    self.tonemap_system.render(&frame)?;
    self.renderer.end_render_pass(command_buffer);
    Ok(())
  }
}

impl Drop for App {
  fn drop(&mut self) {
    // resources below are still in use by the last frames in flight
    if let Err(e) = self.device.wait_idle() {
      error!("vkDeviceWaitIdle failed on exit: {}", e);
    }
  }
}
