use std::rc::Rc;

use anyhow::Context;
use log::{error, info};
use winit::{
  dpi::LogicalSize,
  event::{Event, WindowEvent},
  event_loop::{ControlFlow, EventLoop},
  window::WindowBuilder,
};

use rs_vk_pbr::app::App;
use rs_vk_pbr::app_input::AppInput;
use rs_vk_pbr::config::Config;
use rs_vk_pbr::scene::load_scene;
use rs_vk_pbr::vk_ctx::{vk_ctx_initialize, GpuDeviceRef};
use rs_vk_pbr::window::WinitWindow;

fn main() -> anyhow::Result<()> {
  let config = Config::new();
  simple_logger::SimpleLogger::new()
    .with_level(config.log_level)
    .init()
    .context("Init logger")?;
  info!("-- Start --");

  // init window
  let event_loop = EventLoop::new();
  let window = WindowBuilder::new()
    .with_title(config.window_title.clone())
    .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
    .build(&event_loop)
    .context("Create window")?;
  let mut window = WinitWindow::new(window);

  // init renderer
  let device: GpuDeviceRef = Rc::new(
    vk_ctx_initialize(window.raw(), config.graphics_debugging)
      .context("Initialize Vulkan device")?,
  );
  info!("Render init went OK!");

  let mut app = App::new(&device, &window, config.clone()).context("Create renderer")?;
  load_scene(&device, &config, app.game_objects_mut()).context("Load scene")?;
  let mut input = AppInput::new();
  // `run` never returns, so everything has to be dropped by hand on exit
  let mut app = Some(app);
  let mut device = Some(device);

  info!("Starting event loop");
  event_loop.run(move |event, _, control_flow| {
    *control_flow = ControlFlow::Poll;

    match event {
      Event::WindowEvent { event, .. } => {
        window.handle_event(&event);
        input.handle_window_event(&event);
      }

      Event::MainEventsCleared => {
        if let Some(app) = app.as_mut() {
          if let Err(e) = app.draw_frame(&mut window, &input) {
            error!("Frame failed: {:?}", e);
            input.close_requested = true;
          }
        }
        if window.take_wait_request() {
          // minimized, nothing to draw until the next event
          *control_flow = ControlFlow::Wait;
        }
      }

      // before destroy
      Event::LoopDestroyed => {
        info!("EventLoop is shutting down");
        // app (and all GPU resources) before the device itself
        drop(app.take());
        drop(device.take());
      }

      _ => (),
    }

    if input.close_requested {
      *control_flow = ControlFlow::Exit;
    }
  });
}
