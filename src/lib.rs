pub mod app;
pub mod app_input;
pub mod app_timer;
pub mod assets;
pub mod config;
pub mod error;
pub mod render_systems;
pub mod renderer;
pub mod scene;
pub mod utils;
pub mod vk_ctx;
pub mod vk_utils;
pub mod window;
