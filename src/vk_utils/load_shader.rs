use std::ffi::CStr;
use std::path::Path;

use log::trace;

use ash;
use ash::vk;

use crate::error::{EngineError, EngineResult, VkResultExt};

// https://github.com/zeux/niagara/blob/master/src/shaders.cpp

const SHADER_ENTRY_POINT: &[u8] = b"main\0";

fn load_shader_module(device: &ash::Device, path: &Path) -> EngineResult<vk::ShaderModule> {
  trace!("Loading shader from {}", path.to_string_lossy());

  let mut file = std::fs::File::open(path).map_err(|e| EngineError::Asset {
    path: path.to_path_buf(),
    reason: format!("could not open shader: {}", e),
  })?;
  let spirv_code = ash::util::read_spv(&mut file).map_err(|e| EngineError::Asset {
    path: path.to_path_buf(),
    reason: format!("not a valid SPIR-V binary: {}", e),
  })?;
  let create_info = vk::ShaderModuleCreateInfo::builder()
    .code(&spirv_code)
    .build();

  unsafe { device.create_shader_module(&create_info, None) }.context("vkCreateShaderModule")
}

/// Caller destroys the returned module once the pipeline is created
pub fn load_shader(
  device: &ash::Device,
  stage: vk::ShaderStageFlags,
  path: &Path,
) -> EngineResult<(vk::ShaderModule, vk::PipelineShaderStageCreateInfo)> {
  let shader_fn_name = unsafe { CStr::from_bytes_with_nul_unchecked(SHADER_ENTRY_POINT) };

  let shader_module = load_shader_module(device, path)?;

  let stage_info = vk::PipelineShaderStageCreateInfo::builder()
    .stage(stage)
    .module(shader_module)
    .name(shader_fn_name)
    .build();
  trace!("Shader {:?} loaded from {}", stage, path.to_string_lossy());

  Ok((shader_module, stage_info))
}
