use ash::prelude::VkResult;
use ash::vk;
use log::trace;

/// Record `callback` into `cmd_buf`, submit it and block until the queue is idle.
/// Only used outside of the frame loop (texture uploads during scene setup).
pub unsafe fn execute_setup_cmd_buf(
  device: &ash::Device,
  queue: vk::Queue,
  cmd_buf: vk::CommandBuffer,
  callback: impl FnOnce(&ash::Device, vk::CommandBuffer),
) -> VkResult<()> {
  // begin setup
  let cmd_buf_begin_info = vk::CommandBufferBeginInfo::builder()
    .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
    .build();
  // also resets command buffer
  device.begin_command_buffer(cmd_buf, &cmd_buf_begin_info)?;

  // execute
  callback(device, cmd_buf);

  // end+submit
  device.end_command_buffer(cmd_buf)?;
  let submit_info = vk::SubmitInfo::builder()
    .command_buffers(std::slice::from_ref(&cmd_buf))
    .build();
  device.queue_submit(queue, &[submit_info], vk::Fence::null())?;

  trace!("execute_setup_cmd_buf: queue_wait_idle");
  device.queue_wait_idle(queue)
}
