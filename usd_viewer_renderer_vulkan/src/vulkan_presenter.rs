/// VulkanPresenter - shows the CPU framebuffer in the window
///
/// Each `present` copies the framebuffer into a host-visible staging buffer,
/// records a buffer-to-image copy into the acquired swapchain image and
/// presents it. Two frames may be in flight; each has its own command buffer,
/// fence, acquire semaphore and staging buffer.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use usd_viewer::{viewer_debug, viewer_err, viewer_trace, Result};

use crate::framebuffer::Framebuffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_swapchain::{PixelLayout, Swapchain};

pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Presenter creation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterConfig {
    /// Enable `VK_LAYER_KHRONOS_validation` (needs the `vulkan-validation`
    /// feature)
    pub enable_validation: bool,
    pub app_name: String,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(all(debug_assertions, feature = "vulkan-validation")),
            app_name: "usd_view".to_string(),
        }
    }
}

struct StagingBuffer {
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

struct FrameResources {
    command_buffer: vk::CommandBuffer,
    in_flight: vk::Fence,
    image_available: vk::Semaphore,
    staging: Option<StagingBuffer>,
}

pub struct VulkanPresenter {
    frames: Vec<FrameResources>,
    /// One per swapchain image
    render_finished: Vec<vk::Semaphore>,
    command_pool: vk::CommandPool,
    current_frame: usize,
    needs_recreate: bool,
    window_size: (u32, u32),
    frames_presented: u64,
    /// Declared before `ctx`: destroyed while the device is alive
    swapchain: Option<Swapchain>,
    ctx: VulkanContext,
}

impl VulkanPresenter {
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &PresenterConfig,
        size: (u32, u32),
    ) -> Result<Self> {
        let ctx = VulkanContext::new(window, config)?;
        let swapchain = Swapchain::new(&ctx, size.0, size.1, None)?;

        let mut presenter = Self {
            frames: Vec::with_capacity(MAX_FRAMES_IN_FLIGHT),
            render_finished: Vec::new(),
            command_pool: vk::CommandPool::null(),
            current_frame: 0,
            needs_recreate: false,
            window_size: size,
            frames_presented: 0,
            swapchain: Some(swapchain),
            ctx,
        };
        presenter.create_frame_resources()?;
        presenter.create_render_finished_semaphores()?;

        viewer_debug!(
            "usd_viewer::vulkan",
            "Presenter ready for a {}x{} window",
            size.0,
            size.1
        );
        Ok(presenter)
    }

    fn create_frame_resources(&mut self) -> Result<()> {
        let device = &self.ctx.device;
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(self.ctx.queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            self.command_pool = device
                .create_command_pool(&pool_info, None)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to create command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(MAX_FRAMES_IN_FLIGHT as u32);
            let command_buffers = device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to allocate command buffers: {:?}", e))?;

            let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            let semaphore_info = vk::SemaphoreCreateInfo::default();

            for command_buffer in command_buffers {
                let in_flight = device
                    .create_fence(&fence_info, None)
                    .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to create frame fence: {:?}", e))?;
                let image_available = match device.create_semaphore(&semaphore_info, None) {
                    Ok(semaphore) => semaphore,
                    Err(e) => {
                        device.destroy_fence(in_flight, None);
                        return Err(viewer_err!(
                            "usd_viewer::vulkan",
                            "Failed to create image-available semaphore: {:?}",
                            e
                        ));
                    }
                };
                self.frames.push(FrameResources {
                    command_buffer,
                    in_flight,
                    image_available,
                    staging: None,
                });
            }
        }
        Ok(())
    }

    fn create_render_finished_semaphores(&mut self) -> Result<()> {
        let count = self.swapchain.as_ref().map_or(0, Swapchain::image_count);
        unsafe {
            for &semaphore in &self.render_finished {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
            self.render_finished.clear();

            let semaphore_info = vk::SemaphoreCreateInfo::default();
            for _ in 0..count {
                let semaphore = self
                    .ctx
                    .device
                    .create_semaphore(&semaphore_info, None)
                    .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to create render-finished semaphore: {:?}", e))?;
                self.render_finished.push(semaphore);
            }
        }
        Ok(())
    }

    /// Request a swapchain matching the new window size before the next
    /// present.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != self.window_size {
            self.window_size = (width, height);
            self.needs_recreate = true;
        }
    }

    fn recreate_swapchain(&mut self) -> Result<()> {
        self.ctx.wait_idle()?;
        let (width, height) = self.window_size;
        let swapchain = Swapchain::new(&self.ctx, width, height, self.swapchain.as_ref())?;
        // Old swapchain is destroyed here, after the new one retired it
        self.swapchain = Some(swapchain);
        self.create_render_finished_semaphores()?;
        self.needs_recreate = false;
        Ok(())
    }

    /// Show `framebuffer`. A zero-sized framebuffer (minimized window) or an
    /// out-of-date swapchain skips the frame.
    pub fn present(&mut self, framebuffer: &Framebuffer) -> Result<()> {
        let (width, height) = framebuffer.size();
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.resize(width, height);
        if self.needs_recreate {
            self.recreate_swapchain()?;
        }

        let frame_index = self.current_frame;
        let (in_flight, image_available) = {
            let frame = &self.frames[frame_index];
            (frame.in_flight, frame.image_available)
        };

        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[in_flight], true, u64::MAX)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to wait for frame fence: {:?}", e))?;
        }

        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| viewer_err!("usd_viewer::vulkan", "Presenter has no swapchain"))?;
        let Some((image_index, suboptimal)) = swapchain.acquire_next_image(image_available)? else {
            viewer_debug!("usd_viewer::vulkan", "Swapchain out of date, skipping frame");
            self.needs_recreate = true;
            return Ok(());
        };
        let image = swapchain
            .image(image_index)
            .ok_or_else(|| viewer_err!("usd_viewer::vulkan", "Swapchain image {} out of range", image_index))?;
        let extent = swapchain.extent();
        let layout = swapchain.pixel_layout();

        let pixels = match layout {
            PixelLayout::Rgba => framebuffer.color_bytes().to_vec(),
            PixelLayout::Bgra => framebuffer.color_bytes_bgra(),
        };
        let staging_buffer = self.upload(frame_index, &pixels)?;

        let render_finished = self
            .render_finished
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| viewer_err!("usd_viewer::vulkan", "No semaphore for swapchain image {}", image_index))?;

        let command_buffer = self.frames[frame_index].command_buffer;
        let copy = CopyRegion {
            width: width.min(extent.width),
            height: height.min(extent.height),
            row_length: width,
        };
        self.record_copy(command_buffer, staging_buffer, image, copy, framebuffer.clear_color())?;

        unsafe {
            let wait_semaphores = [image_available];
            let wait_stages = [vk::PipelineStageFlags::TRANSFER];
            let command_buffers = [command_buffer];
            let signal_semaphores = [render_finished];
            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            // Reset fence once recording succeeded
            self.ctx
                .device
                .reset_fences(&[in_flight])
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to reset frame fence: {:?}", e))?;
            self.ctx
                .device
                .queue_submit(self.ctx.queue, &[submit_info], in_flight)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to submit frame copy: {:?}", e))?;
        }

        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| viewer_err!("usd_viewer::vulkan", "Presenter has no swapchain"))?;
        let out_of_date = swapchain.present(self.ctx.queue, image_index, render_finished)?;
        if out_of_date || suboptimal {
            self.needs_recreate = true;
        }

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
        self.frames_presented += 1;
        viewer_trace!(
            "usd_viewer::vulkan",
            "Presented frame {} ({}x{} into image {})",
            self.frames_presented,
            width,
            height,
            image_index
        );
        Ok(())
    }

    /// Copy `pixels` into the staging buffer of `frame_index`, growing it
    /// when too small.
    fn upload(&mut self, frame_index: usize, pixels: &[u8]) -> Result<vk::Buffer> {
        let size = pixels.len() as u64;
        let too_small = self.frames[frame_index]
            .staging
            .as_ref()
            .map_or(true, |staging| staging.size < size);
        if too_small {
            if let Some(old) = self.frames[frame_index].staging.take() {
                self.destroy_staging(old);
            }
            let staging = self.create_staging(size)?;
            self.frames[frame_index].staging = Some(staging);
        }

        let staging = self.frames[frame_index]
            .staging
            .as_mut()
            .ok_or_else(|| viewer_err!("usd_viewer::vulkan", "Missing staging buffer"))?;
        let mapped = staging
            .allocation
            .as_mut()
            .and_then(Allocation::mapped_slice_mut)
            .ok_or_else(|| viewer_err!("usd_viewer::vulkan", "Staging buffer is not mapped"))?;
        mapped[..pixels.len()].copy_from_slice(pixels);
        Ok(staging.buffer)
    }

    fn create_staging(&self, size: u64) -> Result<StagingBuffer> {
        let device = &self.ctx.device;
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = device
                .create_buffer(&create_info, None)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to create staging buffer: {:?}", e))?;
            let requirements = device.get_buffer_memory_requirements(buffer);

            let allocation = {
                let mut allocator = self
                    .ctx
                    .allocator
                    .lock()
                    .map_err(|_| viewer_err!("usd_viewer::vulkan", "GPU allocator lock poisoned"))?;
                allocator.allocate(&AllocationCreateDesc {
                    name: "framebuffer_staging_buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(viewer_err!(
                        "usd_viewer::vulkan",
                        "Out of GPU memory for a {:.2} MB staging buffer: {:?}",
                        size as f64 / (1024.0 * 1024.0),
                        e
                    ));
                }
            };

            let staging = StagingBuffer { buffer, allocation: Some(allocation), size };
            let bound = staging
                .allocation
                .as_ref()
                .map(|a| device.bind_buffer_memory(buffer, a.memory(), a.offset()));
            if let Some(Err(e)) = bound {
                self.destroy_staging(staging);
                return Err(viewer_err!("usd_viewer::vulkan", "Failed to bind staging buffer memory: {:?}", e));
            }
            viewer_debug!("usd_viewer::vulkan", "Staging buffer of {} bytes", size);
            Ok(staging)
        }
    }

    fn destroy_staging(&self, mut staging: StagingBuffer) {
        unsafe {
            if let Some(allocation) = staging.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(staging.buffer, None);
        }
    }

    fn record_copy(
        &self,
        command_buffer: vk::CommandBuffer,
        staging_buffer: vk::Buffer,
        image: vk::Image,
        copy: CopyRegion,
        clear_color: [u8; 4],
    ) -> Result<()> {
        let device = &self.ctx.device;
        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };

        unsafe {
            device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to reset command buffer: {:?}", e))?;
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to begin command buffer: {:?}", e))?;

            // UNDEFINED -> TRANSFER_DST_OPTIMAL
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            // Pixels outside a smaller framebuffer keep the clear color
            let clear_value = vk::ClearColorValue {
                float32: clear_color.map(|c| f32::from(c) / 255.0),
            };
            device.cmd_clear_color_image(
                command_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &clear_value,
                &[range],
            );

            let clear_to_copy = vk::MemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[clear_to_copy],
                &[],
                &[],
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(copy.row_length)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: copy.width,
                    height: copy.height,
                    depth: 1,
                });
            device.cmd_copy_buffer_to_image(
                command_buffer,
                staging_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            // TRANSFER_DST_OPTIMAL -> PRESENT_SRC_KHR
            let to_present = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::empty());
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_present],
            );

            device
                .end_command_buffer(command_buffer)
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        Ok(())
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn swapchain_extent(&self) -> Option<(u32, u32)> {
        self.swapchain
            .as_ref()
            .map(|s| (s.extent().width, s.extent().height))
    }

    pub fn validation_enabled(&self) -> bool {
        self.ctx.validation_enabled()
    }
}

/// Texel rectangle copied from the staging buffer, anchored at the origin.
#[derive(Debug, Clone, Copy)]
struct CopyRegion {
    width: u32,
    height: u32,
    /// Staging buffer row pitch in texels
    row_length: u32,
}

impl Drop for VulkanPresenter {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            let frames = std::mem::take(&mut self.frames);
            for mut frame in frames {
                if let Some(staging) = frame.staging.take() {
                    self.destroy_staging(staging);
                }
                self.ctx.device.destroy_fence(frame.in_flight, None);
                self.ctx.device.destroy_semaphore(frame.image_available, None);
            }
            for &semaphore in &self.render_finished {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
            if self.command_pool != vk::CommandPool::null() {
                self.ctx.device.destroy_command_pool(self.command_pool, None);
            }
        }
        viewer_debug!(
            "usd_viewer::vulkan",
            "Presenter destroyed after {} frames",
            self.frames_presented
        );
    }
}

impl std::fmt::Debug for VulkanPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanPresenter")
            .field("window_size", &self.window_size)
            .field("current_frame", &self.current_frame)
            .field("frames_presented", &self.frames_presented)
            .finish()
    }
}
