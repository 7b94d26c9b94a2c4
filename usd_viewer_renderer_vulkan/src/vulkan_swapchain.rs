/// Swapchain - presentable images of the window surface
///
/// Images are only written by transfer (`TRANSFER_DST`): the presenter copies
/// the CPU framebuffer into them. Recreated on resize and whenever the surface
/// reports out of date or suboptimal.

use ash::vk;
use usd_viewer::{viewer_debug, viewer_err, viewer_error, Error, Result};

use crate::vulkan_context::VulkanContext;

/// Byte order the framebuffer must be copied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba,
    Bgra,
}

impl PixelLayout {
    pub fn from_vk_format(format: vk::Format) -> Option<Self> {
        match format {
            vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_SRGB => Some(PixelLayout::Rgba),
            vk::Format::B8G8R8A8_UNORM | vk::Format::B8G8R8A8_SRGB => Some(PixelLayout::Bgra),
            _ => None,
        }
    }
}

/// Preferred surface format: 8-bit UNORM (the framebuffer holds final
/// values), then 8-bit sRGB, in RGBA or BGRA order.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    const PREFERRED: [vk::Format; 4] = [
        vk::Format::B8G8R8A8_UNORM,
        vk::Format::R8G8B8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB,
        vk::Format::R8G8B8A8_SRGB,
    ];
    PREFERRED
        .iter()
        .find_map(|wanted| formats.iter().find(|f| f.format == *wanted))
        .copied()
}

/// Surface extent, or the window size clamped to the surface limits when the
/// surface lets the swapchain decide.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more image than the minimum, within the surface maximum (0 = none).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

pub struct Swapchain {
    device: ash::Device,
    loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::SurfaceFormatKHR,
    layout: PixelLayout,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for a `width` x `height` window, retiring `old`.
    pub fn new(ctx: &VulkanContext, width: u32, height: u32, old: Option<&Swapchain>) -> Result<Self> {
        unsafe {
            let capabilities = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| swapchain_error(format!("Failed to get surface capabilities: {:?}", e)))?;

            if !capabilities.supported_usage_flags.contains(vk::ImageUsageFlags::TRANSFER_DST) {
                return Err(swapchain_error(
                    "Surface images do not support transfer writes".to_string(),
                ));
            }

            let formats = ctx
                .surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
                .map_err(|e| swapchain_error(format!("Failed to query surface formats: {:?}", e)))?;
            let format = choose_surface_format(&formats).ok_or_else(|| {
                swapchain_error(format!("No 8-bit RGBA surface format among {} formats", formats.len()))
            })?;
            let layout = PixelLayout::from_vk_format(format.format).ok_or_else(|| {
                swapchain_error(format!("Unsupported surface format {:?}", format.format))
            })?;

            let extent = choose_extent(&capabilities, width, height);

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(ctx.surface)
                .min_image_count(choose_image_count(&capabilities))
                .image_format(format.format)
                .image_color_space(format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old.map_or(vk::SwapchainKHR::null(), |s| s.swapchain));

            let loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
            let swapchain = loader
                .create_swapchain(&create_info, None)
                .map_err(|e| swapchain_error(format!("Failed to create swapchain: {:?}", e)))?;

            let images = match loader.get_swapchain_images(swapchain) {
                Ok(images) => images,
                Err(e) => {
                    loader.destroy_swapchain(swapchain, None);
                    return Err(swapchain_error(format!("Failed to get swapchain images: {:?}", e)));
                }
            };

            viewer_debug!(
                "usd_viewer::vulkan",
                "Swapchain {}x{} with {} images ({:?})",
                extent.width,
                extent.height,
                images.len(),
                format.format
            );

            Ok(Self {
                device: ctx.device.clone(),
                loader,
                swapchain,
                images,
                format,
                layout,
                extent,
            })
        }
    }

    /// Index of the next image, or `None` when the swapchain is out of date.
    ///
    /// The flag is set when the image is usable but the swapchain is
    /// suboptimal.
    pub fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<Option<(u32, bool)>> {
        unsafe {
            match self
                .loader
                .acquire_next_image(self.swapchain, u64::MAX, signal, vk::Fence::null())
            {
                Ok((index, suboptimal)) => Ok(Some((index, suboptimal))),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(None),
                Err(e) => Err(viewer_err!(
                    "usd_viewer::vulkan",
                    "Failed to acquire next swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    /// Queue `image_index` for presentation.
    ///
    /// Returns `true` when the swapchain must be recreated.
    pub fn present(&self, queue: vk::Queue, image_index: u32, wait: vk::Semaphore) -> Result<bool> {
        unsafe {
            let swapchains = [self.swapchain];
            let image_indices = [image_index];
            let wait_semaphores = [wait];

            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&wait_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            match self.loader.queue_present(queue, &present_info) {
                Ok(suboptimal) => Ok(suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
                Err(e) => Err(viewer_err!(
                    "usd_viewer::vulkan",
                    "Failed to present swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    pub fn image(&self, index: u32) -> Option<vk::Image> {
        self.images.get(index as usize).copied()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    pub fn pixel_layout(&self) -> PixelLayout {
        self.layout
    }
}

fn swapchain_error(message: String) -> Error {
    viewer_error!("usd_viewer::vulkan", "{}", message);
    Error::InitializationFailed(message)
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
