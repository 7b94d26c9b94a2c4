/// VulkanContext - instance, surface, device and allocator of one window
///
/// Owns every Vulkan object that lives as long as the window: the instance
/// (plus the validation messenger when enabled), the window surface, the
/// logical device with its graphics/present queue and the GPU allocator.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::Mutex;
use usd_viewer::{viewer_debug, viewer_err, viewer_error, viewer_info, Error, Result};

use crate::vulkan_presenter::PresenterConfig;

pub struct VulkanContext {
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,

    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,

    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Queue used for both the copy and presentation
    pub(crate) queue: vk::Queue,
    pub(crate) queue_family: u32,

    /// Dropped before the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

fn init_failed(message: String) -> Error {
    viewer_error!("usd_viewer::vulkan", "{}", message);
    Error::InitializationFailed(message)
}

impl VulkanContext {
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &PresenterConfig,
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_failed(format!("Failed to load Vulkan library: {:?}", e)))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_failed(format!("Invalid application name: {}", e)))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"usd_viewer")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_1);

            let display_handle = window
                .display_handle()
                .map_err(|e| init_failed(format!("Failed to get display handle: {}", e)))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed(format!("Failed to get required extensions: {}", e)))?
                .to_vec();

            let enable_validation = validation_requested(config);
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed(format!("Failed to create Vulkan instance: {:?}", e)))?;

            let (debug_utils_loader, debug_messenger) = if enable_validation {
                let (loader, messenger) = create_debug_messenger(&entry, &instance)?;
                (Some(loader), Some(messenger))
            } else {
                (None, None)
            };

            let window_handle = window
                .window_handle()
                .map_err(|e| init_failed(format!("Failed to get window handle: {}", e)))?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_failed(format!("Failed to create surface: {:?}", e)))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let (physical_device, queue_family) =
                pick_physical_device(&instance, &surface_loader, surface)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());
            viewer_info!("usd_viewer::vulkan", "Using GPU '{}'", device_name);

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];
            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_failed(format!("Failed to create logical device: {:?}", e)))?;
            let queue = device.get_device_queue(queue_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_failed(format!("Failed to create GPU allocator: {:?}", e)))?;

            viewer_debug!(
                "usd_viewer::vulkan",
                "Vulkan context ready (queue family {}, validation {})",
                queue_family,
                enable_validation
            );

            Ok(Self {
                _entry: entry,
                instance,
                surface,
                surface_loader,
                physical_device,
                device,
                queue,
                queue_family,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                debug_utils_loader,
                debug_messenger,
            })
        }
    }

    pub(crate) fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| viewer_err!("usd_viewer::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

/// First device with a queue family that supports both graphics and
/// presentation to `surface`.
unsafe fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32)> {
    let physical_devices = instance
        .enumerate_physical_devices()
        .map_err(|e| init_failed(format!("Failed to enumerate physical devices: {:?}", e)))?;

    for physical_device in physical_devices {
        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let family = (0..queue_families.len() as u32).find(|&i| {
            queue_families[i as usize].queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && surface_loader
                    .get_physical_device_surface_support(physical_device, i, surface)
                    .unwrap_or(false)
        });
        if let Some(family) = family {
            return Ok((physical_device, family));
        }
    }
    Err(init_failed("No GPU can present to the window surface".to_string()))
}

#[cfg(feature = "vulkan-validation")]
fn validation_requested(config: &PresenterConfig) -> bool {
    config.enable_validation
}

#[cfg(not(feature = "vulkan-validation"))]
fn validation_requested(config: &PresenterConfig) -> bool {
    if config.enable_validation {
        usd_viewer::viewer_warn!(
            "usd_viewer::vulkan",
            "Validation requested but the 'vulkan-validation' feature is disabled"
        );
    }
    false
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
    crate::debug::reset_validation_stats();

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

    let messenger = debug_utils
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| init_failed(format!("Failed to create debug messenger: {:?}", e)))?;
    Ok((debug_utils, messenger))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _entry: &ash::Entry,
    _instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    Err(init_failed("Validation support is not compiled in".to_string()))
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Allocator pages must be freed while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                #[cfg(feature = "vulkan-validation")]
                crate::debug::log_validation_summary();
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
