/*!
# USD Viewer - Vulkan Backend

Window system and imaging engine for the `usd_viewer` control flow.

- [`WinitWindowSystem`] implements `WindowSystem` on a winit event loop and
  presents frames through a Vulkan swapchain ([`VulkanPresenter`]).
- [`SoftwareImagingEngine`] implements `ImagingEngine` by rasterizing the
  stage's meshes on the CPU into the framebuffer shared with the window.

Vulkan validation layers are available behind the `vulkan-validation`
feature; their messages go to the viewer log.

```no_run
use usd_viewer_renderer_vulkan::{PresenterConfig, SoftwareImagingEngine, WinitWindowSystem};

let window_system = WinitWindowSystem::new(PresenterConfig::default());
let engine = SoftwareImagingEngine::new(window_system.framebuffer());
```
*/

mod framebuffer;
mod rasterizer;
mod software_imaging_engine;
mod vulkan_context;
mod vulkan_presenter;
mod vulkan_swapchain;
mod winit_window_system;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use framebuffer::{unorm8, Framebuffer, SharedFramebuffer, CLEAR_DEPTH};
pub use rasterizer::{draw_triangle, ClipVertex};
pub use software_imaging_engine::{Aov, RenderStats, SoftwareImagingEngine};
pub use vulkan_presenter::{PresenterConfig, VulkanPresenter, MAX_FRAMES_IN_FLIGHT};
pub use vulkan_swapchain::PixelLayout;
pub use winit_window_system::{FramebufferSurface, PresentTarget, WinitWindowSystem};

#[cfg(feature = "vulkan-validation")]
pub use debug::{validation_stats, ValidationStats};
