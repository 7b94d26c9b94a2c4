//! Window system seam: window setup, frame callbacks and the frame surface.

mod window_system;
#[cfg(test)]
pub(crate) mod mock_window_system;

pub use window_system::{
    ClearMask, DisplayMode, FrameCallbacks, FrameEvent, FrameHandler, FrameSurface, WindowId,
    WindowSystem,
};
