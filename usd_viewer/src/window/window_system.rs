/// WindowSystem trait: window creation and the frame loop
///
/// The window system owns the event loop. Once `run_event_loop` is entered
/// it calls the registered `FrameHandler` callbacks with a `FrameSurface` for
/// the current frame until the window is closed.

use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Framebuffer configuration requested before the window is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayMode: u32 {
        /// RGBA color buffer
        const RGBA = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Double buffering (present on swap)
        const DOUBLE = 1 << 2;
    }
}

bitflags! {
    /// Which events invoke the frame handler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameCallbacks: u32 {
        /// Window needs redisplay
        const DISPLAY = 1 << 0;
        /// Event loop is idle
        const IDLE = 1 << 1;
    }
}

bitflags! {
    /// Buffers cleared at the start of a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Identifier of a created window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Event that triggered a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    Display,
    Idle,
}

/// The drawable of the current frame.
pub trait FrameSurface {
    /// Clear the selected buffers to the window's clear values.
    fn clear(&mut self, mask: ClearMask);

    /// Live drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Present the frame.
    fn swap_buffers(&mut self) -> Result<()>;
}

/// Frame callbacks invoked by the event loop.
pub trait FrameHandler {
    fn on_display(&mut self, surface: &mut dyn FrameSurface) -> Result<()>;

    fn on_idle(&mut self, surface: &mut dyn FrameSurface) -> Result<()>;
}

pub trait WindowSystem {
    fn init(&mut self) -> Result<()>;

    fn set_display_mode(&mut self, mode: DisplayMode);

    fn set_window_size(&mut self, width: u32, height: u32);

    fn set_window_position(&mut self, x: i32, y: i32);

    fn create_window(&mut self, title: &str) -> Result<WindowId>;

    /// RGBA clear color used by `FrameSurface::clear`.
    fn set_clear_color(&mut self, color: [f32; 4]);

    fn register_callbacks(&mut self, callbacks: FrameCallbacks);

    /// Run until the window is closed. Frame errors are logged and the loop
    /// continues; only failures of the loop itself are returned.
    fn run_event_loop(&mut self, handler: &mut dyn FrameHandler) -> Result<()>;
}
