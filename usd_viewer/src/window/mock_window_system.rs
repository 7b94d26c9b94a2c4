/// Mock window system for unit tests (no window)
///
/// `run_event_loop` plays back `frame_sizes`: one frame per entry, the first
/// as a display event and the rest as idle events.

use crate::error::Result;
use crate::viewer_bail;
use crate::viewer_warn;
use crate::window::{
    ClearMask, DisplayMode, FrameCallbacks, FrameEvent, FrameHandler, FrameSurface, WindowId,
    WindowSystem,
};

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCall {
    Init,
    SetDisplayMode(DisplayMode),
    SetWindowSize(u32, u32),
    SetWindowPosition(i32, i32),
    CreateWindow(String),
    SetClearColor([f32; 4]),
    RegisterCallbacks(FrameCallbacks),
    RunEventLoop,
}

#[derive(Debug, Default)]
pub struct MockSurface {
    pub size: (u32, u32),
    pub clears: Vec<ClearMask>,
    pub swaps: usize,
}

impl FrameSurface for MockSurface {
    fn clear(&mut self, mask: ClearMask) {
        self.clears.push(mask);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.swaps += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockWindowSystem {
    pub calls: Vec<WindowCall>,
    /// Drawable size of each frame played by `run_event_loop`
    pub frame_sizes: Vec<(u32, u32)>,
    pub fail_init: bool,
    pub callbacks: Option<FrameCallbacks>,
    pub surface: MockSurface,
    pub events: Vec<FrameEvent>,
    pub frame_errors: usize,
}

impl MockWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(frame_sizes: Vec<(u32, u32)>) -> Self {
        Self { frame_sizes, ..Self::default() }
    }
}

impl WindowSystem for MockWindowSystem {
    fn init(&mut self) -> Result<()> {
        self.calls.push(WindowCall::Init);
        if self.fail_init {
            viewer_bail!("usd_viewer::MockWindowSystem", "no display available");
        }
        Ok(())
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        self.calls.push(WindowCall::SetDisplayMode(mode));
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.calls.push(WindowCall::SetWindowSize(width, height));
    }

    fn set_window_position(&mut self, x: i32, y: i32) {
        self.calls.push(WindowCall::SetWindowPosition(x, y));
    }

    fn create_window(&mut self, title: &str) -> Result<WindowId> {
        self.calls.push(WindowCall::CreateWindow(title.to_string()));
        Ok(WindowId(1))
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.calls.push(WindowCall::SetClearColor(color));
    }

    fn register_callbacks(&mut self, callbacks: FrameCallbacks) {
        self.calls.push(WindowCall::RegisterCallbacks(callbacks));
        self.callbacks = Some(callbacks);
    }

    fn run_event_loop(&mut self, handler: &mut dyn FrameHandler) -> Result<()> {
        self.calls.push(WindowCall::RunEventLoop);
        let callbacks = self.callbacks.unwrap_or(FrameCallbacks::empty());

        for (i, size) in self.frame_sizes.clone().into_iter().enumerate() {
            self.surface.size = size;
            let event = if i == 0 && callbacks.contains(FrameCallbacks::DISPLAY) {
                FrameEvent::Display
            } else if callbacks.contains(FrameCallbacks::IDLE) {
                FrameEvent::Idle
            } else {
                continue;
            };
            self.events.push(event);
            let result = match event {
                FrameEvent::Display => handler.on_display(&mut self.surface),
                FrameEvent::Idle => handler.on_idle(&mut self.surface),
            };
            if let Err(err) = result {
                viewer_warn!("usd_viewer::MockWindowSystem", "Frame failed: {}", err);
                self.frame_errors += 1;
            }
        }
        Ok(())
    }
}
