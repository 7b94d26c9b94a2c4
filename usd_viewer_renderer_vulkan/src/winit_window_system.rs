/// WinitWindowSystem - WindowSystem on a winit event loop
///
/// The window is opened when the event loop resumes, together with the
/// `VulkanPresenter` that shows the shared CPU framebuffer. Redraw requests
/// produce display frames and every idle pass of the loop produces an idle
/// frame. Closing the window ends `run_event_loop`.

use usd_viewer::config::DEFAULT_WINDOW_SIZE;
use usd_viewer::window::{
    ClearMask, DisplayMode, FrameCallbacks, FrameEvent, FrameHandler, FrameSurface, WindowId,
    WindowSystem,
};
use usd_viewer::{viewer_bail, viewer_debug, viewer_err, viewer_error, viewer_info, Error, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::Window;

use crate::framebuffer::{Framebuffer, SharedFramebuffer};
use crate::vulkan_presenter::{PresenterConfig, VulkanPresenter};

/// Where a finished frame goes on `swap_buffers`.
pub trait PresentTarget {
    fn present(&mut self, framebuffer: &Framebuffer) -> Result<()>;
}

impl PresentTarget for VulkanPresenter {
    fn present(&mut self, framebuffer: &Framebuffer) -> Result<()> {
        VulkanPresenter::present(self, framebuffer)
    }
}

/// Frame surface over the shared framebuffer.
///
/// `clear` first resizes the framebuffer to the window size sampled at the
/// start of the frame.
pub struct FramebufferSurface<'a> {
    framebuffer: &'a SharedFramebuffer,
    size: (u32, u32),
    target: &'a mut dyn PresentTarget,
}

impl<'a> FramebufferSurface<'a> {
    pub fn new(framebuffer: &'a SharedFramebuffer, size: (u32, u32), target: &'a mut dyn PresentTarget) -> Self {
        Self { framebuffer, size, target }
    }
}

impl FrameSurface for FramebufferSurface<'_> {
    fn clear(&mut self, mask: ClearMask) {
        match self.framebuffer.lock() {
            Ok(mut framebuffer) => {
                framebuffer.resize(self.size.0, self.size.1);
                framebuffer.clear(mask);
            }
            Err(_) => viewer_error!("usd_viewer::winit", "Framebuffer lock poisoned, frame not cleared"),
        }
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn swap_buffers(&mut self) -> Result<()> {
        let framebuffer = self
            .framebuffer
            .lock()
            .map_err(|_| viewer_err!("usd_viewer::winit", "Framebuffer lock poisoned"))?;
        self.target.present(&framebuffer)
    }
}

pub struct WinitWindowSystem {
    event_loop: Option<EventLoop<()>>,
    display_mode: DisplayMode,
    size: (u32, u32),
    position: (i32, i32),
    title: Option<String>,
    callbacks: FrameCallbacks,
    framebuffer: SharedFramebuffer,
    presenter_config: PresenterConfig,
}

impl WinitWindowSystem {
    pub fn new(presenter_config: PresenterConfig) -> Self {
        Self {
            event_loop: None,
            display_mode: DisplayMode::RGBA | DisplayMode::DEPTH | DisplayMode::DOUBLE,
            size: DEFAULT_WINDOW_SIZE,
            position: (0, 0),
            title: None,
            callbacks: FrameCallbacks::empty(),
            framebuffer: Framebuffer::shared(0, 0, true),
            presenter_config,
        }
    }

    /// Framebuffer the imaging engine draws into and the window presents.
    pub fn framebuffer(&self) -> SharedFramebuffer {
        SharedFramebuffer::clone(&self.framebuffer)
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.size
    }

    pub fn window_position(&self) -> (i32, i32) {
        self.position
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn callbacks(&self) -> FrameCallbacks {
        self.callbacks
    }

    pub fn presenter_config(&self) -> &PresenterConfig {
        &self.presenter_config
    }
}

impl Default for WinitWindowSystem {
    fn default() -> Self {
        Self::new(PresenterConfig::default())
    }
}

fn init_failed(message: String) -> Error {
    viewer_error!("usd_viewer::winit", "{}", message);
    Error::InitializationFailed(message)
}

impl WindowSystem for WinitWindowSystem {
    fn init(&mut self) -> Result<()> {
        if self.event_loop.is_some() {
            return Ok(());
        }
        let event_loop = EventLoop::new()
            .map_err(|e| init_failed(format!("Failed to create event loop: {}", e)))?;
        self.event_loop = Some(event_loop);
        viewer_debug!("usd_viewer::winit", "Event loop created");
        Ok(())
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_window_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    fn create_window(&mut self, title: &str) -> Result<WindowId> {
        if self.event_loop.is_none() {
            return Err(init_failed("create_window called before init".to_string()));
        }
        if self.title.is_some() {
            viewer_bail!("usd_viewer::winit", "Only one window is supported");
        }

        let has_depth = self.display_mode.contains(DisplayMode::DEPTH);
        match self.framebuffer.lock() {
            Ok(mut framebuffer) => {
                let clear_color = framebuffer.clear_color();
                *framebuffer = Framebuffer::new(self.size.0, self.size.1, has_depth);
                framebuffer.set_clear_color(clear_color.map(|c| f32::from(c) / 255.0));
            }
            Err(_) => viewer_bail!("usd_viewer::winit", "Framebuffer lock poisoned"),
        }

        self.title = Some(title.to_string());
        viewer_debug!(
            "usd_viewer::winit",
            "Window '{}' ({}x{} at {:?}) opens with the event loop",
            title,
            self.size.0,
            self.size.1,
            self.position
        );
        Ok(WindowId(1))
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        match self.framebuffer.lock() {
            Ok(mut framebuffer) => framebuffer.set_clear_color(color),
            Err(_) => viewer_error!("usd_viewer::winit", "Framebuffer lock poisoned, clear color ignored"),
        }
    }

    fn register_callbacks(&mut self, callbacks: FrameCallbacks) {
        self.callbacks = callbacks;
    }

    fn run_event_loop(&mut self, handler: &mut dyn FrameHandler) -> Result<()> {
        let Some(title) = self.title.clone() else {
            viewer_bail!("usd_viewer::winit", "run_event_loop called before create_window");
        };
        let Some(event_loop) = self.event_loop.take() else {
            viewer_bail!("usd_viewer::winit", "Event loop already consumed");
        };

        let mut app = ViewerApp {
            handler,
            title,
            size: self.size,
            position: self.position,
            callbacks: self.callbacks,
            framebuffer: self.framebuffer(),
            presenter_config: self.presenter_config.clone(),
            presenter: None,
            window: None,
            error: None,
            frame_errors: 0,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| viewer_err!("usd_viewer::winit", "Event loop failed: {}", e))?;

        if app.frame_errors > 0 {
            viewer_info!("usd_viewer::winit", "{} frames failed", app.frame_errors);
        }
        match app.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

struct ViewerApp<'a> {
    handler: &'a mut dyn FrameHandler,
    title: String,
    size: (u32, u32),
    position: (i32, i32),
    callbacks: FrameCallbacks,
    framebuffer: SharedFramebuffer,
    presenter_config: PresenterConfig,
    /// Declared before `window`: the surface must go first
    presenter: Option<VulkanPresenter>,
    window: Option<Window>,
    /// Failure that ended the loop
    error: Option<Error>,
    frame_errors: usize,
}

impl ViewerApp<'_> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        self.error = Some(error);
        event_loop.exit();
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(PhysicalSize::new(self.size.0, self.size.1))
            .with_position(PhysicalPosition::new(self.position.0, self.position.1));
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| init_failed(format!("Failed to create window: {}", e)))?;

        let size = window.inner_size();
        let presenter = VulkanPresenter::new(&window, &self.presenter_config, (size.width, size.height))?;

        event_loop.set_control_flow(if self.callbacks.contains(FrameCallbacks::IDLE) {
            ControlFlow::Poll
        } else {
            ControlFlow::Wait
        });
        window.request_redraw();

        viewer_info!(
            "usd_viewer::winit",
            "Window '{}' opened ({}x{})",
            self.title,
            size.width,
            size.height
        );
        self.presenter = Some(presenter);
        self.window = Some(window);
        Ok(())
    }

    fn run_frame(&mut self, event: FrameEvent) {
        let (Some(window), Some(presenter)) = (self.window.as_ref(), self.presenter.as_mut()) else {
            return;
        };
        let size = window.inner_size();
        let mut surface = FramebufferSurface::new(&self.framebuffer, (size.width, size.height), presenter);

        let result = match event {
            FrameEvent::Display => self.handler.on_display(&mut surface),
            FrameEvent::Idle => self.handler.on_idle(&mut surface),
        };
        if let Err(e) = result {
            self.frame_errors += 1;
            viewer_error!("usd_viewer::winit", "{:?} frame failed: {}", event, e);
        }
    }
}

impl ApplicationHandler for ViewerApp<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.open_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                viewer_info!("usd_viewer::winit", "Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.resize(size.width, size.height);
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if self.callbacks.contains(FrameCallbacks::DISPLAY) {
                    self.run_frame(FrameEvent::Display);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.callbacks.contains(FrameCallbacks::IDLE) {
            self.run_frame(FrameEvent::Idle);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.presenter = None;
    }
}

#[cfg(test)]
#[path = "winit_window_system_tests.rs"]
mod tests;
