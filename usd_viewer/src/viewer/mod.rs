//! Viewer control flow: startup stages and the frame loop.

mod app;
mod frame_renderer;
mod startup;
#[cfg(test)]
pub(crate) mod test_support;

pub use crate::config::CAMERA_PATH;
pub use app::run;
pub use frame_renderer::FrameRenderer;
pub use startup::{bootstrap_window, extract_camera_state, load_stage, resolve_camera};
