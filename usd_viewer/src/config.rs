//! Viewer configuration
//!
//! Defaults reproduce the classic viewer: a 500x500 window at the screen
//! origin with a dark blue clear color, the `/camera1` camera, the color
//! output and unlit rendering.

use crate::imaging::{RenderParams, COLOR_AOV};
use crate::usd::InitialLoadSet;
use crate::window::{DisplayMode, FrameCallbacks};

/// Camera prim looked up on every stage.
pub const CAMERA_PATH: &str = "/camera1";

pub const DEFAULT_WINDOW_TITLE: &str = "usd_view";
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (500, 500);
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.1, 0.2, 0.3, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub display_mode: DisplayMode,
    pub clear_color: [f32; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_WINDOW_TITLE.to_string(),
            width: DEFAULT_WINDOW_SIZE.0,
            height: DEFAULT_WINDOW_SIZE.1,
            x: 0,
            y: 0,
            display_mode: DisplayMode::RGBA | DisplayMode::DEPTH | DisplayMode::DOUBLE,
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }
}

/// What to do when the scene file does not load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Stop with `Error::StageLoad`
    #[default]
    FailFast,
    /// Warn and continue with the empty stage
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera_path: String,
    pub load_policy: LoadPolicy,
    pub load_set: InitialLoadSet,
    pub renderer_aov: String,
    pub render_params: RenderParams,
    /// Events that trigger a frame
    pub frame_callbacks: FrameCallbacks,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera_path: CAMERA_PATH.to_string(),
            load_policy: LoadPolicy::FailFast,
            load_set: InitialLoadSet::LoadAll,
            renderer_aov: COLOR_AOV.to_string(),
            render_params: RenderParams::default(),
            frame_callbacks: FrameCallbacks::DISPLAY | FrameCallbacks::IDLE,
        }
    }
}
