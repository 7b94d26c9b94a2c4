/// ImagingEngine trait: renders a stage subtree into the current frame
///
/// The engine keeps its own state (selected output, camera matrices,
/// viewport). The viewer sets the camera once and the viewport every frame.

use glam::{DMat4, DVec4};

use crate::error::Result;
use crate::usd::{Prim, SceneStage, TimeCode};

/// Output variable rendered to the frame.
pub const COLOR_AOV: &str = "color";
/// Linearized depth visualization.
pub const DEPTH_AOV: &str = "depth";

/// View and projection matrices pushed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// World-to-view
    pub view: DMat4,
    /// View-to-clip (GL depth range)
    pub projection: DMat4,
}

impl CameraState {
    pub fn new(view: DMat4, projection: DMat4) -> Self {
        Self { view, projection }
    }

    /// projection * view
    pub fn view_projection(&self) -> DMat4 {
        self.projection * self.view
    }
}

/// Pixel rectangle the engine renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderViewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderViewport {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a whole `width` x `height` surface.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, f64::from(width), f64::from(height))
    }

    pub fn as_dvec4(&self) -> DVec4 {
        DVec4::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Per-render options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Time at which scene attributes are evaluated
    pub time: TimeCode,
    /// Shade with a headlight; flat display colors otherwise
    pub enable_lighting: bool,
    /// Skip meshes whose authored extent is outside the frustum
    pub cull_with_extent: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            time: TimeCode::Default,
            enable_lighting: false,
            cull_with_extent: true,
        }
    }
}

pub trait ImagingEngine {
    /// Select the output variable; fails for outputs the engine cannot produce.
    fn set_renderer_aov(&mut self, aov: &str) -> Result<()>;

    fn set_camera_state(&mut self, view: DMat4, projection: DMat4);

    fn set_render_viewport(&mut self, viewport: RenderViewport);

    /// Render `root` and its descendants.
    fn render(&mut self, stage: &dyn SceneStage, root: &Prim, params: &RenderParams) -> Result<()>;
}
