/// Mock imaging engine for unit tests (no rendering)
///
/// Records every call so tests can check ordering and counts.

use glam::DMat4;

use crate::error::Result;
use crate::imaging::{ImagingEngine, RenderParams, RenderViewport, COLOR_AOV, DEPTH_AOV};
use crate::sdf::SdfPath;
use crate::usd::{Prim, SceneStage};
use crate::viewer_bail;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetAov(String),
    SetCameraState { view: DMat4, projection: DMat4 },
    SetViewport(RenderViewport),
    Render(SdfPath),
}

#[derive(Debug, Default)]
pub struct MockImagingEngine {
    pub calls: Vec<EngineCall>,
    /// When set, `render` fails with this message
    pub fail_render: Option<String>,
}

impl MockImagingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn viewports(&self) -> Vec<RenderViewport> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::SetViewport(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl ImagingEngine for MockImagingEngine {
    fn set_renderer_aov(&mut self, aov: &str) -> Result<()> {
        if aov != COLOR_AOV && aov != DEPTH_AOV {
            viewer_bail!("usd_viewer::MockImagingEngine", "Unsupported AOV '{}'", aov);
        }
        self.calls.push(EngineCall::SetAov(aov.to_string()));
        Ok(())
    }

    fn set_camera_state(&mut self, view: DMat4, projection: DMat4) {
        self.calls.push(EngineCall::SetCameraState { view, projection });
    }

    fn set_render_viewport(&mut self, viewport: RenderViewport) {
        self.calls.push(EngineCall::SetViewport(viewport));
    }

    fn render(&mut self, _stage: &dyn SceneStage, root: &Prim, _params: &RenderParams) -> Result<()> {
        self.calls.push(EngineCall::Render(root.path().clone()));
        if let Some(message) = &self.fail_render {
            viewer_bail!("usd_viewer::MockImagingEngine", "{}", message);
        }
        Ok(())
    }
}
