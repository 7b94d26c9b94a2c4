/// FrameRenderer: the per-frame render routine
///
/// Registered as both the display and the idle handler. Every frame clears
/// the surface, syncs the engine viewport to the live surface size, renders
/// the whole stage from the pseudo-root and presents.

use crate::error::Result;
use crate::imaging::{ImagingEngine, RenderParams, RenderViewport};
use crate::usd::{Prim, SceneStage};
use crate::viewer_trace;
use crate::window::{ClearMask, FrameEvent, FrameHandler, FrameSurface};

pub struct FrameRenderer<S: SceneStage, E: ImagingEngine> {
    stage: S,
    root: Prim,
    engine: E,
    params: RenderParams,
    frames_rendered: u64,
}

impl<S: SceneStage, E: ImagingEngine> FrameRenderer<S, E> {
    pub fn new(stage: S, engine: E, params: RenderParams) -> Self {
        let root = stage.pseudo_root();
        Self { stage, root, engine, params, frames_rendered: 0 }
    }

    pub fn render_frame(&mut self, surface: &mut dyn FrameSurface, event: FrameEvent) -> Result<()> {
        surface.clear(ClearMask::COLOR | ClearMask::DEPTH);

        let (width, height) = surface.size();
        self.engine.set_render_viewport(RenderViewport::from_size(width, height));
        self.engine.render(&self.stage, &self.root, &self.params)?;

        surface.swap_buffers()?;
        self.frames_rendered += 1;

        viewer_trace!(
            "usd_viewer::FrameRenderer",
            "{:?} frame {} at {}x{}",
            event,
            self.frames_rendered,
            width,
            height
        );
        Ok(())
    }

    /// Completed frames.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn root(&self) -> &Prim {
        &self.root
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }
}

impl<S: SceneStage, E: ImagingEngine> FrameHandler for FrameRenderer<S, E> {
    fn on_display(&mut self, surface: &mut dyn FrameSurface) -> Result<()> {
        self.render_frame(surface, FrameEvent::Display)
    }

    fn on_idle(&mut self, surface: &mut dyn FrameSurface) -> Result<()> {
        self.render_frame(surface, FrameEvent::Idle)
    }
}

#[cfg(test)]
#[path = "frame_renderer_tests.rs"]
mod tests;
