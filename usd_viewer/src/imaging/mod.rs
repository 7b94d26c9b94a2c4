//! Imaging engine seam: camera state, viewport and render parameters.

mod imaging_engine;
#[cfg(test)]
pub(crate) mod mock_imaging_engine;

pub use imaging_engine::{
    CameraState, ImagingEngine, RenderParams, RenderViewport, COLOR_AOV, DEPTH_AOV,
};
