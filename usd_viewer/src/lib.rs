/*!
# USD Viewer

Core types for a minimal USD scene viewer.

The crate opens a `.usda` scene, resolves the `/camera1` camera, computes its
view and projection once, then drives a frame loop that renders the whole
stage into a window whose size may change at any time.

## Architecture

- **usd / sdf**: `.usda` loader, composed stage, prim paths, time codes
- **usd_geom**: Xformable, Camera and Mesh schema views over a `SceneStage`
- **gf**: camera model and frustum math
- **imaging**: `ImagingEngine` trait (camera state, viewport, render)
- **window**: `WindowSystem` trait (window setup, frame callbacks, surface)
- **viewer**: startup stages and the per-frame renderer

Backends implement `ImagingEngine` and `WindowSystem`; see
`usd_viewer_renderer_vulkan`.
*/

// Internal modules
mod error;
pub mod log;

pub mod cli;
pub mod config;
pub mod gf;
pub mod imaging;
pub mod sdf;
pub mod usd;
pub mod usd_geom;
pub mod viewer;
pub mod window;

// Error types
pub use error::{Error, Result, FAILURE_EXIT_CODE, USAGE_EXIT_CODE};

// Re-export math library at crate root
pub use glam;
