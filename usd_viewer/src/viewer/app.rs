/// Viewer entry point: argument check, startup stages, then the frame loop.

use std::ffi::OsString;
use std::io::Write;

use crate::cli::CliArgs;
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::imaging::ImagingEngine;
use crate::usd::StageOpener;
use crate::viewer_info;
use crate::window::WindowSystem;

use super::frame_renderer::FrameRenderer;
use super::startup::{bootstrap_window, extract_camera_state, load_stage, resolve_camera};

/// Run the viewer until its window is closed.
///
/// `args` is the full process argument list (`std::env::args_os()`). The
/// load status code is written to `out`. `make_engine` creates the imaging
/// engine once the window exists.
pub fn run<W, O, E, F, I, T>(
    args: I,
    config: &ViewerConfig,
    window_system: &mut W,
    opener: &O,
    make_engine: F,
    out: &mut dyn Write,
) -> Result<()>
where
    W: WindowSystem,
    O: StageOpener,
    E: ImagingEngine,
    F: FnOnce(&mut W) -> Result<E>,
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let cli = CliArgs::parse(args)?;

    bootstrap_window(window_system, &config.window)?;

    let stage = load_stage(opener, &cli.scene_path, config.load_set, config.load_policy, out)?;

    let camera_state = {
        let camera = resolve_camera(&stage, &config.camera_path)?;
        extract_camera_state(&camera)?
    };

    let mut engine = make_engine(window_system)?;
    engine.set_renderer_aov(&config.renderer_aov)?;
    engine.set_camera_state(camera_state.view, camera_state.projection);

    let mut renderer = FrameRenderer::new(stage, engine, config.render_params);
    window_system.register_callbacks(config.frame_callbacks);
    window_system.run_event_loop(&mut renderer)?;

    viewer_info!(
        "usd_viewer::Viewer",
        "Window closed after {} frames",
        renderer.frames_rendered()
    );
    Ok(())
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
