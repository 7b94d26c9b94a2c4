//! usd_view - open a `.usda` scene and view it through its `/camera1` camera
//!
//! Usage: usd_view <scene.usda>
//!
//! Log verbosity follows `USD_VIEWER_LOG` (trace, debug, info, warn, error).

use usd_viewer::config::ViewerConfig;
use usd_viewer::usd::UsdaStageOpener;
use usd_viewer::{log, viewer_error};
use usd_viewer_renderer_vulkan::{PresenterConfig, SoftwareImagingEngine, WinitWindowSystem};

fn main() {
    if let Some(severity) = log::severity_from_env() {
        log::set_min_severity(severity);
    }

    let config = ViewerConfig::default();
    let mut window_system = WinitWindowSystem::new(PresenterConfig::default());
    let mut stdout = std::io::stdout();

    let result = usd_viewer::viewer::run(
        std::env::args_os(),
        &config,
        &mut window_system,
        &UsdaStageOpener,
        |ws: &mut WinitWindowSystem| Ok(SoftwareImagingEngine::new(ws.framebuffer())),
        &mut stdout,
    );

    if let Err(e) = result {
        viewer_error!("usd_view", "{}", e);
        std::process::exit(e.exit_code());
    }
}
