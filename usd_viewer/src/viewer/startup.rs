/// Startup stages: window bootstrap, scene load, camera resolution and
/// camera state extraction.
///
/// Each stage returns an explicit `Result`; `run` chains them and stops at
/// the first failure.

use std::io::Write;
use std::path::Path;

use crate::config::{LoadPolicy, WindowConfig};
use crate::error::{Error, Result};
use crate::imaging::CameraState;
use crate::sdf::SdfPath;
use crate::usd::{InitialLoadSet, SceneStage, StageOpener, TimeCode};
use crate::usd_geom::UsdGeomCamera;
use crate::window::{WindowId, WindowSystem};
use crate::{viewer_debug, viewer_info, viewer_warn};

/// Initialize the window system and create the viewer window.
pub fn bootstrap_window<W: WindowSystem + ?Sized>(
    window_system: &mut W,
    config: &WindowConfig,
) -> Result<WindowId> {
    window_system.init()?;
    window_system.set_display_mode(config.display_mode);
    window_system.set_window_size(config.width, config.height);
    window_system.set_window_position(config.x, config.y);
    let window = window_system.create_window(&config.title)?;
    window_system.set_clear_color(config.clear_color);

    viewer_debug!(
        "usd_viewer::Viewer",
        "Window '{}' created ({}x{} at {},{})",
        config.title,
        config.width,
        config.height,
        config.x,
        config.y
    );
    Ok(window)
}

/// Open the scene and write its load status code to `out`.
///
/// A non-zero status stops with `Error::StageLoad` under
/// `LoadPolicy::FailFast`; under `LoadPolicy::Continue` the (empty) stage is
/// returned after a warning.
pub fn load_stage<O: StageOpener>(
    opener: &O,
    path: &Path,
    load_set: InitialLoadSet,
    policy: LoadPolicy,
    out: &mut dyn Write,
) -> Result<O::Stage> {
    let (stage, status) = opener.open(path, load_set);

    writeln!(out, "{}", status.code())?;
    out.flush()?;

    if status.is_ok() {
        viewer_info!("usd_viewer::Viewer", "Loaded stage '{}'", path.display());
        return Ok(stage);
    }

    match policy {
        LoadPolicy::FailFast => Err(Error::StageLoad {
            path: path.display().to_string(),
            status,
        }),
        LoadPolicy::Continue => {
            viewer_warn!(
                "usd_viewer::Viewer",
                "Continuing with an empty stage after '{}' failed to load ({})",
                path.display(),
                status
            );
            Ok(stage)
        }
    }
}

/// Look up the camera prim at `camera_path` and view it as a camera.
pub fn resolve_camera<'s, S: SceneStage + ?Sized>(
    stage: &'s S,
    camera_path: &str,
) -> Result<UsdGeomCamera<'s, S>> {
    let path = SdfPath::new(camera_path)?;
    let prim = stage
        .prim_at_path(&path)
        .ok_or_else(|| Error::PrimNotFound(path.to_string()))?;
    UsdGeomCamera::new(stage, prim)
}

/// View and projection matrices of `camera` at the default time.
pub fn extract_camera_state<S: SceneStage + ?Sized>(camera: &UsdGeomCamera<'_, S>) -> Result<CameraState> {
    let frustum = camera.get_camera(TimeCode::Default).frustum()?;
    let state = CameraState::new(frustum.compute_view_matrix(), frustum.compute_projection_matrix());

    viewer_debug!(
        "usd_viewer::Viewer",
        "Camera {} at {:?} looking along {:?}",
        camera.prim().path(),
        frustum.position(),
        frustum.view_direction()
    );
    Ok(state)
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
