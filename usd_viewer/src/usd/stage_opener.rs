/// Stage opening: path in, (stage, status) out
///
/// Opening never fails with an `Err`; failures are reported through
/// `LoadStatus` together with an empty stage, and the caller decides whether
/// to stop (see `LoadPolicy`).

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use crate::usd::{SceneStage, Stage};
use crate::viewer_error;
use crate::viewer_info;

/// Which payloads to load when opening.
///
/// Payload arcs are not composed, so both sets produce the same stage; the
/// choice is kept on the stage for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialLoadSet {
    #[default]
    LoadAll,
    LoadNone,
}

/// Result of opening a scene file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Ok,
    FileNotFound,
    ParseError,
    ReadFailed,
}

impl LoadStatus {
    /// Integer status printed by the viewer (0 on success).
    pub fn code(self) -> i32 {
        match self {
            LoadStatus::Ok => 0,
            LoadStatus::FileNotFound => 1,
            LoadStatus::ParseError => 2,
            LoadStatus::ReadFailed => 3,
        }
    }

    pub fn is_ok(self) -> bool {
        self == LoadStatus::Ok
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LoadStatus::Ok => "ok",
            LoadStatus::FileNotFound => "file not found",
            LoadStatus::ParseError => "parse error",
            LoadStatus::ReadFailed => "read failed",
        };
        f.write_str(text)
    }
}

/// Opens a scene file by path.
pub trait StageOpener {
    type Stage: SceneStage;

    fn open(&self, path: &Path, load_set: InitialLoadSet) -> (Self::Stage, LoadStatus);
}

/// Opener for `.usda` text layers on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsdaStageOpener;

impl StageOpener for UsdaStageOpener {
    type Stage = Stage;

    fn open(&self, path: &Path, load_set: InitialLoadSet) -> (Stage, LoadStatus) {
        let identifier = path.display().to_string();

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                let status = if err.kind() == ErrorKind::NotFound {
                    LoadStatus::FileNotFound
                } else {
                    LoadStatus::ReadFailed
                };
                viewer_error!("usd_viewer::StageOpener", "Cannot read '{}': {}", identifier, err);
                return (Stage::new(identifier, load_set), status);
            }
        };

        match Stage::from_source(&identifier, &source, load_set) {
            Ok(stage) => {
                viewer_info!(
                    "usd_viewer::StageOpener",
                    "Opened '{}' ({} prims)",
                    identifier,
                    stage.prim_count()
                );
                (stage, LoadStatus::Ok)
            }
            Err(err) => {
                viewer_error!("usd_viewer::StageOpener", "Cannot load '{}': {}", identifier, err);
                (Stage::new(identifier, load_set), LoadStatus::ParseError)
            }
        }
    }
}

#[cfg(test)]
#[path = "stage_opener_tests.rs"]
mod tests;
