/// UsdGeomCamera: camera schema view of a prim
///
/// Valid only for prims typed `Camera`. Unauthored attributes resolve to the
/// schema fallbacks.

use crate::error::{Error, Result};
use crate::gf::camera::{
    DEFAULT_CLIPPING_RANGE, DEFAULT_FOCAL_LENGTH, DEFAULT_FOCUS_DISTANCE, DEFAULT_F_STOP,
    DEFAULT_HORIZONTAL_APERTURE, DEFAULT_VERTICAL_APERTURE,
};
use crate::gf::{GfCamera, Projection, Range1d};
use crate::usd::{Prim, SceneStage, TimeCode};
use crate::viewer_warn;

use super::xformable::UsdGeomXformable;

pub const CAMERA_TYPE_NAME: &str = "Camera";

pub struct UsdGeomCamera<'s, S: SceneStage + ?Sized> {
    stage: &'s S,
    prim: Prim,
}

impl<'s, S: SceneStage + ?Sized> UsdGeomCamera<'s, S> {
    /// Camera view of `prim`; `Error::SchemaMismatch` unless it is typed `Camera`.
    pub fn new(stage: &'s S, prim: Prim) -> Result<Self> {
        if prim.type_name() != CAMERA_TYPE_NAME {
            return Err(Error::SchemaMismatch {
                path: prim.path().to_string(),
                expected: CAMERA_TYPE_NAME.to_string(),
                found: prim.type_name().to_string(),
            });
        }
        Ok(Self { stage, prim })
    }

    pub fn prim(&self) -> &Prim {
        &self.prim
    }

    fn scalar(&self, name: &str, time: TimeCode, fallback: f64) -> f64 {
        self.stage
            .attribute(&self.prim, name, time)
            .and_then(|v| v.as_f64())
            .unwrap_or(fallback)
    }

    pub fn projection(&self, time: TimeCode) -> Projection {
        let token = self.stage.attribute(&self.prim, "projection", time);
        match token.as_ref().and_then(|v| v.as_str()) {
            None => Projection::Perspective,
            Some(text) => Projection::from_token(text).unwrap_or_else(|| {
                viewer_warn!(
                    "usd_viewer::UsdGeomCamera",
                    "Unknown projection '{}' on {}, using perspective",
                    text,
                    self.prim.path()
                );
                Projection::Perspective
            }),
        }
    }

    pub fn clipping_range(&self, time: TimeCode) -> Range1d {
        self.stage
            .attribute(&self.prim, "clippingRange", time)
            .and_then(|v| v.as_dvec2())
            .map(|r| Range1d::new(r.x, r.y))
            .unwrap_or(DEFAULT_CLIPPING_RANGE)
    }

    /// Camera model at `time`, placed by the prim's local-to-world transform.
    pub fn get_camera(&self, time: TimeCode) -> GfCamera {
        GfCamera {
            transform: UsdGeomXformable::new(self.stage, self.prim.clone()).local_to_world(time),
            projection: self.projection(time),
            horizontal_aperture: self.scalar("horizontalAperture", time, DEFAULT_HORIZONTAL_APERTURE),
            vertical_aperture: self.scalar("verticalAperture", time, DEFAULT_VERTICAL_APERTURE),
            horizontal_aperture_offset: self.scalar("horizontalApertureOffset", time, 0.0),
            vertical_aperture_offset: self.scalar("verticalApertureOffset", time, 0.0),
            focal_length: self.scalar("focalLength", time, DEFAULT_FOCAL_LENGTH),
            clipping_range: self.clipping_range(time),
            f_stop: self.scalar("fStop", time, DEFAULT_F_STOP),
            focus_distance: self.scalar("focusDistance", time, DEFAULT_FOCUS_DISTANCE),
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
