/// GfCamera: physical camera model.
///
/// Apertures and focal length are in millimeters (tenths of a scene unit),
/// matching the camera schema; `frustum()` converts them into a window on the
/// unit-distance reference plane.

use glam::{DMat4, DVec2};

use crate::error::{Error, Result};

use super::frustum::Frustum;
use super::range::{Range1d, Range2d};

/// Aperture and focal length are authored in tenths of a scene unit.
pub const APERTURE_UNIT: f64 = 0.1;
pub const FOCAL_LENGTH_UNIT: f64 = 0.1;

/// Schema fallbacks for unauthored camera attributes.
pub const DEFAULT_HORIZONTAL_APERTURE: f64 = 20.955;
pub const DEFAULT_VERTICAL_APERTURE: f64 = 15.2908;
pub const DEFAULT_FOCAL_LENGTH: f64 = 50.0;
pub const DEFAULT_CLIPPING_RANGE: Range1d = Range1d { min: 1.0, max: 1_000_000.0 };
pub const DEFAULT_F_STOP: f64 = 0.0;
pub const DEFAULT_FOCUS_DISTANCE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

impl Projection {
    /// Parse the `projection` token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "perspective" => Some(Projection::Perspective),
            "orthographic" => Some(Projection::Orthographic),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Projection::Perspective => "perspective",
            Projection::Orthographic => "orthographic",
        }
    }
}

/// Which aperture a field of view is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FovDirection {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GfCamera {
    /// Camera-to-world transform
    pub transform: DMat4,
    pub projection: Projection,
    pub horizontal_aperture: f64,
    pub vertical_aperture: f64,
    pub horizontal_aperture_offset: f64,
    pub vertical_aperture_offset: f64,
    pub focal_length: f64,
    pub clipping_range: Range1d,
    pub f_stop: f64,
    pub focus_distance: f64,
}

impl Default for GfCamera {
    fn default() -> Self {
        Self {
            transform: DMat4::IDENTITY,
            projection: Projection::Perspective,
            horizontal_aperture: DEFAULT_HORIZONTAL_APERTURE,
            vertical_aperture: DEFAULT_VERTICAL_APERTURE,
            horizontal_aperture_offset: 0.0,
            vertical_aperture_offset: 0.0,
            focal_length: DEFAULT_FOCAL_LENGTH,
            clipping_range: DEFAULT_CLIPPING_RANGE,
            f_stop: DEFAULT_F_STOP,
            focus_distance: DEFAULT_FOCUS_DISTANCE,
        }
    }
}

impl GfCamera {
    /// Horizontal over vertical aperture, 0 when the vertical aperture is 0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.vertical_aperture == 0.0 {
            0.0
        } else {
            self.horizontal_aperture / self.vertical_aperture
        }
    }

    /// Field of view in degrees along one aperture.
    pub fn field_of_view(&self, direction: FovDirection) -> f64 {
        let aperture = match direction {
            FovDirection::Horizontal => self.horizontal_aperture,
            FovDirection::Vertical => self.vertical_aperture,
        };
        2.0 * (aperture / (2.0 * self.focal_length)).atan().to_degrees()
    }

    /// Viewing frustum of this camera.
    ///
    /// Fails with `Error::InvalidCamera` when the parameters cannot produce a
    /// projection: non-positive focal length or near distance for perspective,
    /// an empty clipping range, a degenerate window, or non-finite values.
    pub fn frustum(&self) -> Result<Frustum> {
        self.validate()?;

        let half = DVec2::new(self.horizontal_aperture, self.vertical_aperture) * 0.5;
        let offset = DVec2::new(self.horizontal_aperture_offset, self.vertical_aperture_offset);
        let mut window = Range2d::new(offset - half, offset + half).scaled(APERTURE_UNIT);

        if self.projection == Projection::Perspective {
            window = window.scaled(1.0 / (self.focal_length * FOCAL_LENGTH_UNIT));
        }

        Ok(Frustum::from_camera_transform(
            &self.transform,
            window,
            self.clipping_range,
            self.projection,
        ))
    }

    fn validate(&self) -> Result<()> {
        let scalars = [
            self.horizontal_aperture,
            self.vertical_aperture,
            self.horizontal_aperture_offset,
            self.vertical_aperture_offset,
            self.focal_length,
            self.clipping_range.min,
            self.clipping_range.max,
        ];
        if scalars.iter().any(|v| !v.is_finite()) || !self.transform.is_finite() {
            return Err(Error::InvalidCamera("non-finite camera parameter".to_string()));
        }
        if self.horizontal_aperture <= 0.0 || self.vertical_aperture <= 0.0 {
            return Err(Error::InvalidCamera(format!(
                "aperture must be positive, got {} x {}",
                self.horizontal_aperture, self.vertical_aperture
            )));
        }
        if self.clipping_range.min >= self.clipping_range.max {
            return Err(Error::InvalidCamera(format!(
                "clipping range ({}, {}) is empty",
                self.clipping_range.min, self.clipping_range.max
            )));
        }
        if self.projection == Projection::Perspective {
            if self.focal_length <= 0.0 {
                return Err(Error::InvalidCamera(format!(
                    "focal length must be positive, got {}",
                    self.focal_length
                )));
            }
            if self.clipping_range.min <= 0.0 {
                return Err(Error::InvalidCamera(format!(
                    "perspective near distance must be positive, got {}",
                    self.clipping_range.min
                )));
            }
        }
        if self.transform.determinant() == 0.0 {
            return Err(Error::InvalidCamera("camera transform is singular".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
