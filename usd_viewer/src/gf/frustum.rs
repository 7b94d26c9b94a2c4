/// Frustum: the viewing volume of a camera.
///
/// Position and rotation place the frustum in world space; the window is the
/// rectangle on the reference plane at distance 1 (perspective) or the
/// view-space extent (orthographic); near/far bound it along -Z.
///
/// Matrices follow OpenGL conventions: right-handed view space looking down
/// -Z, clip-space depth in [-1, 1], column vectors.

use glam::{DMat4, DQuat, DVec3, DVec4};

use super::camera::Projection;
use super::range::{Aabb, Range1d, Range2d};

/// Result of a 3-way frustum/AABB classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    position: DVec3,
    rotation: DQuat,
    window: Range2d,
    near_far: Range1d,
    projection: Projection,
}

impl Frustum {
    pub fn new(
        position: DVec3,
        rotation: DQuat,
        window: Range2d,
        near_far: Range1d,
        projection: Projection,
    ) -> Self {
        Self { position, rotation, window, near_far, projection }
    }

    /// Frustum placed by a camera-to-world transform.
    ///
    /// Scale and shear are removed; only the rigid part positions the frustum.
    pub fn from_camera_transform(
        transform: &DMat4,
        window: Range2d,
        near_far: Range1d,
        projection: Projection,
    ) -> Self {
        let (_, rotation, translation) = transform.to_scale_rotation_translation();
        Self::new(translation, rotation.normalize(), window, near_far, projection)
    }

    // ===== GETTERS =====

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    pub fn window(&self) -> Range2d {
        self.window
    }

    pub fn near_far(&self) -> Range1d {
        self.near_far
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    // ===== MATRICES =====

    /// Projection matrix (GL frustum or GL ortho).
    pub fn compute_projection_matrix(&self) -> DMat4 {
        let (n, f) = (self.near_far.min, self.near_far.max);
        match self.projection {
            Projection::Perspective => {
                let l = self.window.min.x * n;
                let r = self.window.max.x * n;
                let b = self.window.min.y * n;
                let t = self.window.max.y * n;
                DMat4::from_cols(
                    DVec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
                    DVec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
                    DVec4::new((r + l) / (r - l), (t + b) / (t - b), -(f + n) / (f - n), -1.0),
                    DVec4::new(0.0, 0.0, -2.0 * f * n / (f - n), 0.0),
                )
            }
            Projection::Orthographic => DMat4::orthographic_rh_gl(
                self.window.min.x,
                self.window.max.x,
                self.window.min.y,
                self.window.max.y,
                n,
                f,
            ),
        }
    }

    /// World-to-view matrix: inverse of the rigid camera-to-world transform.
    pub fn compute_view_matrix(&self) -> DMat4 {
        self.compute_view_inverse().inverse()
    }

    /// Camera-to-world matrix.
    pub fn compute_view_inverse(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Combined view-projection matrix (projection * view).
    pub fn compute_view_projection(&self) -> DMat4 {
        self.compute_projection_matrix() * self.compute_view_matrix()
    }

    /// Unit view direction in world space.
    pub fn view_direction(&self) -> DVec3 {
        self.rotation * DVec3::NEG_Z
    }

    // ===== CULLING =====

    /// World-space clipping planes.
    pub fn planes(&self) -> FrustumPlanes {
        FrustumPlanes::from_view_projection(&self.compute_view_projection())
    }

    /// Conservative world-space box test.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes().intersects_aabb(aabb)
    }
}

/// Six frustum planes for culling.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumPlanes {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [DVec4; 6],
}

impl FrustumPlanes {
    /// Extract planes from a view-projection matrix with GL depth range.
    ///
    /// Uses the Gribb & Hartmann method.
    pub fn from_view_projection(vp: &DMat4) -> Self {
        let m = vp.to_cols_array_2d();

        // Gribb & Hartmann: extract planes from rows of the VP matrix
        let mut planes = [
            // Left:   row3 + row0
            DVec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            DVec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            DVec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            DVec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            DVec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            DVec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Positive-vertex test: `false` only when the box is fully outside one
    /// plane. May return false positives, never false negatives.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }

    /// Classify a box against the frustum (3-way test).
    pub fn classify_aabb(&self, aabb: &Aabb) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            // Positive vertex: corner most in the direction of the normal
            let p_vertex = DVec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            // Negative vertex: corner least in the direction of the normal
            let n_vertex = DVec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
