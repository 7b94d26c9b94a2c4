//! Camera math: ranges, boxes, the physical camera model and its frustum.

pub mod camera;
pub mod frustum;
pub mod range;

pub use camera::{FovDirection, GfCamera, Projection};
pub use frustum::{Frustum, FrustumPlanes, FrustumTest};
pub use range::{Aabb, Range1d, Range2d};
