//! Geometry schemas: cameras, meshes and transformable prims.

pub mod camera;
pub mod mesh;
pub mod xform_op;
pub mod xformable;

pub use camera::UsdGeomCamera;
pub use mesh::{Interpolation, Triangle, UsdGeomMesh};
pub use xform_op::{XformOp, XformOpType};
pub use xformable::UsdGeomXformable;
