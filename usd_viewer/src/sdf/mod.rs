//! Scene description foundations: prim paths.

mod path;

pub use path::{SdfPath, is_valid_identifier};
