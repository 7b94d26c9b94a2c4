//! Scene access: values, prims, stages and the `.usda` reader.

pub mod usda;

mod prim;
mod scene_stage;
mod stage;
mod stage_opener;
mod time_code;
mod value;

pub use prim::{Prim, Specifier};
pub use scene_stage::SceneStage;
pub use stage::{Attribute, PrimKey, Stage};
pub use stage_opener::{InitialLoadSet, LoadStatus, StageOpener, UsdaStageOpener};
pub use time_code::TimeCode;
pub use value::Value;
