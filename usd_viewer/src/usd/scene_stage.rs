/// SceneStage trait: read-only view of a composed scene
///
/// Everything above the scene loader (camera resolution, transform
/// evaluation, imaging) reads the scene through this trait, so it can be
/// driven by the `.usda` stage or by a test double.

use crate::sdf::SdfPath;
use crate::usd::{Prim, TimeCode, Value};

pub trait SceneStage {
    /// Prim at `/`.
    fn pseudo_root(&self) -> Prim;

    /// Prim at `path`, `None` when nothing is authored there.
    fn prim_at_path(&self, path: &SdfPath) -> Option<Prim>;

    /// Direct children in authored order.
    fn children(&self, prim: &Prim) -> Vec<Prim>;

    /// Resolved attribute value at `time`.
    ///
    /// `None` when the attribute is missing, has no value for that time, or
    /// is blocked.
    fn attribute(&self, prim: &Prim, name: &str, time: TimeCode) -> Option<Value>;

    /// Metadata `key` authored on attribute `name`, `None` when either is
    /// missing.
    fn attribute_metadata(&self, _prim: &Prim, _name: &str, _key: &str) -> Option<Value> {
        None
    }

    /// Names of the attributes authored on `prim`, in authored order.
    fn attribute_names(&self, prim: &Prim) -> Vec<String>;

    /// Parent prim, `None` for the pseudo-root.
    fn parent(&self, prim: &Prim) -> Option<Prim> {
        prim.path().parent().and_then(|path| self.prim_at_path(&path))
    }
}
