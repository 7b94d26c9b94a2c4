/// UsdGeomXformable: transform evaluation for any prim
///
/// The local transform is the product of the ops named by `xformOpOrder`, in
/// order (`op0 * op1 * ...`, so the last op applies to points first). Prims
/// without `xformOpOrder` contribute identity.

use glam::DMat4;

use crate::usd::{Prim, SceneStage, TimeCode};
use crate::viewer_warn;

use super::xform_op::{XformOp, RESET_XFORM_STACK};

pub const XFORM_OP_ORDER: &str = "xformOpOrder";

pub struct UsdGeomXformable<'s, S: SceneStage + ?Sized> {
    stage: &'s S,
    prim: Prim,
}

impl<'s, S: SceneStage + ?Sized> UsdGeomXformable<'s, S> {
    pub fn new(stage: &'s S, prim: Prim) -> Self {
        Self { stage, prim }
    }

    pub fn prim(&self) -> &Prim {
        &self.prim
    }

    /// Parsed `xformOpOrder` and whether it starts with `!resetXformStack!`.
    pub fn ordered_xform_ops(&self, time: TimeCode) -> (Vec<XformOp>, bool) {
        let order = self
            .stage
            .attribute(&self.prim, XFORM_OP_ORDER, time)
            .and_then(|v| v.as_string_array())
            .unwrap_or_default();

        // ops before the last reset are discarded
        let start = order.iter().rposition(|t| t == RESET_XFORM_STACK);
        let resets = start.is_some();
        let tokens = &order[start.map_or(0, |i| i + 1)..];

        let ops = tokens
            .iter()
            .filter_map(|token| {
                let op = XformOp::parse(token);
                if op.is_none() {
                    viewer_warn!(
                        "usd_viewer::UsdGeomXformable",
                        "Unknown xform op '{}' on {}",
                        token,
                        self.prim.path()
                    );
                }
                op
            })
            .collect();
        (ops, resets)
    }

    /// Local transform and whether it resets the parent transform.
    pub fn local_transformation(&self, time: TimeCode) -> (DMat4, bool) {
        let (ops, resets) = self.ordered_xform_ops(time);
        let mut local = DMat4::IDENTITY;
        for op in &ops {
            let value = self.stage.attribute(&self.prim, &op.attribute_name, time);
            match value.as_ref().and_then(|v| op.matrix(v)) {
                Some(m) => local *= m,
                None => viewer_warn!(
                    "usd_viewer::UsdGeomXformable",
                    "Xform op '{}' on {} has no usable value, skipped",
                    op.attribute_name,
                    self.prim.path()
                ),
            }
        }
        (local, resets)
    }

    /// Transform from this prim's space to world space.
    pub fn local_to_world(&self, time: TimeCode) -> DMat4 {
        let (local, resets) = self.local_transformation(time);
        if resets {
            return local;
        }
        match self.stage.parent(&self.prim) {
            Some(parent) if !parent.is_pseudo_root() => {
                UsdGeomXformable::new(self.stage, parent).local_to_world(time) * local
            }
            _ => local,
        }
    }
}

#[cfg(test)]
#[path = "xformable_tests.rs"]
mod tests;
