/// Transform operations named by `xformOpOrder`
///
/// Each entry of `xformOpOrder` names an attribute `xformOp:<type>[:<suffix>]`,
/// optionally prefixed with `!invert!`. The special entry `!resetXformStack!`
/// discards the parent transform.

use glam::{DMat4, DVec3};

use crate::usd::Value;

/// Entry that makes a prim ignore its parent's transform.
pub const RESET_XFORM_STACK: &str = "!resetXformStack!";

const INVERT_PREFIX: &str = "!invert!";
const OP_NAMESPACE: &str = "xformOp:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    fn rotation(self, degrees: f64) -> DMat4 {
        let radians = degrees.to_radians();
        match self {
            Axis::X => DMat4::from_rotation_x(radians),
            Axis::Y => DMat4::from_rotation_y(radians),
            Axis::Z => DMat4::from_rotation_z(radians),
        }
    }

    fn component(self, v: DVec3) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XformOpType {
    Translate,
    Scale,
    /// Single-axis rotation in degrees
    Rotate(Axis),
    /// Three-axis rotation; the first axis is applied first
    RotateEuler([Axis; 3]),
    /// Quaternion rotation
    Orient,
    /// Full 4x4 matrix
    Transform,
}

impl XformOpType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "translate" => Some(XformOpType::Translate),
            "scale" => Some(XformOpType::Scale),
            "orient" => Some(XformOpType::Orient),
            "transform" => Some(XformOpType::Transform),
            _ => {
                let axes = name.strip_prefix("rotate")?;
                let parsed: Vec<Axis> = axes.chars().map(Axis::from_char).collect::<Option<_>>()?;
                match parsed.as_slice() {
                    [axis] => Some(XformOpType::Rotate(*axis)),
                    [a, b, c] if a != b && b != c && a != c => Some(XformOpType::RotateEuler([*a, *b, *c])),
                    _ => None,
                }
            }
        }
    }
}

/// One parsed `xformOpOrder` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct XformOp {
    pub op_type: XformOpType,
    /// Attribute holding the op value, e.g. `xformOp:translate:pivot`
    pub attribute_name: String,
    pub inverse: bool,
}

impl XformOp {
    /// Parse an `xformOpOrder` token. `None` for unknown op types and for
    /// `!resetXformStack!`.
    pub fn parse(token: &str) -> Option<Self> {
        let (inverse, attribute_name) = match token.strip_prefix(INVERT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let op_name = attribute_name.strip_prefix(OP_NAMESPACE)?;
        let type_name = op_name.split(':').next()?;
        let op_type = XformOpType::from_name(type_name)?;
        Some(Self { op_type, attribute_name: attribute_name.to_string(), inverse })
    }

    /// Column-vector matrix of this op for `value`, `None` when the value has
    /// the wrong shape.
    pub fn matrix(&self, value: &Value) -> Option<DMat4> {
        let m = match self.op_type {
            XformOpType::Translate => DMat4::from_translation(value.as_dvec3()?),
            XformOpType::Scale => DMat4::from_scale(value.as_dvec3()?),
            XformOpType::Rotate(axis) => axis.rotation(value.as_f64()?),
            XformOpType::RotateEuler(axes) => {
                let angles = value.as_dvec3()?;
                axes.iter()
                    .fold(DMat4::IDENTITY, |m, axis| axis.rotation(axis.component(angles)) * m)
            }
            XformOpType::Orient => DMat4::from_quat(value.as_dquat()?.normalize()),
            XformOpType::Transform => value.as_dmat4()?,
        };
        Some(if self.inverse { m.inverse() } else { m })
    }
}
