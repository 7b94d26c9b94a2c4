//! Attribute and metadata values
//!
//! Values keep the shape they were authored with (scalar, tuple, array,
//! dictionary); the typed accessors convert on read. Text-format matrices are
//! row-vector matrices and are transposed into glam's column-vector convention
//! by `as_dmat4`.

use glam::{DMat4, DQuat, DVec2, DVec3, DVec4};

/// A scene description value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicitly blocked value (`= None`)
    None,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Token(String),
    /// Asset path (`@./tex.png@`)
    Asset(String),
    /// Path reference (`</World/cube>`)
    Path(String),
    /// Fixed-size tuple, e.g. `(1, 2, 3)`
    Tuple(Vec<Value>),
    /// Array, e.g. `[1, 2, 3]`
    Array(Vec<Value>),
    /// `{ string key = "value" }`
    Dictionary(Vec<(String, Value)>),
}

impl Value {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Double(d) if d.fract() == 0.0 => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String, token or asset text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Token(s) | Value::Asset(s) | Value::Path(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    fn as_f64_tuple<const N: usize>(&self) -> Option<[f64; N]> {
        let items = match self {
            Value::Tuple(items) => items,
            _ => return None,
        };
        if items.len() != N {
            return None;
        }
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f64()?;
        }
        Some(out)
    }

    pub fn as_dvec2(&self) -> Option<DVec2> {
        self.as_f64_tuple::<2>().map(DVec2::from_array)
    }

    pub fn as_dvec3(&self) -> Option<DVec3> {
        self.as_f64_tuple::<3>().map(DVec3::from_array)
    }

    pub fn as_dvec4(&self) -> Option<DVec4> {
        self.as_f64_tuple::<4>().map(DVec4::from_array)
    }

    /// Quaternion authored as `(real, i, j, k)`.
    pub fn as_dquat(&self) -> Option<DQuat> {
        let [w, x, y, z] = self.as_f64_tuple::<4>()?;
        Some(DQuat::from_xyzw(x, y, z, w))
    }

    /// 4x4 matrix authored as four row tuples.
    pub fn as_dmat4(&self) -> Option<DMat4> {
        let rows = match self {
            Value::Tuple(rows) if rows.len() == 4 => rows,
            _ => return None,
        };
        let mut m = [[0.0; 4]; 4];
        for (dst, row) in m.iter_mut().zip(rows) {
            *dst = row.as_f64_tuple::<4>()?;
        }
        // row-vector rows become glam columns
        Some(DMat4::from_cols_array_2d(&m))
    }

    pub fn as_f64_array(&self) -> Option<Vec<f64>> {
        self.as_slice()?.iter().map(Value::as_f64).collect()
    }

    pub fn as_i64_array(&self) -> Option<Vec<i64>> {
        self.as_slice()?.iter().map(Value::as_i64).collect()
    }

    pub fn as_dvec3_array(&self) -> Option<Vec<DVec3>> {
        self.as_slice()?.iter().map(Value::as_dvec3).collect()
    }

    pub fn as_string_array(&self) -> Option<Vec<String>> {
        self.as_slice()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Linear interpolation between two numeric values of the same shape.
    ///
    /// Returns `None` for non-numeric or mismatched shapes; callers fall back
    /// to held interpolation.
    pub fn lerp(&self, other: &Value, t: f64) -> Option<Value> {
        match (self, other) {
            (Value::Double(_) | Value::Int(_), Value::Double(_) | Value::Int(_)) => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                Some(Value::Double(a + (b - a) * t))
            }
            (Value::Tuple(a), Value::Tuple(b)) | (Value::Array(a), Value::Array(b))
                if a.len() == b.len() =>
            {
                let items = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| x.lerp(y, t))
                    .collect::<Option<Vec<_>>>()?;
                Some(match self {
                    Value::Tuple(_) => Value::Tuple(items),
                    _ => Value::Array(items),
                })
            }
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<DVec3> for Value {
    fn from(value: DVec3) -> Self {
        Value::Tuple(value.to_array().iter().map(|c| Value::Double(*c)).collect())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Token(value.to_string())
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
