//! SdfPath: slash-delimited address of a prim in the scene hierarchy.
//!
//! Only prim paths are modelled (no property or variant selection parts).
//! Absolute paths start with `/`; the absolute root `/` addresses the
//! pseudo-root.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A validated prim path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SdfPath {
    text: String,
}

impl SdfPath {
    /// The absolute root path `/`.
    pub fn absolute_root() -> Self {
        Self { text: "/".to_string() }
    }

    /// Parse and validate a path string.
    pub fn new(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::PathSyntax("empty path".to_string()));
        }
        if text == "/" {
            return Ok(Self::absolute_root());
        }

        let body = text.strip_prefix('/').unwrap_or(text);
        if body.ends_with('/') {
            return Err(Error::PathSyntax(format!("trailing '/' in {:?}", text)));
        }
        for element in body.split('/') {
            if !is_valid_identifier(element) {
                return Err(Error::PathSyntax(format!(
                    "invalid prim name {:?} in {:?}",
                    element, text
                )));
            }
        }

        Ok(Self { text: text.to_string() })
    }

    /// Path text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True for paths that start with `/`.
    pub fn is_absolute(&self) -> bool {
        self.text.starts_with('/')
    }

    /// True for `/`.
    pub fn is_absolute_root(&self) -> bool {
        self.text == "/"
    }

    /// Last element (`""` for the absolute root).
    pub fn name(&self) -> &str {
        if self.is_absolute_root() {
            return "";
        }
        self.text.rsplit('/').next().unwrap_or("")
    }

    /// Parent path, `None` for the absolute root and single-element relative paths.
    pub fn parent(&self) -> Option<SdfPath> {
        if self.is_absolute_root() {
            return None;
        }
        match self.text.rfind('/') {
            Some(0) => Some(Self::absolute_root()),
            Some(idx) => Some(Self { text: self.text[..idx].to_string() }),
            None => None,
        }
    }

    /// Number of elements below the root.
    pub fn depth(&self) -> usize {
        self.elements().count()
    }

    /// Path elements, root first.
    pub fn elements(&self) -> impl Iterator<Item = &str> + '_ {
        self.text.split('/').filter(|e| !e.is_empty())
    }

    /// Child path `self/name`.
    pub fn append_child(&self, name: &str) -> Result<SdfPath> {
        if !is_valid_identifier(name) {
            return Err(Error::PathSyntax(format!("invalid prim name {:?}", name)));
        }
        let text = if self.is_absolute_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.text, name)
        };
        Ok(Self { text })
    }

    /// True if `self` equals `prefix` or lies below it.
    pub fn has_prefix(&self, prefix: &SdfPath) -> bool {
        if prefix.is_absolute_root() {
            return self.is_absolute();
        }
        self.text == prefix.text
            || (self.text.starts_with(&prefix.text)
                && self.text.as_bytes().get(prefix.text.len()) == Some(&b'/'))
    }
}

impl FromStr for SdfPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SdfPath::new(s)
    }
}

impl fmt::Display for SdfPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
