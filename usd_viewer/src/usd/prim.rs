//! Prim handles

use crate::sdf::SdfPath;

/// How a prim spec was introduced in the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specifier {
    /// `def`: concrete, defined prim
    Def,
    /// `over`: opinion without a definition
    Over,
    /// `class`: abstract prim, never rendered
    Class,
}

impl Specifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Specifier::Def => "def",
            Specifier::Over => "over",
            Specifier::Class => "class",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "def" => Some(Specifier::Def),
            "over" => Some(Specifier::Over),
            "class" => Some(Specifier::Class),
            _ => None,
        }
    }
}

/// Lightweight handle to a prim of a stage.
///
/// Prims are addressed by path; the handle carries the schema type name so
/// typed views (`UsdGeomCamera`, `UsdGeomMesh`) can check it without another
/// stage lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prim {
    path: SdfPath,
    type_name: String,
    specifier: Specifier,
}

impl Prim {
    pub fn new(path: SdfPath, type_name: impl Into<String>, specifier: Specifier) -> Self {
        Self { path, type_name: type_name.into(), specifier }
    }

    /// Handle for the pseudo-root `/`.
    pub fn pseudo_root() -> Self {
        Self::new(SdfPath::absolute_root(), "", Specifier::Def)
    }

    pub fn path(&self) -> &SdfPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Schema type name (`"Camera"`, `"Mesh"`, `""` for typeless prims).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn is_pseudo_root(&self) -> bool {
        self.path.is_absolute_root()
    }

    /// Defined by a `def` (or `class`) spec rather than only `over`s.
    pub fn is_defined(&self) -> bool {
        self.specifier != Specifier::Over
    }

    pub fn is_abstract(&self) -> bool {
        self.specifier == Specifier::Class
    }
}
