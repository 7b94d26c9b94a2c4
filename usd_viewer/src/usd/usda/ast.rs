use crate::usd::{Specifier, Value};

/// A parsed `.usda` layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    /// Layer metadata (`defaultPrim`, `upAxis`, `subLayers`, `doc`, ...).
    pub metadata: Vec<Metadatum>,
    /// Root prim specs in authored order.
    pub prims: Vec<PrimSpec>,
}

/// One `key = value` entry of a metadata block.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadatum {
    pub key: String,
    /// `prepend`, `append`, `add`, `delete`, `reorder` or `None` for explicit.
    pub list_op: Option<ListOp>,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Prepend,
    Append,
    Add,
    Delete,
    Reorder,
}

impl ListOp {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "prepend" => Some(ListOp::Prepend),
            "append" => Some(ListOp::Append),
            "add" => Some(ListOp::Add),
            "delete" => Some(ListOp::Delete),
            "reorder" => Some(ListOp::Reorder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimSpec {
    pub specifier: Specifier,
    /// Schema type (`Camera`, `Mesh`, `Xform`); empty when untyped.
    pub type_name: String,
    pub name: String,
    pub metadata: Vec<Metadatum>,
    pub properties: Vec<PropertySpec>,
    pub children: Vec<PrimSpec>,
    /// Names of variant sets declared in the body (contents are not composed).
    pub variant_sets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertySpec {
    Attribute(AttributeSpec),
    Relationship(RelationshipSpec),
}

impl PropertySpec {
    pub fn name(&self) -> &str {
        match self {
            PropertySpec::Attribute(attr) => &attr.name,
            PropertySpec::Relationship(rel) => &rel.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variability {
    #[default]
    Varying,
    Uniform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    /// Value type name without the array suffix (`float3`, `token`, `matrix4d`).
    pub type_name: String,
    pub is_array: bool,
    pub variability: Variability,
    pub custom: bool,
    pub default: Option<Value>,
    /// `(time, value)` pairs sorted by time.
    pub time_samples: Vec<(f64, Value)>,
    /// Targets of `.connect`
    pub connections: Vec<String>,
    pub metadata: Vec<Metadatum>,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_array: false,
            variability: Variability::Varying,
            custom: false,
            default: None,
            time_samples: Vec::new(),
            connections: Vec::new(),
            metadata: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSpec {
    pub name: String,
    pub custom: bool,
    pub list_op: Option<ListOp>,
    pub targets: Vec<String>,
    pub metadata: Vec<Metadatum>,
}
