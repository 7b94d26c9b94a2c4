//! Reader for the `.usda` text layer format.
//!
//! Covers the subset a static scene needs: layer and prim metadata,
//! `def`/`over`/`class` prims, typed attributes with defaults and
//! `.timeSamples`, relationships and connections. Variant sets are parsed for
//! syntax but their contents are discarded.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ast`] | `Layer`, `PrimSpec`, `AttributeSpec`, `RelationshipSpec` |
//! | [`error`] | `ParseError` |
//! | [`lexer`] | `Lexer`, `Token` |
//! | [`parser`] | `parse_layer` entry point |

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{AttributeSpec, Layer, ListOp, Metadatum, PrimSpec, PropertySpec, RelationshipSpec, Variability};
pub use error::ParseError;
pub use parser::parse_layer;
