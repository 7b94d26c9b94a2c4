//! Error types for the USD viewer
//!
//! This module defines the error types used throughout the viewer,
//! from command-line validation through scene loading, camera resolution
//! and the rendering backends.

use std::fmt;

use crate::usd::usda::ParseError;
use crate::usd::LoadStatus;

/// Process exit status for a wrong argument count.
pub const USAGE_EXIT_CODE: i32 = 1;

/// Process exit status for a checked startup failure (load, camera, window, backend).
pub const FAILURE_EXIT_CODE: i32 = 2;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// USD viewer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Wrong command line (message carries the usage line)
    Usage(String),

    /// The scene file could not be opened and the load policy is fail-fast
    StageLoad {
        /// Path given on the command line
        path: String,
        /// Status reported by the stage opener
        status: LoadStatus,
    },

    /// Syntax error in a `.usda` layer
    Parse(ParseError),

    /// Malformed prim path string
    PathSyntax(String),

    /// No prim exists at the requested path
    PrimNotFound(String),

    /// The prim exists but its schema type does not match the requested view
    SchemaMismatch {
        /// Prim path
        path: String,
        /// Required type name
        expected: String,
        /// Type name found on the prim
        found: String,
    },

    /// Camera parameters that cannot produce a frustum
    InvalidCamera(String),

    /// Initialization failed (window system, imaging engine, presenter)
    InitializationFailed(String),

    /// Backend-specific error (Vulkan, windowing, rasterizer)
    BackendError(String),

    /// File system error
    Io(String),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => USAGE_EXIT_CODE,
            _ => FAILURE_EXIT_CODE,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "Usage: {}", msg),
            Error::StageLoad { path, status } => {
                write!(f, "Failed to open stage '{}': {} (status {})", path, status, status.code())
            }
            Error::Parse(err) => write!(f, "Parse error: {}", err),
            Error::PathSyntax(msg) => write!(f, "Invalid path: {}", msg),
            Error::PrimNotFound(path) => write!(f, "Prim not found: {}", path),
            Error::SchemaMismatch { path, expected, found } => {
                write!(f, "Schema mismatch at {}: expected {}, found {}", path, expected, found)
            }
            Error::InvalidCamera(msg) => write!(f, "Invalid camera: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
