//! Command-line interface for usd_view.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Program name used in the usage line when argv[0] is missing.
pub const PROGRAM_NAME: &str = "usd_view";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub program: String,
    /// Scene file to open.
    pub scene_path: PathBuf,
}

impl CliArgs {
    /// Parse the full argument list (program name first).
    ///
    /// Exactly one positional argument is accepted:
    /// - `usd_view <scene.usda>`
    ///
    /// Anything else is an `Error::Usage` carrying the usage line.
    /// The scene path is kept as an `OsString`, so paths that are not valid
    /// UTF-8 reach the opener unchanged.
    pub fn parse<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args
            .next()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| PROGRAM_NAME.to_string());
        let mut positional: Vec<OsString> = args.collect();

        match positional.len() {
            1 => Ok(CliArgs { program, scene_path: PathBuf::from(positional.remove(0)) }),
            _ => Err(Error::Usage(usage(&program))),
        }
    }
}

/// `<program> <scene.usda>`
pub fn usage(program: &str) -> String {
    format!("{} <scene.usda>", program)
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
