//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod batch;
pub mod eval;
pub mod generate;

use crate::{CliError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Writes generated source to `out`, or to stdout when no file is given.
pub(crate) fn write_output(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => fs::write(path, text).map_err(|source| CliError::Output {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| CliError::Output {
                    path: "<stdout>".into(),
                    source,
                })
        }
    }
}
