//! Batch command implementation
//!
//! Generates every function listed in a config file. Requests are
//! independent and run in parallel; output keeps the config order.

use super::write_output;
use crate::config::BatchConfig;
use crate::{CliError, Result};
use autofd_core::{generate_derivative, resolve, AutofdError, FunctionSpec, Resolve, SourceTree};
use rayon::prelude::*;
use std::path::Path;
use tracing::{error, info};

/// Generates each spec on its own; one result per spec, in order.
pub fn generate_all<R: Resolve + Sync>(
    resolver: &R,
    specs: &[FunctionSpec],
) -> Vec<std::result::Result<String, AutofdError>> {
    specs
        .par_iter()
        .map(|spec| {
            let resolved = resolve(resolver, spec)?;
            generate_derivative(spec, &resolved)
        })
        .collect()
}

/// Joins the successes with a blank line between functions and logs every
/// failure. Returns the text and the number of failures.
pub fn collect(
    specs: &[FunctionSpec],
    results: Vec<std::result::Result<String, AutofdError>>,
) -> (String, usize) {
    let mut text = String::new();
    let mut failed = 0;
    for (spec, result) in specs.iter().zip(results) {
        match result {
            Ok(source) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&source);
            }
            Err(err) => {
                failed += 1;
                error!(function = %spec.qualified_name(), "{err}");
            }
        }
    }
    (text, failed)
}

/// Run the batch command
pub fn run(config_path: &Path) -> Result<()> {
    let config = BatchConfig::load(config_path)?;
    info!(
        root = %config.root.display(),
        functions = config.functions.len(),
        "starting batch"
    );

    let resolver = SourceTree::new(&config.root);
    let results = generate_all(&resolver, &config.functions);
    let (text, failed) = collect(&config.functions, results);
    write_output(&text, config.output.as_deref())?;

    if failed > 0 {
        return Err(CliError::BatchFailed {
            failed,
            total: config.functions.len(),
        });
    }
    info!("batch complete");
    Ok(())
}
