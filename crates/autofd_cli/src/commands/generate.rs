//! Generate command implementation
//!
//! Resolves one function from a source tree and emits its derivative.

use super::write_output;
use crate::Result;
use autofd_core::{derivative, DifferentiationOrder, FunctionSpec, SourceTree};
use std::path::Path;
use tracing::info;

/// Builds the request the flags describe.
pub fn spec(pkg: &str, fct: &str, der: Option<&str>, d2: bool) -> FunctionSpec {
    let mut spec =
        FunctionSpec::new(pkg, fct).with_order(DifferentiationOrder::from_second(d2));
    if let Some(name) = der {
        spec = spec.with_derivative_name(name);
    }
    spec
}

/// Source text of the derivative, or the first error.
pub fn render(root: &Path, spec: &FunctionSpec) -> Result<String> {
    let mut buf = Vec::new();
    derivative(SourceTree::new(root), &mut buf, spec)?;
    // The emitter only writes UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run the generate command
pub fn run(
    root: &Path,
    pkg: &str,
    fct: &str,
    der: Option<&str>,
    d2: bool,
    out: Option<&Path>,
) -> Result<()> {
    let spec = spec(pkg, fct, der, d2);
    info!(function = %spec.qualified_name(), order = %spec.order, "generating derivative");
    let text = render(root, &spec)?;
    write_output(&text, out)
}
