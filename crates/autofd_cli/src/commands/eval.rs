//! Eval command implementation
//!
//! Evaluates a derivative numerically with the reference dual algebra.

use super::generate::spec;
use crate::Result;
use autofd_core::{evaluate_derivative, DerivativeValue, SourceTree};
use std::path::Path;
use tracing::info;

pub fn format_value(value: &DerivativeValue) -> String {
    let mut text = format!("f   = {}\nf'  = {}\n", value.value, value.d1);
    if let Some(d2) = value.d2 {
        text.push_str(&format!("f'' = {d2}\n"));
    }
    text
}

/// Run the eval command
pub fn run(root: &Path, pkg: &str, fct: &str, at: f64, d2: bool) -> Result<()> {
    let spec = spec(pkg, fct, None, d2);
    info!(function = %spec.qualified_name(), x = at, "evaluating derivative");
    let value = evaluate_derivative(SourceTree::new(root), &spec, at)?;
    print!("{}", format_value(&value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_derivative_line_only_when_present() {
        let first = DerivativeValue {
            value: 4.0,
            d1: 4.0,
            d2: None,
        };
        assert_eq!(format_value(&first), "f   = 4\nf'  = 4\n");

        let second = DerivativeValue {
            d2: Some(2.0),
            ..first
        };
        assert_eq!(format_value(&second), "f   = 4\nf'  = 4\nf'' = 2\n");
    }
}
