//! The pipeline: resolve, check the signature, extract the return, rewrite,
//! emit. Each stage stops at its first error and nothing reaches the sink
//! unless every stage succeeded.

use crate::emit::{emit, render};
use crate::error::{AutofdError, Result};
use crate::eval::{evaluate, DerivativeValue};
use crate::rewrite::rewrite;
use crate::traits::Resolve;
use crate::types::{FunctionSpec, GeneratedFunction, ResolvedCallable};
use crate::validate::{extract_return, validate_signature};
use std::io::Write;
use tracing::{debug, instrument, trace};

/// Builds the derivative of an already resolved callable.
pub fn generate(spec: &FunctionSpec, resolved: &ResolvedCallable) -> Result<GeneratedFunction> {
    validate_signature(resolved)?;
    let returned = extract_return(resolved)?;
    trace!(function = %resolved.name, parameter = returned.parameter, "extracted return");
    let expr = returned
        .result
        .as_ref()
        .map_err(|unsupported| AutofdError::unsupported(unsupported.0.clone()))?;
    let body = rewrite(expr, returned.parameter)?;

    debug!(
        function = %resolved.name,
        order = %spec.order,
        nodes = body.size(),
        "rewrote returned expression"
    );
    Ok(GeneratedFunction {
        name: spec.derivative_name(),
        parameter_name: returned.parameter.to_string(),
        order: spec.order,
        body,
    })
}

/// Source text of the derivative of `resolved`.
pub fn generate_derivative(spec: &FunctionSpec, resolved: &ResolvedCallable) -> Result<String> {
    generate(spec, resolved).map(|func| render(&func))
}

/// Writes the derivative of `resolved` to `w`, or nothing on error.
pub fn write_derivative<W: Write>(
    w: &mut W,
    spec: &FunctionSpec,
    resolved: &ResolvedCallable,
) -> Result<()> {
    let func = generate(spec, resolved)?;
    emit(w, &func)?;
    trace!(function = %resolved.name, "emitted");
    Ok(())
}

/// Resolves `spec` with `resolver` and writes its derivative to `w`.
#[instrument(skip_all, fields(function = %spec.qualified_name(), order = %spec.order))]
pub fn derivative<R: Resolve, W: Write>(resolver: R, w: &mut W, spec: &FunctionSpec) -> Result<()> {
    let resolved = resolve(&resolver, spec)?;
    write_derivative(w, spec, &resolved)?;
    debug!(derivative = %spec.derivative_name(), "derivative written");
    Ok(())
}

/// Resolves `spec`, generates its derivative and evaluates it at `x` with the
/// module's constants bound.
pub fn evaluate_derivative<R: Resolve>(
    resolver: R,
    spec: &FunctionSpec,
    x: f64,
) -> Result<DerivativeValue> {
    let resolved = resolve(&resolver, spec)?;
    let func = generate(spec, &resolved)?;
    let constants = resolver
        .constants(&spec.path)
        .map_err(|source| AutofdError::Resolution {
            qualified_name: spec.qualified_name(),
            source,
        })?;
    evaluate(&func, x, &constants)
}

/// Resolves `spec`, naming it in the error on failure.
pub fn resolve<R: Resolve>(resolver: &R, spec: &FunctionSpec) -> Result<ResolvedCallable> {
    resolver
        .resolve(&spec.path, &spec.name)
        .map_err(|source| AutofdError::Resolution {
            qualified_name: spec.qualified_name(),
            source,
        })
}
