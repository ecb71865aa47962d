/// The `autofd_core` crate generates forward-mode derivatives of scalar
/// functions at the source level.
///
/// Given a function `fn(f64) -> f64` whose body is a single `return` of an
/// arithmetic expression, it emits a new function that evaluates the same
/// expression over dual numbers (first derivative) or hyperdual numbers
/// (second derivative) and returns the derivative parts.
///
/// Key components:
/// - **Traits**: `Algebra` (dual number systems), `Resolve` (source collaborator).
/// - **Pipeline**: signature check, body extraction, rewrite, emission.
/// - **Source**: a parser and resolvers for `.sfn` scalar-function modules.
/// - **Eval**: a bytecode VM that evaluates generated derivatives numerically.
pub mod autodiff;
pub mod emit;
pub mod error;
pub mod eval;
pub mod expr;
pub mod generator;
pub mod rewrite;
pub mod source;
pub mod traits;
pub mod types;
pub mod validate;

pub use error::{AutofdError, ResolutionError, Result};
pub use eval::{evaluate, DerivativeValue};
pub use generator::{
    derivative, evaluate_derivative, generate, generate_derivative, resolve, write_derivative,
};
pub use source::{SourceSet, SourceTree};
pub use traits::{Algebra, Resolve};
pub use types::{DifferentiationOrder, FunctionSpec, GeneratedFunction, ResolvedCallable};
