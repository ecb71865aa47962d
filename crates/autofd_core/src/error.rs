//! Error types for derivative generation.
//!
//! - `AutofdError`: failures of a single generation request, one variant per
//!   rejection reason so callers can match on the kind.
//! - `ResolutionError`: failures reported by a source collaborator while
//!   turning an import path and a name into a `ResolvedCallable`.

use thiserror::Error;

pub type Result<T, E = AutofdError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum AutofdError {
    /// The collaborator could not produce the callable.
    #[error("could not resolve {qualified_name}: {source}")]
    Resolution {
        qualified_name: String,
        #[source]
        source: ResolutionError,
    },

    #[error("invalid function signature for {0}: expected fn(f64) -> f64")]
    SignatureMismatch(String),

    #[error("could not find a return statement in {0}")]
    NoReturnStatement(String),

    #[error("can not handle functions with multiple return statements: {name} has {count}")]
    MultipleReturnStatements { name: String, count: usize },

    #[error("naked returns not supported in {0}")]
    NakedReturnUnsupported(String),

    #[error("too many return values in {name}: found {count}")]
    MultipleReturnValues { name: String, count: usize },

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A named constant had no value when evaluating a generated function.
    #[error("no value bound for constant {0}")]
    UnboundConstant(String),

    #[error("could not write derivative: {0}")]
    Io(#[from] std::io::Error),
}

impl AutofdError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        Self::UnsupportedExpression(construct.into())
    }
}

/// Failures of the source collaborator.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("could not find package {0:?}")]
    PackageNotFound(String),

    #[error("could not find {symbol} in package {path:?}")]
    SymbolNotFound { symbol: String, path: String },

    #[error("object {symbol} in package {path:?} is not a function ({kind})")]
    NotAFunction {
        symbol: String,
        path: String,
        kind: String,
    },

    #[error("object {symbol} in package {path:?} is not a named type ({kind})")]
    NotANamedType {
        symbol: String,
        path: String,
        kind: String,
    },

    #[error("could not parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("could not read package {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
