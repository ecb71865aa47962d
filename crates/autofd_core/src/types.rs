//! Core types for derivative generation.
//!
//! Everything here is created fresh per request and never mutated after
//! construction.

use crate::expr::ExprNode;
use crate::rewrite::DualExpr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which derivatives the generated function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferentiationOrder {
    /// `f'(x)` through the single-infinitesimal `dual` algebra.
    #[default]
    First,
    /// `(f'(x), f''(x))` through the two-infinitesimal `hyperdual` algebra.
    Second,
}

impl DifferentiationOrder {
    pub fn from_second(second: bool) -> Self {
        if second {
            DifferentiationOrder::Second
        } else {
            DifferentiationOrder::First
        }
    }

    /// Module of the targeted dual algebra.
    pub fn algebra(self) -> &'static str {
        match self {
            DifferentiationOrder::First => "dual",
            DifferentiationOrder::Second => "hyperdual",
        }
    }

    /// Infinitesimal fields and their value for the differentiation variable.
    pub fn seeded_fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DifferentiationOrder::First => &[("emag", "1.0")],
            DifferentiationOrder::Second => {
                &[("e1mag", "1.0"), ("e2mag", "1.0"), ("e1e2mag", "0.0")]
            }
        }
    }

    /// Infinitesimal fields and their value for anything constant in `x`.
    pub fn constant_fields(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DifferentiationOrder::First => &[("emag", "0.0")],
            DifferentiationOrder::Second => {
                &[("e1mag", "0.0"), ("e2mag", "0.0"), ("e1e2mag", "0.0")]
            }
        }
    }

    pub fn return_type(self) -> &'static str {
        match self {
            DifferentiationOrder::First => "f64",
            DifferentiationOrder::Second => "(f64, f64)",
        }
    }

    /// Expression extracting the derivatives from the evaluated value `v`.
    pub fn return_expr(self) -> &'static str {
        match self {
            DifferentiationOrder::First => "v.emag",
            DifferentiationOrder::Second => "(v.e1mag, v.e1e2mag)",
        }
    }
}

impl fmt::Display for DifferentiationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferentiationOrder::First => write!(f, "d1x"),
            DifferentiationOrder::Second => write!(f, "d2x"),
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Import path of the module holding the function.
    pub path: String,
    /// Function name, or `Type.method` for a method.
    pub name: String,
    #[serde(default)]
    pub derivative_name: Option<String>,
    #[serde(default)]
    pub order: DifferentiationOrder,
}

impl FunctionSpec {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            derivative_name: None,
            order: DifferentiationOrder::First,
        }
    }

    pub fn with_derivative_name(mut self, name: impl Into<String>) -> Self {
        self.derivative_name = Some(name.into());
        self
    }

    pub fn with_order(mut self, order: DifferentiationOrder) -> Self {
        self.order = order;
        self
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.path, self.name)
    }

    /// The explicit derivative name, or `deriv_<name>` with `.` mapped to `_`.
    pub fn derivative_name(&self) -> String {
        match self.derivative_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("deriv_{}", self.name.replace('.', "_").to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    F64,
    F32,
    Int,
    Named(String),
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::F64 => write!(f, "f64"),
            ScalarType::F32 => write!(f, "f32"),
            ScalarType::Int => write!(f, "i64"),
            ScalarType::Named(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: ScalarType,
}

/// Signature of a resolved callable. A method receiver is not a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub receiver: bool,
    pub params: Vec<Param>,
    pub results: Vec<ScalarType>,
}

/// A returned expression that the collaborator could not lower into
/// [`ExprNode`], named by the offending construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported(pub String);

pub type Lowered = Result<ExprNode, Unsupported>;

/// Statement shapes the body extractor needs to see. Straight-line
/// statements without nested returns collapse into `Opaque`.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Return(Vec<Lowered>),
    Block(Vec<Statement>),
    Branch {
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    Loop(Vec<Statement>),
    Opaque,
}

/// Output of the source collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCallable {
    pub name: String,
    pub signature: Signature,
    pub body: Vec<Statement>,
}

/// A derivative ready to be emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFunction {
    pub name: String,
    pub parameter_name: String,
    pub order: DifferentiationOrder,
    pub body: DualExpr,
}
