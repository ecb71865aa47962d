//! Forward-mode rewrite of a scalar expression into the dual algebra.
//!
//! Each recursive call either returns the rewritten subtree or the first
//! error met below it, so nothing is built once a descendant has failed.
//! Division becomes multiplication by the inverse because the algebra has
//! no native division; unary minus becomes multiplication by `-1`.

use crate::error::{AutofdError, Result};
use crate::expr::{BinaryOp, ExprNode, MathConstant, MathFunction, UnaryOp, MATH_NAMESPACE};

/// Real part of a value with zero infinitesimal parts.
#[derive(Debug, Clone, PartialEq)]
pub enum Real {
    Literal(f64),
    /// A name in scope of the generated function, constant in `x`.
    Named(String),
}

/// Expression over the dual-algebra contract.
#[derive(Debug, Clone, PartialEq)]
pub enum DualExpr {
    Constant(Real),
    /// The differentiation variable, seeded with unit infinitesimal(s).
    Seeded(String),
    Group(Box<DualExpr>),
    Add(Box<DualExpr>, Box<DualExpr>),
    Sub(Box<DualExpr>, Box<DualExpr>),
    Mul(Box<DualExpr>, Box<DualExpr>),
    Inv(Box<DualExpr>),
    Apply(MathFunction, Vec<DualExpr>),
}

impl DualExpr {
    pub fn literal(value: f64) -> Self {
        DualExpr::Constant(Real::Literal(value))
    }

    pub fn named(name: impl Into<String>) -> Self {
        DualExpr::Constant(Real::Named(name.into()))
    }

    pub fn seeded(name: impl Into<String>) -> Self {
        DualExpr::Seeded(name.into())
    }

    pub fn group(inner: DualExpr) -> Self {
        DualExpr::Group(Box::new(inner))
    }

    pub fn add(left: DualExpr, right: DualExpr) -> Self {
        DualExpr::Add(Box::new(left), Box::new(right))
    }

    pub fn sub(left: DualExpr, right: DualExpr) -> Self {
        DualExpr::Sub(Box::new(left), Box::new(right))
    }

    pub fn mul(left: DualExpr, right: DualExpr) -> Self {
        DualExpr::Mul(Box::new(left), Box::new(right))
    }

    pub fn inv(inner: DualExpr) -> Self {
        DualExpr::Inv(Box::new(inner))
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            DualExpr::Constant(_) | DualExpr::Seeded(_) => 1,
            DualExpr::Group(inner) | DualExpr::Inv(inner) => 1 + inner.size(),
            DualExpr::Add(l, r) | DualExpr::Sub(l, r) | DualExpr::Mul(l, r) => {
                1 + l.size() + r.size()
            }
            DualExpr::Apply(_, args) => 1 + args.iter().map(DualExpr::size).sum::<usize>(),
        }
    }
}

/// Rewrites `expr` treating `variable` as the differentiation variable.
///
/// The target order does not change the shape of the tree, only how the
/// emitter renders seeded and constant values.
pub fn rewrite(expr: &ExprNode, variable: &str) -> Result<DualExpr> {
    match expr {
        ExprNode::Literal(value) if !value.is_finite() => {
            Err(AutofdError::unsupported(format!("non-finite literal {value}")))
        }
        ExprNode::Literal(value) => Ok(DualExpr::literal(*value)),
        ExprNode::Identifier(name) if name == variable => Ok(DualExpr::seeded(name.clone())),
        ExprNode::Identifier(name) => Ok(DualExpr::named(name.clone())),
        ExprNode::Grouping(inner) => Ok(DualExpr::group(rewrite(inner, variable)?)),
        ExprNode::Unary(UnaryOp::Plus, operand) => rewrite(operand, variable),
        ExprNode::Unary(UnaryOp::Minus, operand) => Ok(DualExpr::mul(
            DualExpr::literal(-1.0),
            rewrite(operand, variable)?,
        )),
        ExprNode::Binary(left, op, right) => {
            let left = rewrite(left, variable)?;
            let right = rewrite(right, variable)?;
            Ok(match op {
                BinaryOp::Add => DualExpr::add(left, right),
                BinaryOp::Sub => DualExpr::sub(left, right),
                BinaryOp::Mul => DualExpr::mul(left, right),
                BinaryOp::Div => DualExpr::mul(left, DualExpr::inv(right)),
            })
        }
        ExprNode::Call { callee, args } => {
            let func = callee_function(callee)?;
            if args.len() != func.arity() {
                return Err(AutofdError::unsupported(format!(
                    "{expr}: math::{} takes {} argument(s), got {}",
                    func.member(),
                    func.arity(),
                    args.len()
                )));
            }
            let args = args
                .iter()
                .map(|arg| rewrite(arg, variable))
                .collect::<Result<Vec<_>>>()?;
            Ok(DualExpr::Apply(func, args))
        }
        ExprNode::NamespacedRef { namespace, member } => {
            check_namespace(namespace, member)?;
            if let Some(constant) = MathConstant::from_member(member) {
                return Ok(DualExpr::literal(constant.value()));
            }
            if MathFunction::from_member(member).is_some() {
                return Err(AutofdError::unsupported(format!(
                    "{namespace}::{member} used as a value"
                )));
            }
            Err(AutofdError::unsupported(format!("{namespace}::{member}")))
        }
    }
}

fn callee_function(callee: &ExprNode) -> Result<MathFunction> {
    match callee {
        ExprNode::NamespacedRef { namespace, member } => {
            check_namespace(namespace, member)?;
            MathFunction::from_member(member)
                .ok_or_else(|| AutofdError::unsupported(format!("{namespace}::{member}")))
        }
        other => Err(AutofdError::unsupported(format!("call of {other}"))),
    }
}

fn check_namespace(namespace: &str, member: &str) -> Result<()> {
    if namespace == MATH_NAMESPACE {
        Ok(())
    } else {
        Err(AutofdError::unsupported(format!("{namespace}::{member}")))
    }
}
