//! The closed scalar expression grammar accepted by the rewriter.
//!
//! Collaborators lower their native syntax trees into [`ExprNode`]; anything
//! that has no counterpart here is reported as unsupported at that boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only external namespace recognised in `NamespacedRef` nodes.
pub const MATH_NAMESPACE: &str = "math";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// Scalar expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprNode {
    Literal(f64),
    Identifier(String),
    Grouping(Box<ExprNode>),
    Unary(UnaryOp, Box<ExprNode>),
    Binary(Box<ExprNode>, BinaryOp, Box<ExprNode>),
    Call {
        callee: Box<ExprNode>,
        args: Vec<ExprNode>,
    },
    NamespacedRef {
        namespace: String,
        member: String,
    },
}

impl ExprNode {
    pub fn literal(value: f64) -> Self {
        ExprNode::Literal(value)
    }

    pub fn ident(name: impl Into<String>) -> Self {
        ExprNode::Identifier(name.into())
    }

    pub fn group(inner: ExprNode) -> Self {
        ExprNode::Grouping(Box::new(inner))
    }

    pub fn neg(operand: ExprNode) -> Self {
        ExprNode::Unary(UnaryOp::Minus, Box::new(operand))
    }

    pub fn binary(left: ExprNode, op: BinaryOp, right: ExprNode) -> Self {
        ExprNode::Binary(Box::new(left), op, Box::new(right))
    }

    pub fn math(member: impl Into<String>) -> Self {
        ExprNode::NamespacedRef {
            namespace: MATH_NAMESPACE.to_string(),
            member: member.into(),
        }
    }

    pub fn call(callee: ExprNode, args: Vec<ExprNode>) -> Self {
        ExprNode::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Shorthand for `math::<member>(args...)`.
    pub fn math_call(member: impl Into<String>, args: Vec<ExprNode>) -> Self {
        Self::call(Self::math(member), args)
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Literal(value) => write!(f, "{value:?}"),
            ExprNode::Identifier(name) => write!(f, "{name}"),
            ExprNode::Grouping(inner) => write!(f, "({inner})"),
            ExprNode::Unary(UnaryOp::Plus, operand) => write!(f, "+{operand}"),
            ExprNode::Unary(UnaryOp::Minus, operand) => write!(f, "-{operand}"),
            ExprNode::Binary(left, op, right) => write!(f, "{left} {} {right}", op.symbol()),
            ExprNode::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExprNode::NamespacedRef { namespace, member } => write!(f, "{namespace}::{member}"),
        }
    }
}

/// Elementary functions the dual algebras provide under the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathFunction {
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Cos,
    Cosh,
    Exp,
    Log,
    Pow,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
}

impl MathFunction {
    pub const ALL: [MathFunction; 17] = [
        MathFunction::Abs,
        MathFunction::Acos,
        MathFunction::Acosh,
        MathFunction::Asin,
        MathFunction::Asinh,
        MathFunction::Atan,
        MathFunction::Atanh,
        MathFunction::Cos,
        MathFunction::Cosh,
        MathFunction::Exp,
        MathFunction::Log,
        MathFunction::Pow,
        MathFunction::Sin,
        MathFunction::Sinh,
        MathFunction::Sqrt,
        MathFunction::Tan,
        MathFunction::Tanh,
    ];

    pub fn from_member(member: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|func| func.member() == member)
    }

    /// Name inside the `math` namespace.
    pub fn member(self) -> &'static str {
        match self {
            MathFunction::Abs => "Abs",
            MathFunction::Acos => "Acos",
            MathFunction::Acosh => "Acosh",
            MathFunction::Asin => "Asin",
            MathFunction::Asinh => "Asinh",
            MathFunction::Atan => "Atan",
            MathFunction::Atanh => "Atanh",
            MathFunction::Cos => "Cos",
            MathFunction::Cosh => "Cosh",
            MathFunction::Exp => "Exp",
            MathFunction::Log => "Log",
            MathFunction::Pow => "Pow",
            MathFunction::Sin => "Sin",
            MathFunction::Sinh => "Sinh",
            MathFunction::Sqrt => "Sqrt",
            MathFunction::Tan => "Tan",
            MathFunction::Tanh => "Tanh",
        }
    }

    /// Name of the matching free function in the `dual`/`hyperdual` modules.
    pub fn algebra_name(self) -> &'static str {
        match self {
            MathFunction::Abs => "abs",
            MathFunction::Acos => "acos",
            MathFunction::Acosh => "acosh",
            MathFunction::Asin => "asin",
            MathFunction::Asinh => "asinh",
            MathFunction::Atan => "atan",
            MathFunction::Atanh => "atanh",
            MathFunction::Cos => "cos",
            MathFunction::Cosh => "cosh",
            MathFunction::Exp => "exp",
            MathFunction::Log => "log",
            MathFunction::Pow => "pow",
            MathFunction::Sin => "sin",
            MathFunction::Sinh => "sinh",
            MathFunction::Sqrt => "sqrt",
            MathFunction::Tan => "tan",
            MathFunction::Tanh => "tanh",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            MathFunction::Pow => 2,
            _ => 1,
        }
    }
}

/// Named constants of the `math` namespace, rewritten to their numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathConstant {
    E,
    Pi,
    Phi,
    Sqrt2,
    SqrtE,
    SqrtPi,
    SqrtPhi,
    Ln2,
    Log2E,
    Ln10,
    Log10E,
}

impl MathConstant {
    pub const ALL: [MathConstant; 11] = [
        MathConstant::E,
        MathConstant::Pi,
        MathConstant::Phi,
        MathConstant::Sqrt2,
        MathConstant::SqrtE,
        MathConstant::SqrtPi,
        MathConstant::SqrtPhi,
        MathConstant::Ln2,
        MathConstant::Log2E,
        MathConstant::Ln10,
        MathConstant::Log10E,
    ];

    pub fn from_member(member: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|constant| constant.member() == member)
    }

    pub fn member(self) -> &'static str {
        match self {
            MathConstant::E => "E",
            MathConstant::Pi => "Pi",
            MathConstant::Phi => "Phi",
            MathConstant::Sqrt2 => "Sqrt2",
            MathConstant::SqrtE => "SqrtE",
            MathConstant::SqrtPi => "SqrtPi",
            MathConstant::SqrtPhi => "SqrtPhi",
            MathConstant::Ln2 => "Ln2",
            MathConstant::Log2E => "Log2E",
            MathConstant::Ln10 => "Ln10",
            MathConstant::Log10E => "Log10E",
        }
    }

    pub fn value(self) -> f64 {
        use std::f64::consts;
        match self {
            MathConstant::E => consts::E,
            MathConstant::Pi => consts::PI,
            MathConstant::Phi => 1.618_033_988_749_895,
            MathConstant::Sqrt2 => consts::SQRT_2,
            MathConstant::SqrtE => 1.648_721_270_700_128_2,
            MathConstant::SqrtPi => 1.772_453_850_905_516,
            MathConstant::SqrtPhi => 1.272_019_649_514_069,
            MathConstant::Ln2 => consts::LN_2,
            MathConstant::Log2E => consts::LOG2_E,
            MathConstant::Ln10 => consts::LN_10,
            MathConstant::Log10E => consts::LOG10_E,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_lists_round_trip_member_names() {
        for func in MathFunction::ALL {
            assert_eq!(MathFunction::from_member(func.member()), Some(func));
            assert_eq!(func.algebra_name(), func.member().to_lowercase());
        }
        for constant in MathConstant::ALL {
            assert_eq!(MathConstant::from_member(constant.member()), Some(constant));
        }
        assert_eq!(MathFunction::from_member("Cbrt"), None);
        assert_eq!(MathConstant::from_member("Tau"), None);
        assert_eq!(MathFunction::from_member("sin"), None);
    }

    #[test]
    fn derived_constants_match_their_definitions() {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        assert!((MathConstant::Phi.value() - phi).abs() < 1e-15);
        assert!((MathConstant::SqrtPhi.value() - phi.sqrt()).abs() < 1e-15);
        assert!((MathConstant::SqrtE.value() - std::f64::consts::E.sqrt()).abs() < 1e-15);
        assert!((MathConstant::SqrtPi.value() - std::f64::consts::PI.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn display_renders_source_like_text() {
        let expr = ExprNode::binary(
            ExprNode::literal(2.0),
            BinaryOp::Div,
            ExprNode::group(ExprNode::binary(
                ExprNode::ident("x"),
                BinaryOp::Mul,
                ExprNode::math_call("Sin", vec![ExprNode::ident("x")]),
            )),
        );
        assert_eq!(expr.to_string(), "2.0 / (x * math::Sin(x))");
    }
}
