//! Syntax tree of `.sfn` source files, as produced by the parser.
//!
//! This is richer than [`ExprNode`](crate::expr::ExprNode): it also holds the
//! constructs the rewriter rejects, so they can be reported by name.

use crate::types::ScalarType;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Fn(FnDecl),
    Struct { name: String },
    Impl { ty: String, methods: Vec<FnDecl> },
    Const { name: String, ty: ScalarType, value: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    /// Takes `self` in some form.
    pub receiver: bool,
    pub params: Vec<(String, ScalarType)>,
    pub results: Vec<ScalarType>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let { name: String, value: Option<Expr> },
    Assign { target: String, value: Expr },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    Block(Vec<Stmt>),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    /// `a::b`, possibly longer.
    Path(Vec<String>),
    Paren(Box<Expr>),
    Tuple(Vec<Expr>),
    Unary(char, Box<Expr>), // -, +, !
    Binary(Box<Expr>, BinOp, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Field(Box<Expr>, String),
    MethodCall(Box<Expr>, String, Vec<Expr>),
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n:?}"),
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::Path(segments) => write!(f, "{}", segments.join("::")),
            Expr::Paren(inner) => write!(f, "({inner})"),
            Expr::Tuple(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Expr::Unary(op, operand) => write!(f, "{op}{operand}"),
            Expr::Binary(l, op, r) => write!(f, "{l} {} {r}", op.symbol()),
            Expr::Call(callee, args) => {
                write!(f, "{callee}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Field(base, field) => write!(f, "{base}.{field}"),
            Expr::MethodCall(base, method, args) => {
                write!(f, "{base}.{method}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}
