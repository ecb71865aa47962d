//! Lowering of parsed `.sfn` syntax into the closed grammar.
//!
//! Constructs without a counterpart in [`ExprNode`] are not errors here;
//! they become [`Unsupported`] values that the generator reports once the
//! body has passed the structural checks.

use super::ast::{BinOp, Expr, Stmt};
use crate::expr::{BinaryOp, ExprNode, UnaryOp};
use crate::types::{Lowered, Statement, Unsupported};

pub fn lower_body(body: &[Stmt]) -> Vec<Statement> {
    body.iter().map(lower_statement).collect()
}

fn lower_statement(stmt: &Stmt) -> Statement {
    match stmt {
        Stmt::Return(None) => Statement::Return(Vec::new()),
        Stmt::Return(Some(Expr::Tuple(values))) => {
            Statement::Return(values.iter().map(lower_expr).collect())
        }
        Stmt::Return(Some(value)) => Statement::Return(vec![lower_expr(value)]),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => Statement::Branch {
            then_branch: lower_body(then_branch),
            else_branch: lower_body(else_branch),
        },
        Stmt::While { body, .. } => Statement::Loop(lower_body(body)),
        Stmt::Block(inner) => Statement::Block(lower_body(inner)),
        Stmt::Let { .. } | Stmt::Assign { .. } | Stmt::Expr(_) => Statement::Opaque,
    }
}

pub fn lower_expr(expr: &Expr) -> Lowered {
    match expr {
        Expr::Number(n) => Ok(ExprNode::Literal(*n)),
        Expr::Ident(name) => Ok(ExprNode::Identifier(name.clone())),
        Expr::Path(segments) => match segments.as_slice() {
            [namespace, member] => Ok(ExprNode::NamespacedRef {
                namespace: namespace.clone(),
                member: member.clone(),
            }),
            _ => Err(unsupported(expr, "nested path")),
        },
        Expr::Paren(inner) => Ok(ExprNode::Grouping(Box::new(lower_expr(inner)?))),
        Expr::Tuple(_) => Err(unsupported(expr, "tuple")),
        Expr::Unary(op, operand) => {
            let op = match op {
                '-' => UnaryOp::Minus,
                '+' => UnaryOp::Plus,
                _ => return Err(unsupported(expr, &format!("operator {op}"))),
            };
            Ok(ExprNode::Unary(op, Box::new(lower_expr(operand)?)))
        }
        Expr::Binary(left, op, right) => {
            let op = match op {
                BinOp::Add => BinaryOp::Add,
                BinOp::Sub => BinaryOp::Sub,
                BinOp::Mul => BinaryOp::Mul,
                BinOp::Div => BinaryOp::Div,
                other => return Err(unsupported(expr, &format!("operator {}", other.symbol()))),
            };
            Ok(ExprNode::Binary(
                Box::new(lower_expr(left)?),
                op,
                Box::new(lower_expr(right)?),
            ))
        }
        Expr::Call(callee, args) => Ok(ExprNode::Call {
            callee: Box::new(lower_expr(callee)?),
            args: args.iter().map(lower_expr).collect::<Result<_, _>>()?,
        }),
        Expr::Field(..) => Err(unsupported(expr, "field access")),
        Expr::MethodCall(..) => Err(unsupported(expr, "method call")),
    }
}

fn unsupported(expr: &Expr, what: &str) -> Unsupported {
    Unsupported(format!("{what} in {expr}"))
}
