//! Numeric evaluation of generated derivatives.
//!
//! A [`DualExpr`] is compiled into bytecode for a small stack machine and
//! executed over [`Dual`] or [`HyperDual`] values. This gives the same numbers
//! the emitted source computes, without compiling it.

use crate::autodiff::{Dual, HyperDual};
use crate::error::{AutofdError, Result};
use crate::expr::MathFunction;
use crate::rewrite::{DualExpr, Real};
use crate::traits::Algebra;
use crate::types::{DifferentiationOrder, GeneratedFunction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OpCodes for the stack machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant with zero infinitesimal parts.
    LoadConst(f64),
    /// Pushes the seeded differentiation variable.
    LoadVar,
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top value (a), pushes 1 / a.
    Inv,
    /// Pops as many values as the function takes, pushes the result.
    Apply(MathFunction),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

/// Compiles a rewritten expression. Named constants are looked up once here,
/// so the bytecode is closed over their values.
pub fn compile(expr: &DualExpr, constants: &HashMap<String, f64>) -> Result<Bytecode> {
    let mut ops = Vec::with_capacity(expr.size());
    compile_recursive(expr, constants, &mut ops)?;
    Ok(Bytecode { ops })
}

fn compile_recursive(
    expr: &DualExpr,
    constants: &HashMap<String, f64>,
    ops: &mut Vec<OpCode>,
) -> Result<()> {
    match expr {
        DualExpr::Constant(Real::Literal(value)) => ops.push(OpCode::LoadConst(*value)),
        DualExpr::Constant(Real::Named(name)) => {
            let value = constants
                .get(name)
                .ok_or_else(|| AutofdError::UnboundConstant(name.clone()))?;
            ops.push(OpCode::LoadConst(*value));
        }
        DualExpr::Seeded(_) => ops.push(OpCode::LoadVar),
        DualExpr::Group(inner) => compile_recursive(inner, constants, ops)?,
        DualExpr::Add(l, r) | DualExpr::Sub(l, r) | DualExpr::Mul(l, r) => {
            compile_recursive(l, constants, ops)?;
            compile_recursive(r, constants, ops)?;
            ops.push(match expr {
                DualExpr::Add(..) => OpCode::Add,
                DualExpr::Sub(..) => OpCode::Sub,
                _ => OpCode::Mul,
            });
        }
        DualExpr::Inv(inner) => {
            compile_recursive(inner, constants, ops)?;
            ops.push(OpCode::Inv);
        }
        DualExpr::Apply(func, args) => {
            for arg in args {
                compile_recursive(arg, constants, ops)?;
            }
            ops.push(OpCode::Apply(*func));
        }
    }
    Ok(())
}

/// Stateless stack machine; `stack` is a scratch buffer reused across calls.
pub struct VM;

impl VM {
    /// Executes the bytecode with the variable at `x`.
    ///
    /// # Type Parameters
    /// * `T`: The algebra (`Dual` or `HyperDual`).
    pub fn execute<T: Algebra>(bytecode: &Bytecode, x: f64, stack: &mut Vec<T>) -> T {
        stack.clear();
        let var = T::seed(x);

        for op in &bytecode.ops {
            match op {
                OpCode::LoadConst(value) => stack.push(T::constant(*value)),
                OpCode::LoadVar => stack.push(var),
                OpCode::Add => {
                    let (a, b) = pop2(stack);
                    stack.push(a + b);
                }
                OpCode::Sub => {
                    let (a, b) = pop2(stack);
                    stack.push(a - b);
                }
                OpCode::Mul => {
                    let (a, b) = pop2(stack);
                    stack.push(a * b);
                }
                OpCode::Inv => {
                    let a = pop(stack);
                    stack.push(a.inv());
                }
                OpCode::Apply(func) => {
                    let value = match func {
                        MathFunction::Pow => {
                            let (a, b) = pop2(stack);
                            a.pow(b)
                        }
                        unary => apply_unary(*unary, pop(stack)),
                    };
                    stack.push(value);
                }
            }
        }

        // Compiled expressions always leave exactly one value.
        pop(stack)
    }
}

fn pop<T: Algebra>(stack: &mut Vec<T>) -> T {
    stack.pop().unwrap_or_else(T::zero)
}

fn pop2<T: Algebra>(stack: &mut Vec<T>) -> (T, T) {
    let b = pop(stack);
    let a = pop(stack);
    (a, b)
}

fn apply_unary<T: Algebra>(func: MathFunction, a: T) -> T {
    match func {
        MathFunction::Abs => a.abs(),
        MathFunction::Acos => a.acos(),
        MathFunction::Acosh => a.acosh(),
        MathFunction::Asin => a.asin(),
        MathFunction::Asinh => a.asinh(),
        MathFunction::Atan => a.atan(),
        MathFunction::Atanh => a.atanh(),
        MathFunction::Cos => a.cos(),
        MathFunction::Cosh => a.cosh(),
        MathFunction::Exp => a.exp(),
        MathFunction::Log => a.log(),
        MathFunction::Sin => a.sin(),
        MathFunction::Sinh => a.sinh(),
        MathFunction::Sqrt => a.sqrt(),
        MathFunction::Tan => a.tan(),
        MathFunction::Tanh => a.tanh(),
        MathFunction::Pow => a,
    }
}

/// Value and derivatives of a generated function at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivativeValue {
    pub value: f64,
    pub d1: f64,
    /// Present for second-order functions only.
    pub d2: Option<f64>,
}

/// Evaluates `func` at `x` in the algebra selected by its order.
pub fn evaluate(
    func: &GeneratedFunction,
    x: f64,
    constants: &HashMap<String, f64>,
) -> Result<DerivativeValue> {
    let bytecode = compile(&func.body, constants)?;
    Ok(match func.order {
        DifferentiationOrder::First => {
            let v: Dual = VM::execute(&bytecode, x, &mut Vec::new());
            DerivativeValue {
                value: v.real,
                d1: v.emag,
                d2: None,
            }
        }
        DifferentiationOrder::Second => {
            let v: HyperDual = VM::execute(&bytecode, x, &mut Vec::new());
            DerivativeValue {
                value: v.real,
                d1: v.e1mag,
                d2: Some(v.e1e2mag),
            }
        }
    })
}
