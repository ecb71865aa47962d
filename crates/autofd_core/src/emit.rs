//! Renders a [`GeneratedFunction`] as Rust source over the `dual` or
//! `hyperdual` module.
//!
//! The text is built in memory and only handed to the sink once complete, so
//! a caller never observes a partial function.

use crate::error::Result;
use crate::rewrite::{DualExpr, Real};
use crate::types::{DifferentiationOrder, GeneratedFunction};
use std::fmt::{self, Write as _};
use std::io;

/// Source text of the whole function, including the trailing newline.
pub fn render(func: &GeneratedFunction) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_function(&mut out, func);
    out
}

/// Renders `func` and writes it to `w` in one piece.
pub fn emit<W: io::Write>(w: &mut W, func: &GeneratedFunction) -> Result<()> {
    let text = render(func);
    w.write_all(text.as_bytes())?;
    w.flush()?;
    Ok(())
}

/// Renders only the expression, as it appears on the right of `let v =`.
pub fn render_expr(expr: &DualExpr, order: DifferentiationOrder) -> String {
    let mut out = String::new();
    let _ = write_expr(&mut out, expr, order);
    out
}

fn write_function(out: &mut String, func: &GeneratedFunction) -> fmt::Result {
    writeln!(
        out,
        "pub fn {}({}: f64) -> {} {{",
        func.name,
        func.parameter_name,
        func.order.return_type()
    )?;
    write!(out, "    let v = ")?;
    write_expr(out, &func.body, func.order)?;
    writeln!(out, ";")?;
    writeln!(out, "    {}", func.order.return_expr())?;
    writeln!(out, "}}")
}

fn write_expr(out: &mut String, expr: &DualExpr, order: DifferentiationOrder) -> fmt::Result {
    let m = order.algebra();
    match expr {
        DualExpr::Constant(Real::Literal(value)) => {
            write_number(out, order, &format!("{value:?}"), order.constant_fields())
        }
        DualExpr::Constant(Real::Named(name)) => {
            write_number(out, order, name, order.constant_fields())
        }
        DualExpr::Seeded(name) => write_number(out, order, name, order.seeded_fields()),
        DualExpr::Group(inner) => {
            out.push('(');
            write_expr(out, inner, order)?;
            out.push(')');
            Ok(())
        }
        DualExpr::Add(l, r) => write_call(out, order, "add", &[l.as_ref(), r.as_ref()]),
        DualExpr::Sub(l, r) => write_call(out, order, "sub", &[l.as_ref(), r.as_ref()]),
        DualExpr::Mul(l, r) => write_call(out, order, "mul", &[l.as_ref(), r.as_ref()]),
        DualExpr::Inv(inner) => write_call(out, order, "inv", &[inner.as_ref()]),
        DualExpr::Apply(func, args) => {
            write!(out, "{m}::{}(", func.algebra_name())?;
            write_args(out, order, args.iter())?;
            out.push(')');
            Ok(())
        }
    }
}

fn write_call(
    out: &mut String,
    order: DifferentiationOrder,
    name: &str,
    args: &[&DualExpr],
) -> fmt::Result {
    write!(out, "{}::{name}(", order.algebra())?;
    write_args(out, order, args.iter().copied())?;
    out.push(')');
    Ok(())
}

fn write_args<'a>(
    out: &mut String,
    order: DifferentiationOrder,
    args: impl Iterator<Item = &'a DualExpr>,
) -> fmt::Result {
    for (i, arg) in args.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg, order)?;
    }
    Ok(())
}

fn write_number(
    out: &mut String,
    order: DifferentiationOrder,
    real: &str,
    fields: &[(&str, &str)],
) -> fmt::Result {
    write!(out, "{}::Number {{ real: {real}", order.algebra())?;
    for (field, value) in fields {
        write!(out, ", {field}: {value}")?;
    }
    out.push_str(" }");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::MathFunction;

    fn square() -> DualExpr {
        DualExpr::mul(DualExpr::seeded("x"), DualExpr::seeded("x"))
    }

    #[test]
    fn first_order_returns_emag() {
        let func = GeneratedFunction {
            name: "deriv_f1".to_string(),
            parameter_name: "x".to_string(),
            order: DifferentiationOrder::First,
            body: square(),
        };
        assert_eq!(
            render(&func),
            "pub fn deriv_f1(x: f64) -> f64 {\n    let v = dual::mul(dual::Number { real: x, emag: 1.0 }, dual::Number { real: x, emag: 1.0 });\n    v.emag\n}\n"
        );
    }

    #[test]
    fn second_order_returns_pair() {
        let func = GeneratedFunction {
            name: "dx_f1".to_string(),
            parameter_name: "y".to_string(),
            order: DifferentiationOrder::Second,
            body: DualExpr::mul(DualExpr::literal(2.0), DualExpr::seeded("y")),
        };
        let text = render(&func);
        assert!(text.starts_with("pub fn dx_f1(y: f64) -> (f64, f64) {\n"));
        assert!(text.contains(
            "hyperdual::mul(hyperdual::Number { real: 2.0, e1mag: 0.0, e2mag: 0.0, e1e2mag: 0.0 }, hyperdual::Number { real: y, e1mag: 1.0, e2mag: 1.0, e1e2mag: 0.0 })"
        ));
        assert!(text.ends_with("    (v.e1mag, v.e1e2mag)\n}\n"));
    }

    #[test]
    fn grouping_inverse_and_functions_render_in_place() {
        let expr = DualExpr::inv(DualExpr::group(DualExpr::Apply(
            MathFunction::Sqrt,
            vec![DualExpr::named("pi")],
        )));
        assert_eq!(
            render_expr(&expr, DifferentiationOrder::First),
            "dual::inv((dual::sqrt(dual::Number { real: pi, emag: 0.0 })))"
        );
    }

    #[test]
    fn literals_use_shortest_float_form() {
        let expr = DualExpr::sub(DualExpr::literal(-1.0), DualExpr::literal(1e-7));
        assert_eq!(
            render_expr(&expr, DifferentiationOrder::First),
            "dual::sub(dual::Number { real: -1.0, emag: 0.0 }, dual::Number { real: 1e-7, emag: 0.0 })"
        );
    }

    #[test]
    fn emit_writes_the_rendered_text() {
        let func = GeneratedFunction {
            name: "deriv_f1".to_string(),
            parameter_name: "x".to_string(),
            order: DifferentiationOrder::First,
            body: square(),
        };
        let mut buf = Vec::new();
        emit(&mut buf, &func).expect("emit");
        assert_eq!(String::from_utf8(buf).unwrap(), render(&func));
    }
}
