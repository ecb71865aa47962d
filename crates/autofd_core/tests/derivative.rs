use approx::assert_relative_eq;
use autofd_core::{
    derivative, evaluate_derivative, AutofdError, DifferentiationOrder, FunctionSpec,
    ResolutionError, SourceTree,
};
use std::path::PathBuf;

const PKG: &str = "testfunc";

fn fixtures() -> SourceTree {
    SourceTree::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

fn run(spec: &FunctionSpec) -> Result<String, AutofdError> {
    let mut out = Vec::new();
    let result = derivative(fixtures(), &mut out, spec);
    match result {
        Ok(()) => Ok(String::from_utf8(out).expect("utf-8 output")),
        Err(err) => {
            assert!(out.is_empty(), "partial output on error: {out:?}");
            Err(err)
        }
    }
}

fn d1(name: &str) -> FunctionSpec {
    FunctionSpec::new(PKG, name)
}

fn d2(name: &str) -> FunctionSpec {
    FunctionSpec::new(PKG, name).with_order(DifferentiationOrder::Second)
}

/// The differentiation variable `x` in the dual algebra.
const DX: &str = "dual::Number { real: x, emag: 1.0 }";
const HX: &str = "hyperdual::Number { real: x, e1mag: 1.0, e2mag: 1.0, e1e2mag: 0.0 }";

fn dc(real: &str) -> String {
    format!("dual::Number {{ real: {real}, emag: 0.0 }}")
}

fn hc(real: &str) -> String {
    format!("hyperdual::Number {{ real: {real}, e1mag: 0.0, e2mag: 0.0, e1e2mag: 0.0 }}")
}

fn first(name: &str, param: &str, expr: &str) -> String {
    format!("pub fn {name}({param}: f64) -> f64 {{\n    let v = {expr};\n    v.emag\n}}\n")
}

fn second(name: &str, param: &str, expr: &str) -> String {
    format!(
        "pub fn {name}({param}: f64) -> (f64, f64) {{\n    let v = {expr};\n    (v.e1mag, v.e1e2mag)\n}}\n"
    )
}

#[test]
fn first_derivative_of_square() {
    let want = "pub fn deriv_f1(x: f64) -> f64 {
    let v = dual::mul(dual::Number { real: x, emag: 1.0 }, dual::Number { real: x, emag: 1.0 });
    v.emag
}
";
    assert_eq!(run(&d1("f1")).unwrap(), want);
}

#[test]
fn explicit_derivative_name() {
    let got = run(&d1("f1").with_derivative_name("dx_f1")).unwrap();
    assert_eq!(got, first("dx_f1", "x", &format!("dual::mul({DX}, {DX})")));
}

#[test]
fn methods_on_value_and_mutable_receivers() {
    let poly = format!(
        "dual::add(dual::add(dual::mul({two}, {DX}), dual::mul(dual::mul({three}, {DX}), {DX})), \
         dual::mul({four}, dual::pow({DX}, {three})))",
        two = dc("2.0"),
        three = dc("3.0"),
        four = dc("4.0"),
    );
    let want = first("dx_f", "x", &poly);
    for name in ["T1.f", "T2.f"] {
        assert_eq!(run(&d1(name).with_derivative_name("dx_f")).unwrap(), want, "{name}");
    }
}

#[test]
fn default_name_flattens_method_paths() {
    let got = run(&d1("T1.f")).unwrap();
    assert!(got.starts_with("pub fn deriv_t1_f(x: f64) -> f64 {\n"), "{got}");
}

#[test]
fn first_derivatives_follow_the_expression_shape() {
    let cases = [
        (
            "f2",
            "y",
            "dual::mul(dual::Number { real: y, emag: 1.0 }, dual::Number { real: y, emag: 1.0 })"
                .to_string(),
        ),
        ("f3", "x", format!("dual::mul(dual::mul({}, {DX}), {DX})", dc("2.0"))),
        ("f4", "x", format!("dual::mul({}, dual::inv((dual::mul({DX}, {DX}))))", dc("2.0"))),
        (
            "f5",
            "x",
            format!(
                "dual::mul({}, dual::inv((dual::mul({DX}, dual::mul({}, {DX})))))",
                dc("2.0"),
                dc("-1.0")
            ),
        ),
        ("f6", "x", format!("dual::sub(dual::add({}, {DX}), {DX})", dc("2.0"))),
        (
            "f7",
            "x",
            format!(
                "dual::cos(dual::mul(dual::mul({}, {}), {DX}))",
                dc("2.0"),
                dc("3.141592653589793")
            ),
        ),
        (
            "f8",
            "x",
            format!(
                "dual::mul(dual::exp({DX}), dual::inv(dual::sqrt(dual::add(\
                 dual::pow(dual::sin({DX}), {three}), dual::pow(dual::cos({DX}), {three})))))",
                three = dc("3.0")
            ),
        ),
        ("f9", "x", format!("dual::mul({}, {DX})", dc("pi"))),
        ("f10", "x", format!("dual::mul(dual::log({DX}), dual::tanh({DX}))")),
    ];
    for (name, param, expr) in cases {
        let want = first(&format!("deriv_{name}"), param, &expr);
        assert_eq!(run(&d1(name)).unwrap(), want, "{name}");
    }
}

#[test]
fn second_derivatives_use_the_hyperdual_algebra() {
    let want = "pub fn deriv_f1(x: f64) -> (f64, f64) {
    let v = hyperdual::mul(hyperdual::Number { real: x, e1mag: 1.0, e2mag: 1.0, e1e2mag: 0.0 }, hyperdual::Number { real: x, e1mag: 1.0, e2mag: 1.0, e1e2mag: 0.0 });
    (v.e1mag, v.e1e2mag)
}
";
    assert_eq!(run(&d2("f1")).unwrap(), want);

    let poly = format!(
        "hyperdual::add(hyperdual::add(hyperdual::mul({two}, {HX}), hyperdual::mul(hyperdual::mul({three}, {HX}), {HX})), \
         hyperdual::mul({four}, hyperdual::pow({HX}, {three})))",
        two = hc("2.0"),
        three = hc("3.0"),
        four = hc("4.0"),
    );
    assert_eq!(
        run(&d2("T1.f").with_derivative_name("dx_f")).unwrap(),
        second("dx_f", "x", &poly)
    );
    assert_eq!(
        run(&d2("f4")).unwrap(),
        second(
            "deriv_f4",
            "x",
            &format!("hyperdual::mul({}, hyperdual::inv((hyperdual::mul({HX}, {HX}))))", hc("2.0"))
        )
    );
    assert_eq!(
        run(&d2("f9")).unwrap(),
        second("deriv_f9", "x", &format!("hyperdual::mul({}, {HX})", hc("pi")))
    );
}

#[test]
fn output_is_deterministic() {
    for name in ["f1", "f5", "f8", "T2.f"] {
        assert_eq!(run(&d2(name)).unwrap(), run(&d2(name)).unwrap());
    }
}

#[test]
fn rejects_signatures_other_than_scalar_to_scalar() {
    for name in ["err_f1", "err_f2", "err_f3", "err_f4"] {
        let err = run(&d1(name)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("invalid function signature for {name}: expected fn(f64) -> f64")
        );
    }
}

#[test]
fn rejects_bodies_without_a_single_return() {
    assert!(matches!(
        run(&d1("err_f5")),
        Err(AutofdError::NakedReturnUnsupported(ref name)) if name == "err_f5"
    ));
    for name in ["err_f6", "err_f7", "err_f8"] {
        assert!(
            matches!(
                run(&d1(name)),
                Err(AutofdError::MultipleReturnStatements { count: 2, .. })
            ),
            "{name}"
        );
    }
    assert!(matches!(
        run(&d1("err_f11")),
        Err(AutofdError::NoReturnStatement(_))
    ));
    assert!(matches!(
        run(&d2("err_f12")),
        Err(AutofdError::MultipleReturnValues { count: 2, .. })
    ));
}

#[test]
fn rejects_unsupported_expressions() {
    let err = run(&d1("err_f9")).unwrap_err();
    assert_eq!(err.to_string(), "unsupported expression: math::Cbrt");

    let err = run(&d1("err_f10")).unwrap_err();
    assert_eq!(err.to_string(), "unsupported expression: operator % in x % 2.0");
}

#[test]
fn resolution_failures() {
    let cases = [
        (
            FunctionSpec::new("testfuncXXX", "f1"),
            "could not resolve testfuncXXX.f1: could not find package \"testfuncXXX\"",
        ),
        (
            d1("f1xxx"),
            "could not resolve testfunc.f1xxx: could not find f1xxx in package \"testfunc\"",
        ),
        (
            d1("Fxxx.f"),
            "could not resolve testfunc.Fxxx.f: could not find Fxxx in package \"testfunc\"",
        ),
        (
            d1("f1.f"),
            "could not resolve testfunc.f1.f: object f1 in package \"testfunc\" is not a named type (fn)",
        ),
        (
            d1("T1"),
            "could not resolve testfunc.T1: object T1 in package \"testfunc\" is not a function (struct)",
        ),
        (
            d1("c"),
            "could not resolve testfunc.c: object c in package \"testfunc\" is not a function (const)",
        ),
        (
            d1("T1.fxxx"),
            "could not resolve testfunc.T1.fxxx: could not find T1.fxxx in package \"testfunc\"",
        ),
        (
            d1("ErrT1.f"),
            "could not resolve testfunc.ErrT1.f: could not find ErrT1.f in package \"testfunc\"",
        ),
    ];
    for (spec, want) in cases {
        let err = run(&spec).unwrap_err();
        assert!(matches!(err, AutofdError::Resolution { .. }));
        assert_eq!(err.to_string(), want);
    }
}

#[test]
fn resolution_error_keeps_its_source() {
    let err = run(&d1("f1xxx")).unwrap_err();
    let source = std::error::Error::source(&err).expect("source");
    let source = source
        .downcast_ref::<ResolutionError>()
        .expect("resolution error");
    assert!(matches!(source, ResolutionError::SymbolNotFound { .. }));
}

fn eval(spec: &FunctionSpec, x: f64) -> autofd_core::DerivativeValue {
    evaluate_derivative(fixtures(), spec, x).expect("evaluate")
}

#[test]
fn evaluated_derivatives_match_closed_forms() {
    let x = 0.7;
    let pi = std::f64::consts::PI;

    let v = eval(&d2("f1"), x);
    assert_relative_eq!(v.value, x * x);
    assert_relative_eq!(v.d1, 2.0 * x);
    assert_relative_eq!(v.d2.unwrap(), 2.0);

    let v = eval(&d2("f4"), x);
    assert_relative_eq!(v.d1, -4.0 / (x * x * x), max_relative = 1e-12);
    assert_relative_eq!(v.d2.unwrap(), 12.0 / (x * x * x * x), max_relative = 1e-12);

    let v = eval(&d1("f7"), x);
    assert_relative_eq!(v.d1, -2.0 * pi * (2.0 * pi * x).sin(), max_relative = 1e-12);

    let v = eval(&d2("T2.f"), x);
    assert_relative_eq!(v.d1, 2.0 + 6.0 * x + 12.0 * x * x, max_relative = 1e-12);
    assert_relative_eq!(v.d2.unwrap(), 6.0 + 24.0 * x, max_relative = 1e-12);

    // `pi` is bound from the module constant.
    let v = eval(&d1("f9"), x);
    assert_relative_eq!(v.d1, pi);
}

#[test]
fn evaluated_derivative_matches_finite_difference() {
    let h = 1e-5;
    for x in [0.3, 0.9, 1.4] {
        let v = eval(&d2("f8"), x);
        let up = eval(&d1("f8"), x + h);
        let down = eval(&d1("f8"), x - h);
        assert_relative_eq!(v.d1, (up.value - down.value) / (2.0 * h), max_relative = 1e-6);
        assert_relative_eq!(v.d2.unwrap(), (up.d1 - down.d1) / (2.0 * h), max_relative = 1e-5);
    }
}
