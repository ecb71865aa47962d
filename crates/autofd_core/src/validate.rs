//! Gates run before rewriting: the signature check and the body extractor.

use crate::error::{AutofdError, Result};
use crate::types::{Lowered, ResolvedCallable, ScalarType, Statement};

/// The sole returned expression and the differentiation variable.
#[derive(Debug, Clone, Copy)]
pub struct ReturnedExpr<'a> {
    pub parameter: &'a str,
    pub result: &'a Lowered,
}

/// Accepts exactly `fn(f64) -> f64`. A method receiver does not count as a
/// parameter.
pub fn validate_signature(callable: &ResolvedCallable) -> Result<()> {
    let sig = &callable.signature;
    let scalar_param = matches!(sig.params.as_slice(), [param] if param.ty == ScalarType::F64);
    let scalar_result = matches!(sig.results.as_slice(), [ScalarType::F64]);
    if scalar_param && scalar_result {
        Ok(())
    } else {
        Err(AutofdError::SignatureMismatch(callable.name.clone()))
    }
}

/// Finds the single `return` of a straight-line body and its single value.
pub fn extract_return(callable: &ResolvedCallable) -> Result<ReturnedExpr<'_>> {
    let parameter = match callable.signature.params.as_slice() {
        [param] => param.name.as_str(),
        _ => return Err(AutofdError::SignatureMismatch(callable.name.clone())),
    };

    let mut returns = Vec::new();
    collect_returns(&callable.body, &mut returns);

    let values = match returns.as_slice() {
        [] => return Err(AutofdError::NoReturnStatement(callable.name.clone())),
        [values] => *values,
        _ => {
            return Err(AutofdError::MultipleReturnStatements {
                name: callable.name.clone(),
                count: returns.len(),
            })
        }
    };

    match values {
        [] => Err(AutofdError::NakedReturnUnsupported(callable.name.clone())),
        [result] => Ok(ReturnedExpr { parameter, result }),
        _ => Err(AutofdError::MultipleReturnValues {
            name: callable.name.clone(),
            count: values.len(),
        }),
    }
}

fn collect_returns<'a>(body: &'a [Statement], out: &mut Vec<&'a [Lowered]>) {
    for stmt in body {
        match stmt {
            Statement::Return(values) => out.push(values),
            Statement::Block(inner) | Statement::Loop(inner) => collect_returns(inner, out),
            Statement::Branch {
                then_branch,
                else_branch,
            } => {
                collect_returns(then_branch, out);
                collect_returns(else_branch, out);
            }
            Statement::Opaque => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprNode;
    use crate::types::{Param, Signature, Unsupported};

    fn scalar_signature() -> Signature {
        Signature {
            receiver: false,
            params: vec![Param {
                name: "x".to_string(),
                ty: ScalarType::F64,
            }],
            results: vec![ScalarType::F64],
        }
    }

    fn callable(body: Vec<Statement>) -> ResolvedCallable {
        ResolvedCallable {
            name: "f".to_string(),
            signature: scalar_signature(),
            body,
        }
    }

    fn ret(values: Vec<Lowered>) -> Statement {
        Statement::Return(values)
    }

    #[test]
    fn signature_accepts_single_f64_in_and_out() {
        assert!(validate_signature(&callable(vec![])).is_ok());

        let mut method = callable(vec![]);
        method.signature.receiver = true;
        assert!(validate_signature(&method).is_ok());
    }

    #[test]
    fn signature_rejects_other_shapes() {
        let mut two_params = callable(vec![]);
        two_params.signature.params.push(Param {
            name: "y".to_string(),
            ty: ScalarType::F64,
        });

        let mut f32_param = callable(vec![]);
        f32_param.signature.params[0].ty = ScalarType::F32;

        let mut two_results = callable(vec![]);
        two_results.signature.results.push(ScalarType::F64);

        let mut no_result = callable(vec![]);
        no_result.signature.results.clear();

        let mut int_result = callable(vec![]);
        int_result.signature.results = vec![ScalarType::Int];

        for bad in [two_params, f32_param, two_results, no_result, int_result] {
            let err = validate_signature(&bad).expect_err("signature should be rejected");
            assert!(matches!(err, AutofdError::SignatureMismatch(ref name) if name == "f"));
        }
    }

    #[test]
    fn extract_return_finds_the_single_value() {
        let body = vec![Statement::Opaque, ret(vec![Ok(ExprNode::ident("x"))])];
        let f = callable(body);
        let returned = extract_return(&f).expect("single return");
        assert_eq!(returned.parameter, "x");
        assert_eq!(returned.result, &Ok(ExprNode::ident("x")));
    }

    #[test]
    fn extract_return_rejects_missing_and_naked_returns() {
        let err = extract_return(&callable(vec![Statement::Opaque])).unwrap_err();
        assert!(matches!(err, AutofdError::NoReturnStatement(_)));

        let err = extract_return(&callable(vec![ret(vec![])])).unwrap_err();
        assert!(matches!(err, AutofdError::NakedReturnUnsupported(_)));
    }

    #[test]
    fn extract_return_counts_nested_returns() {
        let branchy = callable(vec![
            Statement::Branch {
                then_branch: vec![ret(vec![Ok(ExprNode::literal(1.0))])],
                else_branch: vec![],
            },
            ret(vec![Ok(ExprNode::ident("x"))]),
        ]);
        let err = extract_return(&branchy).unwrap_err();
        assert!(matches!(err, AutofdError::MultipleReturnStatements { count: 2, .. }));

        let looped = callable(vec![
            Statement::Loop(vec![Statement::Block(vec![ret(vec![Ok(ExprNode::ident("x"))])])]),
            ret(vec![Ok(ExprNode::ident("x"))]),
        ]);
        let err = extract_return(&looped).unwrap_err();
        assert!(matches!(err, AutofdError::MultipleReturnStatements { count: 2, .. }));
    }

    #[test]
    fn extract_return_rejects_multiple_values() {
        let f = callable(vec![ret(vec![
            Ok(ExprNode::ident("x")),
            Err(Unsupported("a % b".to_string())),
        ])]);
        let err = extract_return(&f).unwrap_err();
        assert!(matches!(err, AutofdError::MultipleReturnValues { count: 2, .. }));
    }
}
