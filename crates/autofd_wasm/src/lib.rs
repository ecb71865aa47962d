use autofd_core::{derivative, evaluate_derivative, DifferentiationOrder, FunctionSpec, SourceSet};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// In-browser derivative generator over sources added at runtime.
#[wasm_bindgen]
pub struct WasmGenerator {
    sources: SourceSet,
    files: usize,
}

fn spec(
    path: &str,
    name: &str,
    derivative_name: Option<String>,
    second_order: bool,
) -> FunctionSpec {
    let spec = FunctionSpec::new(path, name)
        .with_order(DifferentiationOrder::from_second(second_order));
    match derivative_name {
        Some(der) if !der.is_empty() => spec.with_derivative_name(der),
        _ => spec,
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
impl WasmGenerator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGenerator {
        console_error_panic_hook::set_once();
        WasmGenerator {
            sources: SourceSet::new(),
            files: 0,
        }
    }

    /// Adds one `.sfn` file to the module at `path`. Syntax errors surface
    /// when a function of that module is first resolved.
    pub fn add_source(&mut self, path: &str, text: &str) {
        self.files += 1;
        let file = format!("source{}.sfn", self.files);
        self.sources.add(path, &file, text);
    }

    pub fn generate(
        &self,
        path: &str,
        name: &str,
        derivative_name: Option<String>,
        second_order: bool,
    ) -> Result<String, JsValue> {
        let spec = spec(path, name, derivative_name, second_order);
        let mut out = Vec::new();
        derivative(&self.sources, &mut out, &spec).map_err(js_error)?;
        String::from_utf8(out).map_err(js_error)
    }

    /// Returns `{ value, d1, d2 }`; `d2` is `undefined` for first order.
    pub fn evaluate(
        &self,
        path: &str,
        name: &str,
        x: f64,
        second_order: bool,
    ) -> Result<JsValue, JsValue> {
        let spec = spec(path, name, None, second_order);
        let value = evaluate_derivative(&self.sources, &spec, x).map_err(js_error)?;
        to_value(&value).map_err(|e| js_error(format!("Serialization error: {}", e)))
    }
}

impl Default for WasmGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::WasmGenerator;
    use autofd_core::DerivativeValue;
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn generator() -> WasmGenerator {
        let mut generator = WasmGenerator::new();
        generator.add_source("demo", "fn sq(x: f64) -> f64 { return x * x; }");
        generator.add_source("demo", "fn cube(x: f64) -> f64 { return math::Pow(x, 3); }");
        generator
    }

    #[wasm_bindgen_test]
    fn generates_from_any_file_of_a_module() {
        let generator = generator();
        let text = generator
            .generate("demo", "cube", Some("dcube".to_string()), false)
            .expect("generate");
        assert!(text.starts_with("pub fn dcube(x: f64) -> f64 {"));

        let text = generator.generate("demo", "sq", None, true).expect("generate");
        assert!(text.starts_with("pub fn deriv_sq(x: f64) -> (f64, f64) {"));
    }

    #[wasm_bindgen_test]
    fn reports_errors_as_strings() {
        let message = generator()
            .generate("demo", "nope", None, false)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert_eq!(
            message,
            "could not resolve demo.nope: could not find nope in package \"demo\""
        );
    }

    #[wasm_bindgen_test]
    fn evaluates_to_a_plain_object() {
        let value = generator().evaluate("demo", "cube", 2.0, true).expect("evaluate");
        let value: DerivativeValue = from_value(value).expect("derivative value");
        assert_eq!(value.value, 8.0);
        assert_eq!(value.d1, 12.0);
        assert_eq!(value.d2, Some(12.0));
    }
}
