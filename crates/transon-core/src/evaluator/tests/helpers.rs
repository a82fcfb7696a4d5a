//! Shared test helpers for evaluator tests

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{ErrorKind, TransformError};
use crate::output::Output;
use crate::registry::TemplateLoader;
use crate::transformer::Transformer;

/// Transform `data` with `template`, panicking on errors
pub(super) fn run(template: Value, data: Value) -> Output {
    Transformer::new(&template)
        .and_then(|t| t.transform(&data))
        .unwrap_or_else(|e| panic!("transform failed: {}", e))
}

/// Transform and expect a value (not "no content")
pub(super) fn run_value(template: Value, data: Value) -> Value {
    match run(template, data) {
        Output::Value(value) => value,
        Output::NoContent => panic!("Expected a value, got no content"),
    }
}

/// Transform and expect an error
pub(super) fn run_err(template: Value, data: Value) -> TransformError {
    match Transformer::new(&template).and_then(|t| t.transform(&data)) {
        Ok(output) => panic!("Expected an error, got {:?}", output),
        Err(err) => err,
    }
}

/// Assert the error kind and return the rendered location
pub(super) fn assert_kind(err: &TransformError, kind: ErrorKind) -> String {
    assert_eq!(err.kind(), kind, "unexpected error: {}", err);
    err.path().map(|p| p.to_string()).unwrap_or_default()
}

/// Loader over an in-memory map of named templates
pub(super) fn loader(templates: Value) -> Rc<dyn TemplateLoader> {
    let map: HashMap<String, Value> = match templates {
        Value::Object(map) => map.into_iter().collect(),
        other => panic!("Expected a map of templates, got {}", other),
    };
    Rc::new(map)
}
