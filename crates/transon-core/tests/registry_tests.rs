//! Integration tests for named template resolution

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::{json, Value};
use transon_core::config::consts::MAX_DEPTH_LIMIT;
use transon_core::{ErrorKind, Result, TemplateLoader, TransformError, TransformOptions, Transformer};

/// Loader that records every name it is asked for
struct RecordingLoader {
    templates: HashMap<String, Value>,
    calls: RefCell<Vec<String>>,
}

impl RecordingLoader {
    fn new(templates: Value) -> Rc<Self> {
        let templates = serde_json::from_value(templates).unwrap();
        Rc::new(Self {
            templates,
            calls: RefCell::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl TemplateLoader for RecordingLoader {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        self.calls.borrow_mut().push(name.to_string());
        Ok(self.templates.get(name).cloned())
    }
}

#[test]
fn test_loader_called_once_per_name() {
    let loader = RecordingLoader::new(json!({"item": {"$": "expr", "op": "*", "value": 2}}));
    let template = json!({"$": "map", "item": {"$": "include", "name": "item"}});
    let transformer = Transformer::with_loader(&template, loader.clone()).unwrap();
    assert!(loader.calls().is_empty());

    assert_eq!(transformer.transform(&json!([1, 2, 3])).unwrap(), json!([2, 4, 6]));
    assert_eq!(transformer.transform(&json!([4])).unwrap(), json!([8]));
    assert_eq!(loader.calls(), ["item"]);
}

#[test]
fn test_loader_calls_follow_document_order() {
    let loader = RecordingLoader::new(json!({
        "a": {"nested": {"$": "include", "name": "c"}},
        "b": 2,
        "c": 3
    }));
    let template = json!([
        {"$": "include", "name": "a"},
        {"$": "include", "name": "b"},
        {"$": "include", "name": "c"}
    ]);
    let transformer = Transformer::with_loader(&template, loader.clone()).unwrap();
    assert_eq!(loader.calls(), ["a", "c", "b"]);
    assert_eq!(
        transformer.transform(&json!(null)).unwrap(),
        json!([{"nested": 3}, 2, 3])
    );
    assert_eq!(loader.calls().len(), 3);
}

#[test]
fn test_unconditional_cycle_fails_construction() {
    let loader = RecordingLoader::new(json!({
        "a": {"$": "include", "name": "b"},
        "b": {"$": "include", "name": "a"}
    }));
    let err = Transformer::with_loader(&json!({"$": "include", "name": "a"}), loader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicReference);
    assert!(err.to_string().contains("a -> b -> a"), "{}", err);
}

#[test]
fn test_self_include_without_guard_is_cycle() {
    let loader = RecordingLoader::new(json!({"me": [{"$": "include", "name": "me"}]}));
    let err = Transformer::with_loader(&json!({"$": "include", "name": "me"}), loader).unwrap_err();
    match err {
        TransformError::CyclicReference { chain, .. } => assert_eq!(chain, ["me", "me"]),
        other => panic!("Expected CyclicReference, got {}", other),
    }
}

#[test]
fn test_cycle_inside_default_fallback_is_lazy() {
    let loader = RecordingLoader::new(json!({
        "a": {"$": "default", "value": {"$": "attr", "name": "x"}, "fallback": {"$": "include", "name": "b"}},
        "b": {"$": "include", "name": "a", "value": {"x": "from b"}}
    }));
    let transformer =
        Transformer::with_loader(&json!({"$": "include", "name": "a"}), loader.clone()).unwrap();
    assert_eq!(loader.calls(), ["a"]);
    assert_eq!(transformer.transform(&json!({"x": 1})).unwrap(), json!(1));
    assert_eq!(transformer.transform(&json!({})).unwrap(), json!("from b"));
    assert_eq!(loader.calls(), ["a", "b"]);
}

#[test]
fn test_failed_resolution_is_retried() {
    let attempts = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&attempts);
    let loader = move |name: &str| -> Result<Option<Value>> {
        *counter.borrow_mut() += 1;
        if *counter.borrow() == 1 {
            Ok(Some(json!({"$": "nope"})))
        } else {
            Ok(Some(json!(name)))
        }
    };
    let loader: Rc<dyn TemplateLoader> = Rc::new(loader);
    let transformer = Transformer::with_loader(&json!({"$": "include", "name": {"$": "this"}}), loader).unwrap();

    let err = transformer.transform(&json!("flaky")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Template);
    assert_eq!(err.path().map(|p| p.to_string()), Some(r#"flaky#$["$"]"#.to_string()));

    assert_eq!(transformer.transform(&json!("flaky")).unwrap(), json!("flaky"));
    assert_eq!(*attempts.borrow(), 2);
}

#[test]
fn test_loader_errors_propagate() {
    let loader = |_: &str| -> Result<Option<Value>> { transon_core::value::parse("{").map(Some) };
    let loader: Rc<dyn TemplateLoader> = Rc::new(loader);
    let err = Transformer::with_loader(&json!({"$": "include", "name": "x"}), loader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_btreemap_loader() {
    let mut templates = BTreeMap::new();
    templates.insert("greet".to_string(), json!({"$": "format", "pattern": "hi {}"}));
    let transformer =
        Transformer::with_loader(&json!({"$": "include", "name": "greet"}), Rc::new(templates)).unwrap();
    assert_eq!(transformer.transform(&json!("you")).unwrap(), json!("hi you"));
}

#[test]
fn test_named_templates_use_configured_marker() {
    let loader = RecordingLoader::new(json!({"inner": {"@": "attr", "name": "v"}}));
    let options = TransformOptions {
        marker: "@".to_string(),
        ..TransformOptions::default()
    };
    let transformer = Transformer::with_options(
        &json!({"wrapped": {"@": "include", "name": "inner"}}),
        options,
        Some(loader as Rc<dyn TemplateLoader>),
    )
    .unwrap();
    assert_eq!(
        transformer.transform(&json!({"v": true})).unwrap(),
        json!({"wrapped": true})
    );
}

#[test]
fn test_deep_but_finite_recursion_within_limit() {
    let loader = RecordingLoader::new(json!({
        "depth": {
            "$": "if",
            "cond": {"$": "expr", "op": ">", "value": 0},
            "then": {"$": "include", "name": "depth", "value": {"$": "expr", "op": "-", "value": 1}},
            "else": "bottom"
        }
    }));
    let transformer =
        Transformer::with_loader(&json!({"$": "include", "name": "depth"}), loader).unwrap();
    assert_eq!(transformer.transform(&json!(63)).unwrap(), json!("bottom"));

    let err = transformer.transform(&json!(64)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Recursion);
}

fn countdown_loader() -> Rc<dyn TemplateLoader> {
    RecordingLoader::new(json!({
        "down": {
            "$": "if",
            "cond": {"$": "expr", "op": ">", "value": 0},
            "then": {"$": "include", "name": "down", "value": {"$": "expr", "op": "-", "value": 1}},
            "else": "done"
        }
    }))
}

#[test]
fn test_default_depth_fits_a_small_thread_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let transformer =
                Transformer::with_loader(&json!({"$": "include", "name": "down"}), countdown_loader())
                    .unwrap();
            let done = transformer.transform(&json!(63)).unwrap();
            let err = transformer.transform(&json!(200)).unwrap_err();
            (done, err.kind())
        })
        .unwrap();
    let (done, kind) = handle.join().unwrap();
    assert_eq!(done, json!("done"));
    assert_eq!(kind, ErrorKind::Recursion);
}

#[test]
fn test_largest_depth_limit_ends_in_recursion_error() {
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let options = TransformOptions {
                max_depth: MAX_DEPTH_LIMIT,
                ..TransformOptions::default()
            };
            let transformer = Transformer::with_options(
                &json!({"$": "include", "name": "down"}),
                options,
                Some(countdown_loader()),
            )
            .unwrap();
            let done = transformer.transform(&json!(MAX_DEPTH_LIMIT - 1)).unwrap();
            let err = transformer.transform(&json!(MAX_DEPTH_LIMIT * 4)).unwrap_err();
            (done, err.kind())
        })
        .unwrap();
    let (done, kind) = handle.join().unwrap();
    assert_eq!(done, json!("done"));
    assert_eq!(kind, ErrorKind::Recursion);
}

#[test]
fn test_depth_above_limit_rejected_at_construction() {
    let options = TransformOptions {
        max_depth: 1_000_000,
        ..TransformOptions::default()
    };
    let err = Transformer::with_options(&json!(1), options, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_unknown_include_under_default_falls_back() {
    let loader = RecordingLoader::new(json!({}));
    let transformer = Transformer::with_loader(
        &json!({"$": "default", "value": {"$": "include", "name": "missing"}, "fallback": 1}),
        loader.clone(),
    )
    .unwrap();
    assert_eq!(transformer.transform(&json!({})).unwrap(), json!(1));
    assert!(transformer.registry().cached_names().is_empty());
    assert_eq!(loader.calls(), ["missing", "missing"]);
}
