//! `include` evaluation through the registry

use super::helpers::{assert_kind, loader};
use crate::config::TransformOptions;
use crate::error::{ErrorKind, TransformError};
use crate::output::NO_CONTENT;
use crate::transformer::Transformer;
use serde_json::json;

#[test]
fn test_include_uses_current_value_by_default() {
    let templates = loader(json!({"name": {"$": "attr", "name": "name"}}));
    let transformer = Transformer::with_loader(
        &json!({"$": "map", "item": {"$": "include", "name": "name"}}),
        templates,
    )
    .unwrap();
    assert_eq!(
        transformer.transform(&json!([{"name": "a"}, {"name": "b"}])).unwrap(),
        json!(["a", "b"])
    );
}

#[test]
fn test_include_with_explicit_value_and_dynamic_name() {
    let templates = loader(json!({
        "upper": {"$": "format", "pattern": "<{}>"},
        "lower": {"$": "format", "pattern": "({})"}
    }));
    let template = json!({
        "$": "include",
        "name": {"$": "attr", "name": "style"},
        "value": {"$": "attr", "name": "text"}
    });
    let transformer = Transformer::with_loader(&template, templates).unwrap();
    assert!(transformer.registry().cached_names().is_empty());
    assert_eq!(
        transformer.transform(&json!({"style": "lower", "text": "hi"})).unwrap(),
        json!("(hi)")
    );
    assert_eq!(transformer.registry().cached_names(), ["lower"]);
}

#[test]
fn test_included_template_starts_fresh() {
    let templates = loader(json!({"probe": {"$": "get", "name": "secret"}}));
    let template = json!({
        "$": "chain",
        "funcs": [
            {"$": "set", "name": "secret", "value": 1},
            [{"$": "get", "name": "secret"}, {"$": "include", "name": "probe"}]
        ]
    });
    let transformer = Transformer::with_loader(&template, templates).unwrap();
    assert_eq!(transformer.transform(&json!({})).unwrap(), json!([1]));
}

#[test]
fn test_include_of_no_content_skips_template() {
    let templates = loader(json!({"fail": {"$": "attr", "name": "missing"}}));
    let template = json!({"$": "include", "name": "fail", "value": {"$": "omit"}});
    let transformer = Transformer::with_loader(&template, templates).unwrap();
    assert_eq!(transformer.transform(&json!({})).unwrap(), NO_CONTENT);
}

#[test]
fn test_data_guarded_recursion() {
    let templates = loader(json!({
        "tree": {
            "name": {"$": "attr", "name": "name"},
            "children": {
                "$": "if",
                "cond": {"$": "expr", "op": "in", "values": ["children", {"$": "this"}]},
                "then": {
                    "$": "chain",
                    "funcs": [
                        {"$": "attr", "name": "children"},
                        {"$": "map", "item": {"$": "include", "name": "tree"}}
                    ]
                }
            }
        }
    }));
    let transformer =
        Transformer::with_loader(&json!({"$": "include", "name": "tree"}), templates).unwrap();
    let data = json!({
        "name": "root",
        "extra": 1,
        "children": [{"name": "leaf"}, {"name": "inner", "children": [{"name": "deep"}]}]
    });
    assert_eq!(
        transformer.transform(&data).unwrap(),
        json!({
            "name": "root",
            "children": [
                {"name": "leaf"},
                {"name": "inner", "children": [{"name": "deep"}]}
            ]
        })
    );
}

#[test]
fn test_recursion_limit() {
    let templates = loader(json!({
        "loop": {"$": "if", "cond": true, "then": {"$": "include", "name": "loop"}}
    }));
    let options = TransformOptions {
        max_depth: 8,
        ..TransformOptions::default()
    };
    let transformer = Transformer::with_options(
        &json!({"$": "include", "name": "loop"}),
        options,
        Some(templates),
    )
    .unwrap();
    match transformer.transform(&json!({})) {
        Err(TransformError::Recursion { limit, path }) => {
            assert_eq!(limit, 8);
            assert_eq!(path.to_string(), "loop#$.then");
        }
        other => panic!("Expected Recursion error, got {:?}", other),
    }
}

#[test]
fn test_missing_template_at_evaluation() {
    let templates = loader(json!({}));
    let template = json!({"$": "include", "name": {"$": "this"}});
    let transformer = Transformer::with_loader(&template, templates).unwrap();
    let err = transformer.transform(&json!("ghost")).unwrap_err();
    assert_eq!(assert_kind(&err, ErrorKind::Lookup), "$");
    assert!(err.to_string().contains("'ghost'"));
}

#[test]
fn test_include_without_loader() {
    let transformer =
        Transformer::new(&json!({"$": "include", "name": {"$": "this"}})).unwrap();
    let err = transformer.transform(&json!("x")).unwrap_err();
    assert_kind(&err, ErrorKind::Lookup);
}

#[test]
fn test_include_name_must_be_string() {
    let transformer = Transformer::new(&json!({"$": "include", "name": {"$": "this"}})).unwrap();
    let err = transformer.transform(&json!(1)).unwrap_err();
    assert_kind(&err, ErrorKind::Type);
}
