//! Integration tests for engine-wide guarantees

use serde_json::{json, Value};
use transon_core::value::{parse, to_string, to_string_pretty};
use transon_core::{transform, ErrorKind, Transformer, NO_CONTENT};

fn samples() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(-17),
        json!(0.1),
        json!(1e300),
        json!("unicode ✓ \"quoted\"\n"),
        json!([]),
        json!({}),
        json!({"z": [1, {"y": null}], "a": {"$": "not a rule here"}}),
    ]
}

#[test]
fn test_serialize_parse_round_trip() {
    for value in samples() {
        assert_eq!(parse(&to_string(&value)).unwrap(), value);
        assert_eq!(parse(&to_string_pretty(&value)).unwrap(), value);
    }
}

#[test]
fn test_transform_is_idempotent() {
    let template = json!({
        "count": {"$": "chain", "funcs": [{"$": "attr", "name": "items"}, {"$": "map", "item": {"$": "index"}}]},
        "tags": {"$": "join", "items": {"$": "attr", "name": "tags"}, "sep": ","}
    });
    let data = json!({"items": ["x", "y"], "tags": ["a", "b"]});
    let transformer = Transformer::new(&template).unwrap();
    let first = transformer.transform(&data).unwrap();
    let second = transformer.transform(&data).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, json!({"count": [0, 1], "tags": "a,b"}));
}

#[test]
fn test_rule_free_templates_are_identity_on_any_input() {
    for template in samples().into_iter().filter(|v| !v.to_string().contains("\"$\"")) {
        let output = transform(&template, &json!({"any": "input"})).unwrap();
        assert_eq!(output, template);
    }
}

#[test]
fn test_end_to_end_examples() {
    assert_eq!(
        transform(&json!({"$": "attr", "name": "name"}), &json!({"name": "Ada"})).unwrap(),
        json!("Ada")
    );
    assert_eq!(
        transform(
            &json!({"$": "default", "value": {"$": "attr", "name": "missing"}, "fallback": null}),
            &json!({})
        )
        .unwrap(),
        json!(null)
    );
    assert_eq!(
        transform(&json!([{"$": "attr", "name": "a"}, {"$": "omit"}]), &json!({"a": 1})).unwrap(),
        json!([1])
    );
}

#[test]
fn test_no_content_never_serialized() {
    let output = transform(&json!({"$": "omit"}), &json!(1)).unwrap();
    assert_eq!(output, NO_CONTENT);
    assert_eq!(output.into_value(), None);
}

#[test]
fn test_compile_errors_carry_location() {
    let err = Transformer::new(&json!({"list": [1, {"$": "frobnicate"}]})).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Template);
    assert_eq!(err.path().unwrap().to_string(), r#"$.list[1]["$"]"#);
    assert!(err.to_string().contains("unknown rule 'frobnicate'"));
}

#[test]
fn test_syntax_errors_report_position() {
    let err = parse("{\n  \"a\": [1,\n}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.to_string().contains("line 3"), "{}", err);
}
