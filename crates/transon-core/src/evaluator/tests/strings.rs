//! `format` rule evaluation

use super::helpers::{assert_kind, run, run_err, run_value};
use crate::error::ErrorKind;
use crate::output::NO_CONTENT;
use serde_json::json;

#[test]
fn test_format_named_fields_from_current_map() {
    let template = json!({"$": "format", "pattern": "{first} {last}"});
    assert_eq!(
        run_value(template, json!({"first": "Ada", "last": "Lovelace"})),
        json!("Ada Lovelace")
    );
}

#[test]
fn test_format_with_value_list() {
    let template = json!({
        "$": "format",
        "pattern": "{}: {:.1f}%",
        "value": [{"$": "attr", "name": "label"}, {"$": "attr", "name": "ratio"}]
    });
    assert_eq!(
        run_value(template, json!({"label": "done", "ratio": 42.26})),
        json!("done: 42.3%")
    );
}

#[test]
fn test_format_single_value() {
    let template = json!({"$": "map", "item": {"$": "format", "pattern": "#{:03d}"}});
    assert_eq!(run_value(template, json!([7, 42])), json!(["#007", "#042"]));
}

#[test]
fn test_format_missing_field_is_lookup_error() {
    let err = run_err(json!({"$": "format", "pattern": "{name}"}), json!({}));
    assert_eq!(assert_kind(&err, ErrorKind::Lookup), "$");
    assert!(err.to_string().contains("rule 'format'"));
}

#[test]
fn test_format_type_mismatch() {
    let err = run_err(json!({"$": "format", "pattern": "{:d}"}), json!("x"));
    assert_kind(&err, ErrorKind::Type);
}

#[test]
fn test_format_of_no_content() {
    let template = json!({"$": "format", "pattern": "{}", "value": {"$": "get", "name": "unset"}});
    assert_eq!(run(template, json!({})), NO_CONTENT);
}

#[test]
fn test_format_missing_field_absorbed_by_default() {
    let template = json!({
        "$": "default",
        "value": {"$": "format", "pattern": "{nick}"},
        "fallback": {"$": "format", "pattern": "{name}"}
    });
    assert_eq!(run_value(template, json!({"name": "Ada"})), json!("Ada"));
}
