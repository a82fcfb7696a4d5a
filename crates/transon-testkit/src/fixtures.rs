//! Documentation catalog of worked examples
//!
//! Every case pairs a template with input data and the expected output. The
//! catalog is embedded from `fixtures/doc_cases.json` and shared by the core
//! integration tests and the CLI tests.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::Value;

/// One worked example
#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    pub name: String,
    /// Rule the example documents
    pub rule: String,
    pub doc: String,
    pub template: Value,
    pub data: Value,
    /// Expected output, absent when the template produces no content
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub no_content: bool,
}

impl Case {
    /// Expected output, `None` for "no content"
    pub fn expected(&self) -> Option<&Value> {
        if self.no_content {
            None
        } else {
            Some(self.result.as_ref().unwrap_or(&Value::Null))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Catalog {
    templates: HashMap<String, Value>,
    cases: Vec<Case>,
}

const CATALOG_JSON: &str = include_str!("../fixtures/doc_cases.json");

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| serde_json::from_str(CATALOG_JSON).expect("Invalid doc_cases.json"))
}

/// All worked examples, in catalog order
pub fn doc_cases() -> &'static [Case] {
    &catalog().cases
}

/// Worked example by name
///
/// # Panics
///
/// Panics if no case has that name.
pub fn doc_case(name: &str) -> &'static Case {
    doc_cases()
        .iter()
        .find(|case| case.name == name)
        .unwrap_or_else(|| panic!("No doc case named '{}'", name))
}

/// Named templates the examples include
pub fn catalog_templates() -> HashMap<String, Value> {
    catalog().templates.clone()
}
