//! Template compiler
//!
//! A template is any JSON document. Maps carrying the marker key (`"$"` by
//! default) are rules; everything else is echoed structurally, with rules
//! recognized at any depth inside literal lists and maps.
//!
//! ```json
//! {"names": {"$": "map", "item": {"$": "attr", "name": "name"}}}
//! ```
//!
//! Compilation validates every rule up front and produces an immutable
//! [`Template`]. It never looks at input data and never resolves named
//! templates; both happen at evaluation time.

mod compile;
pub mod path;
pub mod pattern;
pub mod rule;

use serde_json::Value;

use crate::error::Result;

pub use path::{Segment, TemplatePath};
pub use pattern::Pattern;
pub use rule::{AttrTarget, Converter, MapBody, Operands, Operator, Rule, RuleKind, RuleOp};

/// Node of a compiled template
#[derive(Debug, Clone)]
pub enum Node {
    /// Subtree without rules, echoed verbatim
    Literal(Value),
    /// Literal list with rules among its elements
    List(Vec<Node>),
    /// Literal map with rules among its values
    Map(Vec<(String, Node)>),
    Rule(Box<Rule>),
}

impl Node {
    /// String value of a literal node
    pub fn as_literal_str(&self) -> Option<&str> {
        match self {
            Node::Literal(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// Compiled, immutable template
#[derive(Debug, Clone)]
pub struct Template {
    name: Option<String>,
    root: Node,
}

impl Template {
    /// Compile the template passed to a transformer
    pub fn compile(source: &Value, marker: &str) -> Result<Self> {
        let root = compile::Compiler::new(marker).compile(source, &TemplatePath::root())?;
        Ok(Self { name: None, root })
    }

    /// Compile a template resolved by name through a loader
    pub fn compile_named(name: &str, source: &Value, marker: &str) -> Result<Self> {
        let root = compile::Compiler::new(marker).compile(source, &TemplatePath::named(name))?;
        Ok(Self {
            name: Some(name.to_string()),
            root,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}
