//! Transformation results and the "no content" identity

use serde_json::Value;

/// Marker for "produce no output here"
///
/// `NoContent` is not a [`Value`]: no document can contain it and template
/// authors cannot write it. Compare results against [`NO_CONTENT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoContent;

/// The one "no content" identity
pub const NO_CONTENT: NoContent = NoContent;

/// Result of evaluating a template
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Value(Value),
    NoContent,
}

impl Output {
    pub fn is_no_content(&self) -> bool {
        matches!(self, Output::NoContent)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Output::Value(value) => Some(value),
            Output::NoContent => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Output::Value(value) => Some(value),
            Output::NoContent => None,
        }
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::Value(value)
    }
}

impl From<NoContent> for Output {
    fn from(_: NoContent) -> Self {
        Output::NoContent
    }
}

impl PartialEq<NoContent> for Output {
    fn eq(&self, _: &NoContent) -> bool {
        self.is_no_content()
    }
}

impl PartialEq<Output> for NoContent {
    fn eq(&self, other: &Output) -> bool {
        other.is_no_content()
    }
}

impl PartialEq<Value> for Output {
    fn eq(&self, other: &Value) -> bool {
        self.value() == Some(other)
    }
}
