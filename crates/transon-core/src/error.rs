use crate::template::{RuleKind, TemplatePath};
use std::fmt;
use thiserror::Error;

/// Error taxonomy of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Template,
    Lookup,
    Type,
    CyclicReference,
    Recursion,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Template => "TemplateError",
            ErrorKind::Lookup => "LookupError",
            ErrorKind::Type => "TypeError",
            ErrorKind::CyclicReference => "CyclicReferenceError",
            ErrorKind::Recursion => "RecursionError",
            ErrorKind::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    // Document errors
    #[error("SYNTAX_ERROR: {message} at line {line}, column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    // Compile-time errors
    #[error("TEMPLATE_ERROR: {message} ({})", Location(.path, .rule))]
    Template {
        path: TemplatePath,
        rule: Option<RuleKind>,
        message: String,
    },

    // Evaluation errors
    #[error("LOOKUP_ERROR: {message} ({})", Location(.path, .rule))]
    Lookup {
        path: TemplatePath,
        rule: Option<RuleKind>,
        message: String,
    },

    #[error("TYPE_ERROR: {message} ({})", Location(.path, .rule))]
    Type {
        path: TemplatePath,
        rule: Option<RuleKind>,
        message: String,
    },

    // Registry errors
    #[error("CYCLIC_REFERENCE: templates include each other unconditionally: {} (at {path})", .chain.join(" -> "))]
    CyclicReference {
        path: TemplatePath,
        chain: Vec<String>,
    },

    #[error("RECURSION_LIMIT: template nesting exceeded {limit} levels (at {path})")]
    Recursion { path: TemplatePath, limit: usize },

    // Options errors
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
}

struct Location<'a>(&'a TemplatePath, &'a Option<RuleKind>);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(rule) => write!(f, "rule '{}' at {}", rule, self.0),
            None => write!(f, "at {}", self.0),
        }
    }
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Syntax { .. } => ErrorKind::Syntax,
            TransformError::Template { .. } => ErrorKind::Template,
            TransformError::Lookup { .. } => ErrorKind::Lookup,
            TransformError::Type { .. } => ErrorKind::Type,
            TransformError::CyclicReference { .. } => ErrorKind::CyclicReference,
            TransformError::Recursion { .. } => ErrorKind::Recursion,
            TransformError::Config(_) => ErrorKind::Config,
        }
    }

    /// Template location the error was raised at, if it has one
    pub fn path(&self) -> Option<&TemplatePath> {
        match self {
            TransformError::Template { path, .. }
            | TransformError::Lookup { path, .. }
            | TransformError::Type { path, .. }
            | TransformError::CyclicReference { path, .. }
            | TransformError::Recursion { path, .. } => Some(path),
            TransformError::Syntax { .. } | TransformError::Config(_) => None,
        }
    }

    /// Rule that raised the error, if any
    pub fn rule(&self) -> Option<RuleKind> {
        match self {
            TransformError::Template { rule, .. }
            | TransformError::Lookup { rule, .. }
            | TransformError::Type { rule, .. } => *rule,
            _ => None,
        }
    }

    pub(crate) fn template(
        path: &TemplatePath,
        rule: Option<RuleKind>,
        message: impl Into<String>,
    ) -> Self {
        TransformError::Template {
            path: path.clone(),
            rule,
            message: message.into(),
        }
    }

    pub(crate) fn unknown_template(path: &TemplatePath, name: &str) -> Self {
        TransformError::Lookup {
            path: path.clone(),
            rule: Some(RuleKind::Include),
            message: format!("no template registered under name '{}'", name),
        }
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json appends the position to its message; keep it only once
        let text = err.to_string();
        let message = match text.rsplit_once(" at line ") {
            Some((message, _)) if err.line() > 0 => message.to_string(),
            _ => text,
        };
        TransformError::Syntax {
            message,
            line: err.line(),
            column: err.column(),
        }
    }
}

impl From<toml::de::Error> for TransformError {
    fn from(err: toml::de::Error) -> Self {
        TransformError::Config(err.message().to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
