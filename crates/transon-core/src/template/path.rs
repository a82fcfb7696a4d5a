//! Locations inside a template document

use std::fmt;

/// One step from a container to a child
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Map key
    Key(String),
    /// List index
    Index(usize),
}

/// Path from the root of a template document to one of its nodes
///
/// Rendered as `$.items[2].value`. Paths inside named templates carry the
/// template name: `row#$.cells[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TemplatePath {
    template: Option<String>,
    segments: Vec<Segment>,
}

impl TemplatePath {
    /// Root of the template passed to the transformer
    pub fn root() -> Self {
        Self::default()
    }

    /// Root of a named template resolved through the loader
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            template: Some(name.into()),
            segments: Vec::new(),
        }
    }

    /// Path of a map value below this one
    pub fn key(&self, key: &str) -> Self {
        self.with(Segment::Key(key.to_string()))
    }

    /// Path of a list element below this one
    pub fn index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self {
            template: self.template.clone(),
            segments,
        }
    }

    /// Name of the template this path points into (`None` for the root template)
    pub fn template_name(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.template {
            write!(f, "{}#", name)?;
        }
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) if is_plain_key(key) => write!(f, ".{}", key)?,
                Segment::Key(key) => write!(f, "[{:?}]", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
