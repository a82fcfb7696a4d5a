//! Named templates stored as files in a directory

use log::{debug, warn};
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use transon_core::{RuleKind, TemplateLoader, TemplatePath, TransformError, Value, value};

/// Loads `<root>/<name>.json` for each requested name
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn is_plain_name(name: &str) -> bool {
        !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
    }
}

impl TemplateLoader for DirectoryLoader {
    fn load(&self, name: &str) -> transon_core::Result<Option<Value>> {
        // Names never reach outside the directory; such a name is simply unknown.
        if !Self::is_plain_name(name) {
            warn!("refusing template name {:?}", name);
            return Ok(None);
        }

        let path = self.root.join(format!("{name}.json"));
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("no template file {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(TransformError::Lookup {
                    path: TemplatePath::named(name),
                    rule: Some(RuleKind::Include),
                    message: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        debug!("loaded template {} from {}", name, path.display());
        value::parse(&text).map(Some)
    }
}
