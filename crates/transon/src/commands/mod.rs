pub mod check;
pub mod rules;
pub mod transform;

use crate::context::Context;
use crate::loader::DirectoryLoader;
use anyhow::{Context as _, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use transon_core::{TemplateLoader, Transformer, Value, value};

/// Read and parse a JSON file, or stdin for `-`
pub(crate) fn read_document(path: Option<&Path>, what: &str) -> Result<Value> {
    let (text, source) = match path {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {} {}", what, path.display()))?;
            (text, path.display().to_string())
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .with_context(|| format!("failed to read {} from stdin", what))?;
            (text, "from stdin".to_string())
        }
    };
    value::parse(&text).with_context(|| format!("invalid {} {}", what, source))
}

/// Compile the template file against the context's options
pub(crate) fn build_transformer(
    ctx: &Context,
    template: &Path,
    templates: Option<PathBuf>,
) -> Result<Transformer> {
    let source = read_document(Some(template), "template")?;
    let loader = templates.map(|dir| Rc::new(DirectoryLoader::new(dir)) as Rc<dyn TemplateLoader>);
    Ok(Transformer::with_options(
        &source,
        ctx.options.clone(),
        loader,
    )?)
}
