//! Public entry point: compile once, transform many documents

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::config::TransformOptions;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::output::{NoContent, Output, NO_CONTENT};
use crate::registry::{Registry, TemplateLoader};
use crate::template::Template;

/// Compiled template bound to a loader and options
///
/// Construction compiles the template and links every named template it
/// always includes, so unknown names and unconditional include cycles fail
/// here rather than during [`Transformer::transform`].
///
/// A transformer caches named templates with interior mutability and is
/// meant to be used from one thread at a time.
pub struct Transformer {
    template: Template,
    registry: Registry,
    options: TransformOptions,
}

impl Transformer {
    /// The "no content" identity, for comparing results
    pub const NO_CONTENT: NoContent = NO_CONTENT;

    /// Transformer with default options and no loader
    pub fn new(template: &Value) -> Result<Self> {
        Self::with_options(template, TransformOptions::default(), None)
    }

    /// Transformer resolving `include` names through `loader`
    pub fn with_loader(template: &Value, loader: Rc<dyn TemplateLoader>) -> Result<Self> {
        Self::with_options(template, TransformOptions::default(), Some(loader))
    }

    pub fn with_options(
        template: &Value,
        options: TransformOptions,
        loader: Option<Rc<dyn TemplateLoader>>,
    ) -> Result<Self> {
        options.validate()?;
        let template = Template::compile(template, &options.marker)?;
        let registry = Registry::new(loader, options.marker.clone());
        registry.link(&template)?;

        debug!(
            marker = %options.marker,
            max_depth = options.max_depth,
            linked = registry.cached_names().len(),
            "transformer ready"
        );
        Ok(Self {
            template,
            registry,
            options,
        })
    }

    /// Apply the template to one document
    ///
    /// The result is either a value or [`Output::NoContent`] when the whole
    /// template produced nothing. Repeated calls with equal data give equal
    /// results.
    pub fn transform(&self, data: &Value) -> Result<Output> {
        debug!("transforming document");
        Evaluator::new(&self.registry, self.options.max_depth)
            .run(&self.template, Output::Value(data.clone()))
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Named templates resolved so far
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("template", &self.template)
            .field("options", &self.options)
            .field("linked", &self.registry.cached_names())
            .finish()
    }
}

/// One-shot transformation with default options and no loader
pub fn transform(template: &Value, data: &Value) -> Result<Output> {
    Transformer::new(template)?.transform(data)
}
