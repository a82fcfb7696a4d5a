//! Named template resolution
//!
//! `include` refers to other templates by name. A [`TemplateLoader`] supplies
//! the source documents and the [`Registry`] compiles each name at most once
//! per transformer.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TransformError};
use crate::evaluator::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};
use crate::template::{AttrTarget, Node, Operands, Rule, RuleKind, RuleOp, Template, TemplatePath};

/// Source of named template documents
pub trait TemplateLoader {
    /// Return the template document registered under `name`, `None` if there is none
    fn load(&self, name: &str) -> Result<Option<Value>>;
}

impl TemplateLoader for HashMap<String, Value> {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.get(name).cloned())
    }
}

impl TemplateLoader for BTreeMap<String, Value> {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.get(name).cloned())
    }
}

impl<F> TemplateLoader for F
where
    F: Fn(&str) -> Result<Option<Value>>,
{
    fn load(&self, name: &str) -> Result<Option<Value>> {
        self(name)
    }
}

enum Entry {
    InProgress,
    Ready(Rc<Template>),
}

/// Cache of compiled named templates
pub struct Registry {
    loader: Option<Rc<dyn TemplateLoader>>,
    marker: String,
    entries: RefCell<HashMap<String, Entry>>,
    /// Names currently being resolved, outermost first
    stack: RefCell<Vec<String>>,
}

impl Registry {
    pub fn new(loader: Option<Rc<dyn TemplateLoader>>, marker: impl Into<String>) -> Self {
        Self {
            loader,
            marker: marker.into(),
            entries: RefCell::new(HashMap::new()),
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Compiled template for `name`, loading and linking it on first use
    ///
    /// `at` is the location of the `include` asking for it and is reported
    /// in errors.
    pub fn resolve(&self, name: &str, at: &TemplatePath) -> Result<Rc<Template>> {
        match self.entries.borrow().get(name) {
            Some(Entry::Ready(template)) => {
                debug!(template = name, "template cache hit");
                return Ok(Rc::clone(template));
            }
            Some(Entry::InProgress) => {
                return Err(TransformError::CyclicReference {
                    path: at.clone(),
                    chain: self.cycle(name),
                });
            }
            None => {}
        }

        let loader = self.loader.as_ref().ok_or_else(|| TransformError::Lookup {
            path: at.clone(),
            rule: Some(RuleKind::Include),
            message: format!("no template loader configured to resolve '{}'", name),
        })?;

        self.entries
            .borrow_mut()
            .insert(name.to_string(), Entry::InProgress);
        self.stack.borrow_mut().push(name.to_string());
        let result = self.load(loader.as_ref(), name, at);
        self.stack.borrow_mut().pop();

        match result {
            Ok(template) => {
                self.entries
                    .borrow_mut()
                    .insert(name.to_string(), Entry::Ready(Rc::clone(&template)));
                Ok(template)
            }
            Err(err) => {
                self.entries.borrow_mut().remove(name);
                Err(err)
            }
        }
    }

    fn load(&self, loader: &dyn TemplateLoader, name: &str, at: &TemplatePath) -> Result<Rc<Template>> {
        debug!(template = name, "loading template");
        let source = loader
            .load(name)?
            .ok_or_else(|| TransformError::unknown_template(at, name))?;
        let template = Template::compile_named(name, &source, &self.marker)?;
        self.link(&template)?;
        Ok(Rc::new(template))
    }

    fn cycle(&self, name: &str) -> Vec<String> {
        let stack = self.stack.borrow();
        let start = stack.iter().position(|n| n == name).unwrap_or(0);
        let mut chain: Vec<String> = stack[start..].to_vec();
        chain.push(name.to_string());
        chain
    }

    /// Resolve every statically named `include` the template always evaluates
    ///
    /// Branches of `if`, `default` fallbacks, `attr` defaults and `map` bodies
    /// only run depending on data; includes there resolve when reached. Under
    /// a `default` value only cycles and malformed templates fail linking.
    pub fn link(&self, template: &Template) -> Result<()> {
        self.link_node(template.root())
    }

    fn link_node(&self, node: &Node) -> Result<()> {
        match node {
            Node::Literal(_) => Ok(()),
            Node::List(nodes) => nodes.iter().try_for_each(|node| self.link_node(node)),
            Node::Map(entries) => entries.iter().try_for_each(|(_, node)| self.link_node(node)),
            Node::Rule(rule) => {
                stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || self.link_rule(rule))
            }
        }
    }

    fn link_rule(&self, rule: &Rule) -> Result<()> {
        match &rule.op {
            RuleOp::Include { name, value } => {
                self.link_node(name)?;
                self.link_optional(value.as_ref())?;
                if let Some(name) = name.as_literal_str() {
                    self.resolve(name, &rule.path)?;
                }
                Ok(())
            }
            RuleOp::Set { name, value } => {
                self.link_node(name)?;
                self.link_optional(value.as_ref())
            }
            RuleOp::Get { name } => self.link_node(name),
            RuleOp::Attr { target, .. } => match target {
                AttrTarget::Name(node) | AttrTarget::Names(node) => self.link_node(node),
            },
            RuleOp::Object { key, value } => {
                self.link_node(key)?;
                self.link_node(value)
            }
            RuleOp::Zip { items } => self.link_node(items),
            RuleOp::Join { items, sep } => {
                self.link_node(items)?;
                self.link_optional(sep.as_ref())
            }
            RuleOp::Chain { funcs } => funcs.iter().try_for_each(|node| self.link_node(node)),
            RuleOp::Expr { operands, .. } | RuleOp::Convert { operands, .. } => match operands {
                Operands::Value(node) | Operands::Values(node) => self.link_node(node),
                Operands::Current => Ok(()),
            },
            RuleOp::Format { value, .. } => self.link_optional(value.as_ref()),
            // `default` absorbs lookup failures of its value when evaluated
            RuleOp::Default { value, .. } => match self.link_node(value) {
                Err(TransformError::Lookup { path, message, .. }) => {
                    debug!(%path, %message, "unresolved include under 'default' left to evaluation");
                    Ok(())
                }
                other => other,
            },
            RuleOp::If { cond, .. } => self.link_node(cond),
            RuleOp::Map(_)
            | RuleOp::This
            | RuleOp::Parent
            | RuleOp::Item
            | RuleOp::Index
            | RuleOp::Key
            | RuleOp::Value
            | RuleOp::Omit
            | RuleOp::Literal(_) => Ok(()),
        }
    }

    fn link_optional(&self, node: Option<&Node>) -> Result<()> {
        node.map_or(Ok(()), |node| self.link_node(node))
    }

    /// Whether `name` has been resolved and cached
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.entries.borrow().get(name), Some(Entry::Ready(_)))
    }

    /// Names of all cached templates, sorted
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Ready(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
