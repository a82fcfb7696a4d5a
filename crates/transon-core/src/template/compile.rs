//! Translation of template documents into node trees

use serde_json::{Map, Value};

use super::rule::{AttrTarget, Converter, MapBody, Operands, Operator, Rule, RuleKind, RuleOp};
use super::{Node, Pattern, TemplatePath};
use crate::error::{Result, TransformError};
use crate::value::type_name;

pub(super) struct Compiler<'m> {
    marker: &'m str,
}

impl<'m> Compiler<'m> {
    pub(super) fn new(marker: &'m str) -> Self {
        Self { marker }
    }

    pub(super) fn compile(&self, source: &Value, path: &TemplatePath) -> Result<Node> {
        match source {
            Value::Object(map) if map.contains_key(self.marker) => self.compile_rule(map, path),
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map {
                    entries.push((key.clone(), self.compile(value, &path.key(key))?));
                }
                if entries.iter().all(|(_, node)| matches!(node, Node::Literal(_))) {
                    Ok(Node::Literal(source.clone()))
                } else {
                    Ok(Node::Map(entries))
                }
            }
            Value::Array(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    nodes.push(self.compile(item, &path.index(index))?);
                }
                if nodes.iter().all(|node| matches!(node, Node::Literal(_))) {
                    Ok(Node::Literal(source.clone()))
                } else {
                    Ok(Node::List(nodes))
                }
            }
            scalar => Ok(Node::Literal(scalar.clone())),
        }
    }

    fn compile_rule(&self, map: &Map<String, Value>, path: &TemplatePath) -> Result<Node> {
        let name = match &map[self.marker] {
            Value::String(name) => name,
            other => {
                return Err(TransformError::template(
                    &path.key(self.marker),
                    None,
                    format!("rule name must be a string, got {}", type_name(other)),
                ));
            }
        };
        let kind = RuleKind::from_name(name).ok_or_else(|| {
            TransformError::template(
                &path.key(self.marker),
                None,
                format!("unknown rule '{}'", name),
            )
        })?;

        for key in map.keys().filter(|key| key.as_str() != self.marker) {
            if !kind.params().contains(&key.as_str()) {
                return Err(TransformError::template(
                    &path.key(key),
                    Some(kind),
                    format!("unknown parameter '{}'", key),
                ));
            }
        }

        let params = Params {
            compiler: self,
            map,
            path,
            kind,
        };
        let op = params.build()?;
        Ok(Node::Rule(Box::new(Rule {
            path: path.clone(),
            op,
        })))
    }
}

/// Parameters of one rule being compiled
struct Params<'a, 'm> {
    compiler: &'a Compiler<'m>,
    map: &'a Map<String, Value>,
    path: &'a TemplatePath,
    kind: RuleKind,
}

impl Params<'_, '_> {
    fn error(&self, path: &TemplatePath, message: impl Into<String>) -> TransformError {
        TransformError::template(path, Some(self.kind), message)
    }

    fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    fn optional(&self, name: &str) -> Result<Option<Node>> {
        self.map
            .get(name)
            .map(|value| self.compiler.compile(value, &self.path.key(name)))
            .transpose()
    }

    fn required(&self, name: &str) -> Result<Node> {
        self.optional(name)?
            .ok_or_else(|| self.error(self.path, format!("missing required parameter '{}'", name)))
    }

    fn literal_str(&self, name: &str) -> Result<&str> {
        match self.map.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(self.error(
                &self.path.key(name),
                format!(
                    "parameter '{}' must be a literal string, got {}",
                    name,
                    type_name(other)
                ),
            )),
            None => Err(self.error(
                self.path,
                format!("missing required parameter '{}'", name),
            )),
        }
    }

    fn exclusive(&self, names: &[&str]) -> Result<()> {
        let present: Vec<&str> = names.iter().copied().filter(|n| self.has(n)).collect();
        if present.len() > 1 {
            return Err(self.error(
                self.path,
                format!(
                    "parameters {} are mutually exclusive",
                    present
                        .iter()
                        .map(|n| format!("'{}'", n))
                        .collect::<Vec<_>>()
                        .join(" and ")
                ),
            ));
        }
        Ok(())
    }

    fn operands(&self) -> Result<Operands> {
        self.exclusive(&["value", "values"])?;
        if let Some(value) = self.optional("value")? {
            Ok(Operands::Value(value))
        } else if let Some(values) = self.optional("values")? {
            Ok(Operands::Values(values))
        } else {
            Ok(Operands::Current)
        }
    }

    fn build(&self) -> Result<RuleOp> {
        let op = match self.kind {
            RuleKind::This => RuleOp::This,
            RuleKind::Parent => RuleOp::Parent,
            RuleKind::Item => RuleOp::Item,
            RuleKind::Index => RuleOp::Index,
            RuleKind::Key => RuleOp::Key,
            RuleKind::Value => RuleOp::Value,
            RuleKind::Omit => RuleOp::Omit,
            RuleKind::Set => RuleOp::Set {
                name: self.required("name")?,
                value: self.optional("value")?,
            },
            RuleKind::Get => RuleOp::Get {
                name: self.required("name")?,
            },
            RuleKind::Attr => self.build_attr()?,
            RuleKind::Object => RuleOp::Object {
                key: self.required("key")?,
                value: self.required("value")?,
            },
            RuleKind::Map => self.build_map()?,
            RuleKind::Zip => RuleOp::Zip {
                items: self.required("items")?,
            },
            RuleKind::Join => RuleOp::Join {
                items: self.required("items")?,
                sep: self.optional("sep")?,
            },
            RuleKind::Chain => self.build_chain()?,
            RuleKind::Expr => self.build_expr()?,
            RuleKind::Convert => {
                let name = self.literal_str("name")?;
                let converter = Converter::parse(name).ok_or_else(|| {
                    self.error(&self.path.key("name"), format!("unknown converter '{}'", name))
                })?;
                RuleOp::Convert {
                    converter,
                    operands: self.operands()?,
                }
            }
            RuleKind::Format => {
                let source = self.literal_str("pattern")?;
                let pattern = Pattern::parse(source)
                    .map_err(|message| self.error(&self.path.key("pattern"), message))?;
                RuleOp::Format {
                    pattern,
                    value: self.optional("value")?,
                }
            }
            RuleKind::Default => RuleOp::Default {
                value: self.required("value")?,
                fallback: self.required("fallback")?,
            },
            RuleKind::If => RuleOp::If {
                cond: self.required("cond")?,
                then: self.required("then")?,
                otherwise: self.optional("else")?,
            },
            RuleKind::Include => RuleOp::Include {
                name: self.required("name")?,
                value: self.optional("value")?,
            },
            RuleKind::Literal => RuleOp::Literal(self.map.get("value").cloned().ok_or_else(
                || self.error(self.path, "missing required parameter 'value'"),
            )?),
        };
        Ok(op)
    }

    fn build_attr(&self) -> Result<RuleOp> {
        self.exclusive(&["name", "names"])?;
        let target = if let Some(name) = self.optional("name")? {
            AttrTarget::Name(name)
        } else if let Some(names) = self.optional("names")? {
            AttrTarget::Names(names)
        } else {
            return Err(self.error(self.path, "one of 'name' or 'names' is required"));
        };
        Ok(RuleOp::Attr {
            target,
            default: self.optional("default")?,
        })
    }

    fn build_map(&self) -> Result<RuleOp> {
        let modes = [self.has("item"), self.has("items"), self.has("key") || self.has("value")];
        if modes.iter().filter(|m| **m).count() != 1 {
            return Err(self.error(
                self.path,
                "exactly one of 'item', 'items' or 'key' with 'value' is required",
            ));
        }

        let body = if let Some(item) = self.optional("item")? {
            MapBody::Item(item)
        } else if let Some(items) = self.optional("items")? {
            MapBody::Items(items)
        } else {
            MapBody::Entries {
                key: self.required("key")?,
                value: self.required("value")?,
            }
        };
        Ok(RuleOp::Map(body))
    }

    fn build_chain(&self) -> Result<RuleOp> {
        let path = self.path.key("funcs");
        match self.map.get("funcs") {
            Some(Value::Array(funcs)) => {
                let mut nodes = Vec::with_capacity(funcs.len());
                for (index, func) in funcs.iter().enumerate() {
                    nodes.push(self.compiler.compile(func, &path.index(index))?);
                }
                Ok(RuleOp::Chain { funcs: nodes })
            }
            Some(other) => Err(self.error(
                &path,
                format!("parameter 'funcs' must be a list, got {}", type_name(other)),
            )),
            None => Err(self.error(self.path, "missing required parameter 'funcs'")),
        }
    }

    fn build_expr(&self) -> Result<RuleOp> {
        let symbol = self.literal_str("op")?;
        let op = Operator::parse(symbol).ok_or_else(|| {
            self.error(&self.path.key("op"), format!("unknown operator '{}'", symbol))
        })?;
        let operands = self.operands()?;
        match &operands {
            Operands::Current if !op.is_unary() => {
                return Err(self.error(
                    self.path,
                    format!("operator '{}' needs 'value' or 'values'", op),
                ));
            }
            Operands::Value(_) if !op.is_binary() => {
                return Err(self.error(
                    &self.path.key("value"),
                    format!("operator '{}' takes a single operand", op),
                ));
            }
            _ => {}
        }
        Ok(RuleOp::Expr { op, operands })
    }
}
