//! Template evaluator
//!
//! Walks a compiled [`Template`] against input data. Evaluation order is
//! strictly left to right, top to bottom as written in the template, so
//! loader calls triggered by `include` happen in document order.

mod convert;
mod format;
mod ops;
mod scope;

#[cfg(test)]
mod tests;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Result, TransformError};
use crate::output::Output;
use crate::registry::Registry;
use crate::template::{AttrTarget, MapBody, Node, Operands, Operator, Rule, RuleOp, Template};
use crate::value::type_name;

use scope::{Iteration, Scope};

/// Remaining stack below which a rule runs on a freshly allocated segment
pub(crate) const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each additional stack segment
pub(crate) const STACK_SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Failure raised by a rule before it is tied to a template location
#[derive(Debug)]
pub(crate) enum Fault {
    Lookup(String),
    Type(String),
}

pub(crate) type Step<T> = std::result::Result<T, Fault>;

impl Fault {
    fn at(self, rule: &Rule) -> TransformError {
        let path = rule.path.clone();
        let rule = Some(rule.kind());
        match self {
            Fault::Lookup(message) => TransformError::Lookup {
                path,
                rule,
                message,
            },
            Fault::Type(message) => TransformError::Type {
                path,
                rule,
                message,
            },
        }
    }
}

fn describe(output: &Output) -> &'static str {
    match output {
        Output::Value(value) => type_name(value),
        Output::NoContent => "no content",
    }
}

/// Evaluation of one template at one include depth
pub(crate) struct Evaluator<'r> {
    registry: &'r Registry,
    max_depth: usize,
    depth: usize,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
            depth: 0,
        }
    }

    /// Evaluate a template in a fresh root context
    pub fn run(&self, template: &Template, input: Output) -> Result<Output> {
        let scope = Scope::root(input);
        self.eval(template.root(), &scope)
    }

    fn eval(&self, node: &Node, scope: &Scope<'_>) -> Result<Output> {
        match node {
            Node::Literal(value) => Ok(Output::Value(value.clone())),
            Node::List(nodes) => {
                let mut items = Vec::with_capacity(nodes.len());
                for node in nodes {
                    if let Output::Value(value) = self.eval(node, scope)? {
                        items.push(value);
                    }
                }
                Ok(Output::Value(Value::Array(items)))
            }
            Node::Map(entries) => {
                let mut map = Map::new();
                for (key, node) in entries {
                    if let Output::Value(value) = self.eval(node, scope)? {
                        map.insert(key.clone(), value);
                    }
                }
                Ok(Output::Value(Value::Object(map)))
            }
            Node::Rule(rule) => {
                stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
                    self.eval_rule(rule, scope)
                })
            }
        }
    }

    fn eval_rule(&self, rule: &Rule, scope: &Scope<'_>) -> Result<Output> {
        let fail = |fault: Fault| fault.at(rule);

        match &rule.op {
            RuleOp::This => Ok(scope.value().clone()),
            RuleOp::Parent => scope
                .parent()
                .map(|parent| parent.value().clone())
                .ok_or_else(|| fail(Fault::Lookup("no enclosing context at the root".to_string()))),
            RuleOp::Item | RuleOp::Index => {
                let iteration = scope
                    .iteration()
                    .ok_or_else(|| fail(outside_map(rule)))?;
                if matches!(rule.op, RuleOp::Item) {
                    Ok(Output::Value(iteration.item.clone()))
                } else {
                    Ok(Output::Value(Value::from(iteration.index)))
                }
            }
            RuleOp::Key | RuleOp::Value => {
                let iteration = scope
                    .iteration()
                    .ok_or_else(|| fail(outside_map(rule)))?;
                let key = iteration.key.as_ref().ok_or_else(|| {
                    fail(Fault::Lookup(format!(
                        "'{}' is only bound while iterating a map",
                        rule.kind()
                    )))
                })?;
                if matches!(rule.op, RuleOp::Key) {
                    Ok(Output::Value(Value::String(key.clone())))
                } else {
                    Ok(Output::Value(iteration.item.clone()))
                }
            }
            RuleOp::Set { name, value } => {
                let name = expect_string(self.eval(name, scope)?, "name").map_err(fail)?;
                let value = match value {
                    Some(node) => self.eval(node, scope)?,
                    None => scope.value().clone(),
                };
                scope.set(name, value);
                Ok(scope.value().clone())
            }
            RuleOp::Get { name } => {
                let name = expect_string(self.eval(name, scope)?, "name").map_err(fail)?;
                Ok(scope.get(&name).unwrap_or(Output::NoContent))
            }
            RuleOp::Attr { target, default } => self.eval_attr(rule, target, default.as_ref(), scope),
            RuleOp::Object { key, value } => {
                let key = self.eval(key, scope)?;
                let value = self.eval(value, scope)?;
                let mut map = Map::new();
                if let (Output::Value(key), Output::Value(value)) = (key, value) {
                    match key {
                        Value::String(key) => {
                            map.insert(key, value);
                        }
                        other => {
                            return Err(fail(Fault::Type(format!(
                                "object key must be a string, got {}",
                                type_name(&other)
                            ))));
                        }
                    }
                }
                Ok(Output::Value(Value::Object(map)))
            }
            RuleOp::Map(body) => self.eval_map(rule, body, scope),
            RuleOp::Zip { items } => {
                let lists = match self.eval(items, scope)? {
                    Output::NoContent => return Ok(Output::NoContent),
                    Output::Value(value) => value,
                };
                zip(&lists).map(Output::Value).map_err(fail)
            }
            RuleOp::Join { items, sep } => {
                let items = match self.eval(items, scope)? {
                    Output::NoContent => return Ok(Output::NoContent),
                    Output::Value(Value::Array(items)) => items,
                    Output::Value(other) => {
                        return Err(fail(Fault::Type(format!(
                            "'items' must be a list, got {}",
                            type_name(&other)
                        ))));
                    }
                };
                let sep = match sep {
                    Some(node) => match self.eval(node, scope)? {
                        Output::Value(Value::String(sep)) => Some(sep),
                        Output::NoContent => None,
                        Output::Value(other) => {
                            return Err(fail(Fault::Type(format!(
                                "separator must be a string, got {}",
                                type_name(&other)
                            ))));
                        }
                    },
                    None => None,
                };
                join(items, sep).map_err(fail)
            }
            RuleOp::Chain { funcs } => self.eval_chain(funcs, scope),
            RuleOp::Expr { op, operands } => match operands {
                Operands::Current => match scope.value() {
                    Output::Value(value) => ops::unary(*op, value).map(Output::Value).map_err(fail),
                    Output::NoContent => Ok(Output::NoContent),
                },
                Operands::Value(node) => {
                    let right = self.eval(node, scope)?;
                    match (scope.value(), right) {
                        (Output::Value(left), Output::Value(right)) => {
                            ops::binary(*op, left, &right).map(Output::Value).map_err(fail)
                        }
                        _ => Ok(Output::NoContent),
                    }
                }
                Operands::Values(node) => {
                    let Some(values) = self.eval_operands(rule, node, scope)? else {
                        return Ok(Output::NoContent);
                    };
                    fold(*op, values).map(Output::Value).map_err(fail)
                }
            },
            RuleOp::Convert {
                converter,
                operands,
            } => {
                let args = match operands {
                    Operands::Current => match scope.value() {
                        Output::Value(value) => vec![value.clone()],
                        Output::NoContent => return Ok(Output::NoContent),
                    },
                    Operands::Value(node) => match self.eval(node, scope)? {
                        Output::Value(value) => vec![value],
                        Output::NoContent => return Ok(Output::NoContent),
                    },
                    Operands::Values(node) => match self.eval_operands(rule, node, scope)? {
                        Some(values) => values,
                        None => return Ok(Output::NoContent),
                    },
                };
                convert::apply(*converter, &args)
                    .map(Output::Value)
                    .map_err(fail)
            }
            RuleOp::Format { pattern, value } => {
                let value = match value {
                    Some(node) => self.eval(node, scope)?,
                    None => scope.value().clone(),
                };
                match value {
                    Output::Value(value) => format::render(pattern, &value)
                        .map(|text| Output::Value(Value::String(text)))
                        .map_err(fail),
                    Output::NoContent => Ok(Output::NoContent),
                }
            }
            RuleOp::Default { value, fallback } => match self.eval(value, scope) {
                Ok(Output::NoContent) | Err(TransformError::Lookup { .. }) => {
                    self.eval(fallback, scope)
                }
                other => other,
            },
            RuleOp::Omit => Ok(Output::NoContent),
            RuleOp::If {
                cond,
                then,
                otherwise,
            } => match self.eval(cond, scope)? {
                Output::Value(Value::Bool(true)) => self.eval(then, scope),
                Output::Value(Value::Bool(false)) => match otherwise {
                    Some(node) => self.eval(node, scope),
                    None => Ok(Output::NoContent),
                },
                other => Err(fail(Fault::Type(format!(
                    "condition must be a bool, got {}",
                    describe(&other)
                )))),
            },
            RuleOp::Include { name, value } => {
                let name = expect_string(self.eval(name, scope)?, "name").map_err(fail)?;
                let input = match value {
                    Some(node) => self.eval(node, scope)?,
                    None => scope.value().clone(),
                };
                if input.is_no_content() {
                    return Ok(Output::NoContent);
                }
                self.include(rule, &name, input)
            }
            RuleOp::Literal(value) => Ok(Output::Value(value.clone())),
        }
    }

    fn eval_attr(
        &self,
        rule: &Rule,
        target: &AttrTarget,
        default: Option<&Node>,
        scope: &Scope<'_>,
    ) -> Result<Output> {
        let names = match target {
            AttrTarget::Name(node) => match self.eval(node, scope)? {
                Output::Value(name) => vec![name],
                Output::NoContent => return Ok(Output::NoContent),
            },
            AttrTarget::Names(node) => match self.eval(node, scope)? {
                Output::Value(Value::Array(names)) => names,
                Output::Value(other) => {
                    return Err(Fault::Type(format!(
                        "'names' must be a list, got {}",
                        type_name(&other)
                    ))
                    .at(rule));
                }
                Output::NoContent => return Ok(Output::NoContent),
            },
        };

        let current = match scope.value() {
            Output::Value(value) => value,
            Output::NoContent => return Ok(Output::NoContent),
        };

        match navigate(current, &names) {
            Ok(found) => Ok(Output::Value(found.clone())),
            Err(Fault::Lookup(message)) => match default {
                Some(node) => self.eval(node, scope),
                None => Err(Fault::Lookup(message).at(rule)),
            },
            Err(fault) => Err(fault.at(rule)),
        }
    }

    fn eval_map(&self, rule: &Rule, body: &MapBody, scope: &Scope<'_>) -> Result<Output> {
        let iterations: Vec<Iteration> = match scope.value() {
            Output::NoContent => return Ok(Output::NoContent),
            Output::Value(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| Iteration {
                    index,
                    key: None,
                    item: item.clone(),
                })
                .collect(),
            Output::Value(Value::Object(map)) => map
                .iter()
                .enumerate()
                .map(|(index, (key, item))| Iteration {
                    index,
                    key: Some(key.clone()),
                    item: item.clone(),
                })
                .collect(),
            Output::Value(other) => {
                return Err(Fault::Type(format!(
                    "'map' expects a list or map, got {}",
                    type_name(other)
                ))
                .at(rule));
            }
        };

        match body {
            MapBody::Item(node) => {
                let mut items = Vec::with_capacity(iterations.len());
                for iteration in iterations {
                    let element = scope.element(iteration);
                    if let Output::Value(value) = self.eval(node, &element)? {
                        items.push(value);
                    }
                }
                Ok(Output::Value(Value::Array(items)))
            }
            MapBody::Items(node) => {
                let mut items = Vec::new();
                for iteration in iterations {
                    let element = scope.element(iteration);
                    match self.eval(node, &element)? {
                        Output::Value(Value::Array(produced)) => items.extend(produced),
                        Output::NoContent => {}
                        Output::Value(other) => {
                            return Err(Fault::Type(format!(
                                "'items' must produce a list, got {}",
                                type_name(&other)
                            ))
                            .at(rule));
                        }
                    }
                }
                Ok(Output::Value(Value::Array(items)))
            }
            MapBody::Entries { key, value } => {
                let mut map = Map::new();
                for iteration in iterations {
                    let element = scope.element(iteration);
                    let key = self.eval(key, &element)?;
                    let value = self.eval(value, &element)?;
                    if let (Output::Value(key), Output::Value(value)) = (key, value) {
                        match key {
                            Value::String(key) => {
                                map.insert(key, value);
                            }
                            other => {
                                return Err(Fault::Type(format!(
                                    "map key must be a string, got {}",
                                    type_name(&other)
                                ))
                                .at(rule));
                            }
                        }
                    }
                }
                Ok(Output::Value(Value::Object(map)))
            }
        }
    }

    fn eval_chain(&self, funcs: &[Node], scope: &Scope<'_>) -> Result<Output> {
        let Some((first, rest)) = funcs.split_first() else {
            return Ok(scope.value().clone());
        };
        let result = self.eval(first, scope)?;
        if rest.is_empty() {
            return Ok(result);
        }
        let next = scope.child(result);
        self.eval_chain(rest, &next)
    }

    /// Operand list of `expr` and `convert`; `None` when any operand has no content
    fn eval_operands(
        &self,
        rule: &Rule,
        node: &Node,
        scope: &Scope<'_>,
    ) -> Result<Option<Vec<Value>>> {
        if let Node::List(nodes) = node {
            let mut values = Vec::with_capacity(nodes.len());
            for node in nodes {
                match self.eval(node, scope)? {
                    Output::Value(value) => values.push(value),
                    Output::NoContent => return Ok(None),
                }
            }
            return Ok(Some(values));
        }

        match self.eval(node, scope)? {
            Output::Value(Value::Array(values)) => Ok(Some(values)),
            Output::NoContent => Ok(None),
            Output::Value(other) => Err(Fault::Type(format!(
                "'values' must be a list, got {}",
                type_name(&other)
            ))
            .at(rule)),
        }
    }

    fn include(&self, rule: &Rule, name: &str, input: Output) -> Result<Output> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(TransformError::Recursion {
                path: rule.path.clone(),
                limit: self.max_depth,
            });
        }

        let template = self.registry.resolve(name, &rule.path)?;
        trace!(template = name, depth, "including template");

        let nested = Evaluator {
            registry: self.registry,
            max_depth: self.max_depth,
            depth,
        };
        nested.run(&template, input)
    }
}

fn outside_map(rule: &Rule) -> Fault {
    Fault::Lookup(format!("'{}' used outside of 'map'", rule.kind()))
}

fn expect_string(output: Output, param: &str) -> Step<String> {
    match output {
        Output::Value(Value::String(s)) => Ok(s),
        other => Err(Fault::Type(format!(
            "parameter '{}' must be a string, got {}",
            param,
            describe(&other)
        ))),
    }
}

/// Follow keys and indices into a value
fn navigate<'v>(value: &'v Value, names: &[Value]) -> Step<&'v Value> {
    let mut current = value;
    for name in names {
        current = match (current, name) {
            (Value::Object(map), Value::String(key)) => map
                .get(key)
                .ok_or_else(|| Fault::Lookup(format!("key '{}' not found", key)))?,
            (Value::Array(items), Value::Number(n)) => {
                let index = n.as_i64().ok_or_else(|| {
                    Fault::Type(format!("list index must be an integer, got {}", n))
                })?;
                let len = items.len() as i64;
                let resolved = if index < 0 { len + index } else { index };
                usize::try_from(resolved)
                    .ok()
                    .and_then(|i| items.get(i))
                    .ok_or_else(|| {
                        Fault::Lookup(format!(
                            "index {} out of range for list of length {}",
                            index, len
                        ))
                    })?
            }
            (Value::Object(_), other) => {
                return Err(Fault::Type(format!(
                    "map key must be a string, got {}",
                    type_name(other)
                )));
            }
            (Value::Array(_), other) => {
                return Err(Fault::Type(format!(
                    "list index must be an integer, got {}",
                    type_name(other)
                )));
            }
            (scalar, _) => {
                return Err(Fault::Type(format!(
                    "cannot navigate into {}",
                    type_name(scalar)
                )));
            }
        };
    }
    Ok(current)
}

fn zip(lists: &Value) -> Step<Value> {
    let lists = match lists {
        Value::Array(lists) => lists,
        other => {
            return Err(Fault::Type(format!(
                "'items' must be a list of lists, got {}",
                type_name(other)
            )));
        }
    };

    let mut columns = Vec::with_capacity(lists.len());
    for list in lists {
        match list {
            Value::Array(items) => columns.push(items),
            other => {
                return Err(Fault::Type(format!(
                    "'zip' expects lists, got {}",
                    type_name(other)
                )));
            }
        }
    }

    let len = columns.iter().map(|items| items.len()).min().unwrap_or(0);
    let rows = (0..len)
        .map(|i| Value::Array(columns.iter().map(|items| items[i].clone()).collect()))
        .collect();
    Ok(Value::Array(rows))
}

fn join(items: Vec<Value>, sep: Option<String>) -> Step<Output> {
    let Some(first) = items.first() else {
        return Ok(Output::NoContent);
    };
    let kind = type_name(first);
    if let Some(other) = items.iter().find(|item| type_name(item) != kind) {
        return Err(Fault::Type(format!(
            "'join' cannot mix {} and {}",
            kind,
            type_name(other)
        )));
    }
    if sep.is_some() && kind != "string" {
        return Err(Fault::Type(format!(
            "separator is only allowed when joining strings, got {}",
            kind
        )));
    }

    let joined = match kind {
        "map" => {
            let mut merged = Map::new();
            for item in items {
                if let Value::Object(map) = item {
                    merged.extend(map);
                }
            }
            Value::Object(merged)
        }
        "list" => {
            let mut concatenated = Vec::new();
            for item in items {
                if let Value::Array(list) = item {
                    concatenated.extend(list);
                }
            }
            Value::Array(concatenated)
        }
        "string" => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            Value::String(parts.join(sep.as_deref().unwrap_or("")))
        }
        other => {
            return Err(Fault::Type(format!("'join' cannot combine {}", other)));
        }
    };
    Ok(Output::Value(joined))
}

/// Left fold of an operator over an operand list
fn fold(op: Operator, values: Vec<Value>) -> Step<Value> {
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        return Err(Fault::Type(format!("operator '{}' needs at least one value", op)));
    };
    let rest: Vec<Value> = values.collect();

    if rest.is_empty() {
        return if op.is_unary() {
            ops::unary(op, &first)
        } else {
            Ok(first)
        };
    }
    if !op.is_binary() {
        return Err(Fault::Type(format!(
            "operator '{}' takes a single operand, got {}",
            op,
            rest.len() + 1
        )));
    }

    rest.iter()
        .try_fold(first, |acc, value| ops::binary(op, &acc, value))
}
