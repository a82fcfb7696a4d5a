//! Evaluation contexts

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use crate::output::Output;

/// Loop bindings of one `map` element
#[derive(Debug, Clone)]
pub(crate) struct Iteration {
    pub index: usize,
    /// Entry key when iterating a map
    pub key: Option<String>,
    pub item: Value,
}

/// One evaluation context
///
/// Every rule that produces a new current value (a `chain` step, a `map`
/// element) evaluates its operands in a child scope. Variables stored with
/// `set` live in the scope they were set in and are visible to all its
/// descendants.
pub(crate) struct Scope<'p> {
    value: Output,
    parent: Option<&'p Scope<'p>>,
    iteration: Option<Iteration>,
    vars: RefCell<HashMap<String, Output>>,
}

impl<'p> Scope<'p> {
    pub fn root(value: Output) -> Self {
        Self {
            value,
            parent: None,
            iteration: None,
            vars: RefCell::new(HashMap::new()),
        }
    }

    pub fn child(&'p self, value: Output) -> Scope<'p> {
        Scope {
            value,
            parent: Some(self),
            iteration: None,
            vars: RefCell::new(HashMap::new()),
        }
    }

    pub fn element(&'p self, iteration: Iteration) -> Scope<'p> {
        Scope {
            value: Output::Value(iteration.item.clone()),
            parent: Some(self),
            iteration: Some(iteration),
            vars: RefCell::new(HashMap::new()),
        }
    }

    pub fn value(&self) -> &Output {
        &self.value
    }

    pub fn parent(&self) -> Option<&Scope<'p>> {
        self.parent
    }

    /// Innermost loop bindings
    pub fn iteration(&self) -> Option<&Iteration> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(iteration) = &current.iteration {
                return Some(iteration);
            }
            scope = current.parent;
        }
        None
    }

    pub fn set(&self, name: String, value: Output) {
        self.vars.borrow_mut().insert(name, value);
    }

    /// Nearest variable with the given name, walking outward
    pub fn get(&self, name: &str) -> Option<Output> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.vars.borrow().get(name) {
                return Some(value.clone());
            }
            scope = current.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variables_are_visible_to_descendants_only() {
        let root = Scope::root(Output::Value(json!(1)));
        let child = root.child(Output::Value(json!(2)));
        child.set("x".to_string(), Output::Value(json!("child")));

        let grandchild = child.child(Output::NoContent);
        assert_eq!(grandchild.get("x"), Some(Output::Value(json!("child"))));
        assert_eq!(root.get("x"), None);
    }

    #[test]
    fn test_inner_variables_shadow_outer() {
        let root = Scope::root(Output::NoContent);
        root.set("x".to_string(), Output::Value(json!(1)));
        let child = root.child(Output::NoContent);
        child.set("x".to_string(), Output::Value(json!(2)));
        assert_eq!(child.get("x"), Some(Output::Value(json!(2))));
        assert_eq!(root.get("x"), Some(Output::Value(json!(1))));
    }

    #[test]
    fn test_iteration_found_through_nested_scopes() {
        let root = Scope::root(Output::Value(json!([10])));
        let element = root.element(Iteration {
            index: 0,
            key: None,
            item: json!(10),
        });
        let nested = element.child(Output::Value(json!("other")));

        assert_eq!(element.value(), &Output::Value(json!(10)));
        assert_eq!(nested.iteration().map(|it| it.index), Some(0));
        assert!(root.iteration().is_none());
        assert_eq!(nested.parent().map(|p| p.value().clone()), Some(Output::Value(json!(10))));
    }
}
