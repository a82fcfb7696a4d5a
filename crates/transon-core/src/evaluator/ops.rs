//! Operators of the `expr` rule

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::{Fault, Step};
use crate::template::Operator;
use crate::value::{float, type_name};

/// Numeric operand, integers kept exact
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(number: &Number) -> Self {
        match number.as_i64() {
            Some(i) => Num::Int(i),
            None => Num::Float(number.as_f64().unwrap_or(f64::NAN)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn number(f: f64) -> Step<Value> {
    float(f).ok_or_else(|| Fault::Type("result is not a finite number".to_string()))
}

fn unsupported(op: Operator, left: &Value, right: &Value) -> Fault {
    Fault::Type(format!(
        "unsupported operand types for '{}': {} and {}",
        op,
        type_name(left),
        type_name(right)
    ))
}

/// Apply an operator to a single operand
pub(crate) fn unary(op: Operator, operand: &Value) -> Step<Value> {
    match (op, operand) {
        (Operator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (Operator::Sub, Value::Number(n)) => match Num::of(n) {
            Num::Int(i) => match i.checked_neg() {
                Some(negated) => Ok(Value::from(negated)),
                None => number(-(i as f64)),
            },
            Num::Float(f) => number(-f),
        },
        _ => Err(Fault::Type(format!(
            "unsupported operand type for '{}': {}",
            op,
            type_name(operand)
        ))),
    }
}

/// Apply an operator to two operands
pub(crate) fn binary(op: Operator, left: &Value, right: &Value) -> Step<Value> {
    match op {
        Operator::Add => add(left, right),
        Operator::Mul => mul(left, right),
        Operator::Sub
        | Operator::Div
        | Operator::FloorDiv
        | Operator::Mod
        | Operator::Pow => match (left, right) {
            (Value::Number(a), Value::Number(b)) => arithmetic(op, Num::of(a), Num::of(b)),
            _ => Err(unsupported(op, left, right)),
        },
        Operator::Eq => Ok(Value::Bool(equals(left, right))),
        Operator::Ne => Ok(Value::Bool(!equals(left, right))),
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            let ordering = compare(left, right).ok_or_else(|| unsupported(op, left, right))?;
            let result = match op {
                Operator::Lt => ordering == Ordering::Less,
                Operator::Le => ordering != Ordering::Greater,
                Operator::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        Operator::And | Operator::Or => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == Operator::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(unsupported(op, left, right)),
        },
        Operator::In => contains(right, left)
            .map(Value::Bool)
            .ok_or_else(|| unsupported(op, left, right)),
        Operator::Not => Err(Fault::Type(format!("operator '{}' takes a single operand", op))),
    }
}

fn add(left: &Value, right: &Value) -> Step<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => arithmetic(Operator::Add, Num::of(a), Num::of(b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (key, value) in b {
                merged.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(merged))
        }
        _ => Err(unsupported(Operator::Add, left, right)),
    }
}

/// Longest string (in bytes) or list `*` may produce
const MAX_REPEAT_LEN: usize = 1 << 24;

fn repeat_count(count: &Number) -> Option<usize> {
    count.as_i64().and_then(|n| usize::try_from(n.max(0)).ok())
}

fn repeated_len(unit: usize, count: usize) -> Step<usize> {
    unit.checked_mul(count)
        .filter(|len| *len <= MAX_REPEAT_LEN)
        .ok_or_else(|| {
            Fault::Type(format!(
                "repeating {} elements {} times exceeds the limit of {}",
                unit, count, MAX_REPEAT_LEN
            ))
        })
}

fn mul(left: &Value, right: &Value) -> Step<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => arithmetic(Operator::Mul, Num::of(a), Num::of(b)),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            let count = repeat_count(n).ok_or_else(|| unsupported(Operator::Mul, left, right))?;
            if s.is_empty() || count == 0 {
                return Ok(Value::String(String::new()));
            }
            repeated_len(s.len(), count)?;
            Ok(Value::String(s.repeat(count)))
        }
        (Value::Array(items), Value::Number(n)) | (Value::Number(n), Value::Array(items)) => {
            let count = repeat_count(n).ok_or_else(|| unsupported(Operator::Mul, left, right))?;
            if items.is_empty() || count == 0 {
                return Ok(Value::Array(Vec::new()));
            }
            let mut repeated = Vec::with_capacity(repeated_len(items.len(), count)?);
            for _ in 0..count {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::Array(repeated))
        }
        _ => Err(unsupported(Operator::Mul, left, right)),
    }
}

fn arithmetic(op: Operator, a: Num, b: Num) -> Step<Value> {
    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        if let Some(result) = int_arithmetic(op, x, y)? {
            return Ok(Value::from(result));
        }
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let result = match op {
        Operator::Add => x + y,
        Operator::Sub => x - y,
        Operator::Mul => x * y,
        Operator::Div | Operator::FloorDiv | Operator::Mod if y == 0.0 => {
            return Err(Fault::Type("division by zero".to_string()));
        }
        Operator::Div => x / y,
        Operator::FloorDiv => (x / y).floor(),
        Operator::Mod => {
            let r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) {
                r + y
            } else {
                r
            }
        }
        Operator::Pow => x.powf(y),
        _ => return Err(Fault::Type(format!("'{}' is not an arithmetic operator", op))),
    };
    number(result)
}

/// Exact integer arithmetic; `None` when the result needs a float
fn int_arithmetic(op: Operator, x: i64, y: i64) -> Step<Option<i64>> {
    let result = match op {
        Operator::Add => x.checked_add(y),
        Operator::Sub => x.checked_sub(y),
        Operator::Mul => x.checked_mul(y),
        Operator::FloorDiv | Operator::Mod if y == 0 => {
            return Err(Fault::Type("division by zero".to_string()));
        }
        Operator::FloorDiv => x.checked_div(y).map(|q| {
            if x % y != 0 && (x < 0) != (y < 0) {
                q - 1
            } else {
                q
            }
        }),
        Operator::Mod => x.checked_rem(y).map(|r| {
            if r != 0 && (r < 0) != (y < 0) {
                r + y
            } else {
                r
            }
        }),
        Operator::Pow => u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp)),
        _ => None,
    };
    Ok(result)
}

/// Equality with integers and floats comparing by numeric value
pub(crate) fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (Num::of(a), Num::of(b)) {
            (Num::Int(x), Num::Int(y)) => x == y,
            (x, y) => x.as_f64() == y.as_f64(),
        },
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (Num::of(a), Num::of(b)) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            (x, y) => x.as_f64().partial_cmp(&y.as_f64()),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn contains(container: &Value, needle: &Value) -> Option<bool> {
    match (container, needle) {
        (Value::Array(items), _) => Some(items.iter().any(|item| equals(item, needle))),
        (Value::String(haystack), Value::String(s)) => Some(haystack.contains(s.as_str())),
        (Value::Object(map), Value::String(key)) => Some(map.contains_key(key)),
        _ => None,
    }
}
