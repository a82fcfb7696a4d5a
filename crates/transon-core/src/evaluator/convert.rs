//! Converters of the `convert` rule

use serde_json::Value;

use super::{Fault, Step};
use crate::template::Converter;
use crate::value::{self, display, float, is_truthy, type_name};

pub(crate) fn apply(converter: Converter, args: &[Value]) -> Step<Value> {
    let (value, base) = match args {
        [value] => (value, None),
        [value, base] if converter == Converter::Int => (value, Some(base)),
        _ => {
            return Err(Fault::Type(format!(
                "converter '{}' got {} arguments",
                converter.name(),
                args.len()
            )));
        }
    };

    match converter {
        Converter::Str => Ok(Value::String(display(value))),
        Converter::Int => to_int(value, base),
        Converter::Float => to_float(value),
        Converter::Bool => Ok(Value::Bool(is_truthy(value))),
        Converter::Json => Ok(Value::String(value::to_string(value))),
        Converter::Parse => match value {
            Value::String(text) => value::parse(text).map_err(|err| Fault::Type(err.to_string())),
            other => Err(Fault::Type(format!(
                "'parse' expects a string, got {}",
                type_name(other)
            ))),
        },
    }
}

fn to_int(value: &Value, base: Option<&Value>) -> Step<Value> {
    let base = match base {
        None => None,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(b @ 2..=36) => Some(b as u32),
            _ => return Err(Fault::Type(format!("int base must be between 2 and 36, got {}", n))),
        },
        Some(other) => {
            return Err(Fault::Type(format!(
                "int base must be a number, got {}",
                type_name(other)
            )));
        }
    };

    match value {
        Value::String(text) => {
            let radix = base.unwrap_or(10);
            let digits = text.trim().replace('_', "");
            i64::from_str_radix(&digits, radix)
                .map(Value::from)
                .map_err(|_| {
                    Fault::Type(format!(
                        "invalid literal for int with base {}: '{}'",
                        radix, text
                    ))
                })
        }
        _ if base.is_some() => Err(Fault::Type(format!(
            "int with an explicit base expects a string, got {}",
            type_name(value)
        ))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::from(i)),
            None => {
                let f = n.as_f64().unwrap_or(f64::NAN).trunc();
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(Value::from(f as i64))
                } else {
                    Err(Fault::Type(format!("{} does not fit an integer", n)))
                }
            }
        },
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        other => Err(Fault::Type(format!(
            "cannot convert {} to int",
            type_name(other)
        ))),
    }
}

fn to_float(value: &Value) -> Step<Value> {
    let f = match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(text) => text.trim().parse::<f64>().map_err(|_| {
            Fault::Type(format!("could not convert string to float: '{}'", text))
        })?,
        other => {
            return Err(Fault::Type(format!(
                "cannot convert {} to float",
                type_name(other)
            )));
        }
    };
    float(f).ok_or_else(|| Fault::Type(format!("{} is not a finite number", display(value))))
}
