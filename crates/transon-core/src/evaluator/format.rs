//! Rendering of `format` patterns

use serde_json::Value;

use super::{Fault, Step};
use crate::template::pattern::{Align, Field, FormatSpec, Piece, Sign};
use crate::template::Pattern;
use crate::value::type_name;

/// Render a pattern with the fields taken from `value`
///
/// A map supplies named fields, a list positional ones, and any other value
/// is the single positional field `0`.
pub(crate) fn render(pattern: &Pattern, value: &Value) -> Step<String> {
    let mut out = String::new();
    for piece in &pattern.pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Field { field, spec } => {
                let arg = argument(value, field)?;
                out.push_str(&format_value(arg, spec)?);
            }
        }
    }
    Ok(out)
}

fn argument<'v>(value: &'v Value, field: &Field) -> Step<&'v Value> {
    match (value, field) {
        (Value::Object(map), Field::Name(name)) => map
            .get(name)
            .ok_or_else(|| Fault::Lookup(format!("format field '{}' not found", name))),
        (Value::Array(items), Field::Position(index)) => items.get(*index).ok_or_else(|| {
            Fault::Lookup(format!(
                "format field {} out of range for {} values",
                index,
                items.len()
            ))
        }),
        (Value::Object(_), Field::Position(index)) => Err(Fault::Lookup(format!(
            "positional format field {} needs a list value",
            index
        ))),
        (_, Field::Name(name)) => Err(Fault::Lookup(format!(
            "named format field '{}' needs a map value, got {}",
            name,
            type_name(value)
        ))),
        (single, Field::Position(0)) => Ok(single),
        (_, Field::Position(index)) => Err(Fault::Lookup(format!(
            "format field {} out of range for a single value",
            index
        ))),
    }
}

fn format_value(value: &Value, spec: &FormatSpec) -> Step<String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64().filter(|_| !is_float_type(spec.ty)) {
                format_int(i, spec)
            } else {
                format_float(n.as_f64().unwrap_or(f64::NAN), n.is_f64(), spec)
            }
        }
        Value::String(s) => format_str(s, spec),
        other => match spec.ty {
            None => format_str(&crate::value::display(other), spec),
            Some(ty) => Err(Fault::Type(format!(
                "format type '{}' cannot be applied to {}",
                ty,
                type_name(other)
            ))),
        },
    }
}

fn is_float_type(ty: Option<char>) -> bool {
    matches!(ty, Some('f' | 'F' | 'e' | 'E' | '%'))
}

fn format_str(s: &str, spec: &FormatSpec) -> Step<String> {
    if let Some(ty) = spec.ty.filter(|ty| *ty != 's') {
        return Err(Fault::Type(format!(
            "format type '{}' cannot be applied to a string",
            ty
        )));
    }
    if spec.sign != Sign::Minus {
        return Err(Fault::Type("sign is not allowed for strings".to_string()));
    }
    if spec.align == Some(Align::AfterSign) {
        return Err(Fault::Type("'=' alignment is not allowed for strings".to_string()));
    }

    let body: String = match spec.precision {
        Some(precision) => s.chars().take(precision).collect(),
        None => s.to_string(),
    };
    Ok(pad("", &body, spec, Align::Left))
}

fn format_int(i: i64, spec: &FormatSpec) -> Step<String> {
    if spec.precision.is_some() {
        return Err(Fault::Type("precision is not allowed for integers".to_string()));
    }

    let magnitude = i.unsigned_abs();
    let (digits, prefix, group_size) = match spec.ty {
        None | Some('d') => (magnitude.to_string(), "", 3),
        Some('x') => (format!("{:x}", magnitude), "0x", 4),
        Some('X') => (format!("{:X}", magnitude), "0X", 4),
        Some('o') => (format!("{:o}", magnitude), "0o", 4),
        Some('b') => (format!("{:b}", magnitude), "0b", 4),
        Some(ty) => {
            return Err(Fault::Type(format!(
                "format type '{}' cannot be applied to an integer",
                ty
            )));
        }
    };

    let digits = match spec.grouping {
        Some(',') if group_size == 4 => {
            return Err(Fault::Type("',' grouping needs a decimal format type".to_string()));
        }
        Some(sep) => group(&digits, sep, group_size),
        None => digits,
    };

    let mut lead = sign(i < 0, spec.sign).to_string();
    if spec.alternate {
        lead.push_str(prefix);
    }
    Ok(pad(&lead, &digits, spec, Align::Right))
}

fn format_float(f: f64, is_float: bool, spec: &FormatSpec) -> Step<String> {
    let magnitude = f.abs();
    let body = match spec.ty {
        Some('f' | 'F') => fixed(magnitude, spec.precision.unwrap_or(6), spec.grouping),
        Some('%') => {
            let mut body = fixed(magnitude * 100.0, spec.precision.unwrap_or(6), spec.grouping);
            body.push('%');
            body
        }
        Some(ty @ ('e' | 'E')) => {
            let body = scientific(magnitude, spec.precision.unwrap_or(6));
            if ty == 'E' {
                body.to_uppercase()
            } else {
                body
            }
        }
        None => match spec.precision {
            Some(precision) => general(magnitude, precision.max(1)),
            None if is_float => {
                let repr = serde_json::Number::from_f64(magnitude)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| magnitude.to_string());
                match spec.grouping {
                    Some(sep) => group_fixed(&repr, sep),
                    None => repr,
                }
            }
            None => magnitude.to_string(),
        },
        Some(ty) => {
            return Err(Fault::Type(format!(
                "format type '{}' cannot be applied to a float",
                ty
            )));
        }
    };
    Ok(pad(sign(f < 0.0, spec.sign), &body, spec, Align::Right))
}

fn sign(negative: bool, sign: Sign) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Sign::Plus) => "+",
        (false, Sign::Space) => " ",
        (false, Sign::Minus) => "",
    }
}

fn fixed(f: f64, precision: usize, grouping: Option<char>) -> String {
    let text = format!("{:.*}", precision, f);
    match grouping {
        Some(sep) => group_fixed(&text, sep),
        None => text,
    }
}

/// Scientific notation with a signed, two-digit exponent
fn scientific(f: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, f);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => text,
    }
}

/// Shortest of fixed and scientific notation with `precision` significant digits
fn general(f: f64, precision: usize) -> String {
    let rounded = format!("{:.*e}", precision - 1, f);
    let exponent: i32 = rounded
        .split_once('e')
        .and_then(|(_, exponent)| exponent.parse().ok())
        .unwrap_or(0);

    if exponent >= -4 && exponent < precision as i32 {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let mut text = strip_zeros(format!("{:.*}", decimals, f));
        if !text.contains('.') {
            text.push_str(".0");
        }
        text
    } else {
        let text = scientific(f, precision - 1);
        match text.split_once('e') {
            Some((mantissa, exponent)) => {
                format!("{}e{}", strip_zeros(mantissa.to_string()), exponent)
            }
            None => text,
        }
    }
}

fn strip_zeros(text: String) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Insert `sep` every `size` digits, counting from the right
fn group(digits: &str, sep: char, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % size == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

fn group_fixed(text: &str, sep: char) -> String {
    let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (int_part, rest) = text.split_at(split);
    format!("{}{}", group(int_part, sep, 3), rest)
}

/// Apply fill, alignment and width around a signed body
fn pad(lead: &str, body: &str, spec: &FormatSpec, default_align: Align) -> String {
    let (fill, align) = match (spec.fill, spec.align) {
        (fill, Some(align)) => (fill.unwrap_or(' '), align),
        (_, None) if spec.zero && default_align == Align::Right => ('0', Align::AfterSign),
        (_, None) if spec.zero => ('0', default_align),
        (_, None) => (' ', default_align),
    };

    let len = lead.chars().count() + body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        return format!("{}{}", lead, body);
    }

    let padding = width - len;
    let fill_str = |n: usize| fill.to_string().repeat(n);
    match align {
        Align::Left => format!("{}{}{}", lead, body, fill_str(padding)),
        Align::Right => format!("{}{}{}", fill_str(padding), lead, body),
        Align::Center => {
            let left = padding / 2;
            format!("{}{}{}{}", fill_str(left), lead, body, fill_str(padding - left))
        }
        Align::AfterSign => format!("{}{}{}", lead, fill_str(padding), body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fmt(pattern: &str, value: Value) -> Step<String> {
        render(&Pattern::parse(pattern).unwrap(), &value)
    }

    #[test]
    fn test_named_and_positional_fields() {
        assert_eq!(
            fmt("{name} is {age}", json!({"name": "Ada", "age": 36})).unwrap(),
            "Ada is 36"
        );
        assert_eq!(fmt("{1}-{0}", json!(["a", "b"])).unwrap(), "b-a");
        assert_eq!(fmt("value: {}", json!(7)).unwrap(), "value: 7");
        assert_eq!(fmt("{{{}}}", json!("x")).unwrap(), "{x}");
    }

    #[test]
    fn test_missing_fields_are_lookup_errors() {
        assert!(matches!(fmt("{missing}", json!({})), Err(Fault::Lookup(_))));
        assert!(matches!(fmt("{2}", json!([1])), Err(Fault::Lookup(_))));
        assert!(matches!(fmt("{name}", json!("x")), Err(Fault::Lookup(_))));
        assert!(matches!(fmt("{1}", json!("x")), Err(Fault::Lookup(_))));
    }

    #[test]
    fn test_string_alignment_and_truncation() {
        assert_eq!(fmt("[{:<5}]", json!("ab")).unwrap(), "[ab   ]");
        assert_eq!(fmt("[{:>5}]", json!("ab")).unwrap(), "[   ab]");
        assert_eq!(fmt("[{:*^6}]", json!("ab")).unwrap(), "[**ab**]");
        assert_eq!(fmt("[{:5}]", json!("ab")).unwrap(), "[ab   ]");
        assert_eq!(fmt("{:.2}", json!("abcdef")).unwrap(), "ab");
    }

    #[test]
    fn test_integers() {
        assert_eq!(fmt("{:05d}", json!(42)).unwrap(), "00042");
        assert_eq!(fmt("{:05d}", json!(-42)).unwrap(), "-0042");
        assert_eq!(fmt("{:+d}", json!(5)).unwrap(), "+5");
        assert_eq!(fmt("{:,}", json!(1234567)).unwrap(), "1,234,567");
        assert_eq!(fmt("{:#x}", json!(255)).unwrap(), "0xff");
        assert_eq!(fmt("{:X}", json!(255)).unwrap(), "FF");
        assert_eq!(fmt("{:b}", json!(5)).unwrap(), "101");
        assert_eq!(fmt("{:o}", json!(8)).unwrap(), "10");
        assert_eq!(fmt("{:>4}", json!(7)).unwrap(), "   7");
    }

    #[test]
    fn test_floats() {
        assert_eq!(fmt("{:.2f}", json!(3.14159)).unwrap(), "3.14");
        assert_eq!(fmt("{:f}", json!(1)).unwrap(), "1.000000");
        assert_eq!(fmt("{:.1%}", json!(0.256)).unwrap(), "25.6%");
        assert_eq!(fmt("{:e}", json!(12345.678)).unwrap(), "1.234568e+04");
        assert_eq!(fmt("{:.2E}", json!(0.00012)).unwrap(), "1.20E-04");
        assert_eq!(fmt("{:,.2f}", json!(1234567.891)).unwrap(), "1,234,567.89");
        assert_eq!(fmt("{:08.3f}", json!(-3.5)).unwrap(), "-003.500");
        assert_eq!(fmt("{}", json!(2.5)).unwrap(), "2.5");
    }

    #[test]
    fn test_general_precision() {
        assert_eq!(fmt("{:.3}", json!(3.14159)).unwrap(), "3.14");
        assert_eq!(fmt("{:.2}", json!(1234.5)).unwrap(), "1.2e+03");
        assert_eq!(fmt("{:.3}", json!(2.0)).unwrap(), "2.0");
    }

    #[test]
    fn test_type_mismatches() {
        assert!(matches!(fmt("{:d}", json!("x")), Err(Fault::Type(_))));
        assert!(matches!(fmt("{:d}", json!(1.5)), Err(Fault::Type(_))));
        assert!(matches!(fmt("{:+}", json!("x")), Err(Fault::Type(_))));
        assert!(matches!(fmt("{:.2d}", json!(1)), Err(Fault::Type(_))));
        assert!(matches!(fmt("{:f}", json!([[1]])), Err(Fault::Type(_))));
        assert_eq!(fmt("{:f}", json!([1])).unwrap(), "1.000000");
    }

    #[test]
    fn test_non_scalar_values_render_as_json() {
        assert_eq!(fmt("{0}", json!([[1, 2]])).unwrap(), "[1,2]");
        assert_eq!(fmt("{flag}", json!({"flag": true})).unwrap(), "true");
    }
}
