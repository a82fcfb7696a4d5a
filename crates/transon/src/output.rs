use std::io::{self, Write};
use transon_core::{Output, Value, value};

pub fn print_json(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

pub fn print_text(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

/// Print a transformation result; "no content" prints nothing unless
/// `null_on_empty` asks for `null`
pub fn print_output(output: &Output, compact: bool, null_on_empty: bool) -> io::Result<()> {
    let value = match output {
        Output::Value(value) => value,
        Output::NoContent if null_on_empty => &Value::Null,
        Output::NoContent => return Ok(()),
    };
    if compact {
        print_json(&value::to_string(value))
    } else {
        print_json(&value::to_string_pretty(value))
    }
}
