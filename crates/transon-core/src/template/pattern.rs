//! Parsing of `format` patterns
//!
//! Patterns follow a subset of Python's `str.format` syntax:
//!
//! - Fields: `{}` (automatic numbering), `{0}` (position), `{name}` (map key)
//! - Escapes: `{{` and `}}`
//! - Spec after `:`: `[[fill]align][sign][#][0][width][,|_][.precision][type]`
//!   with types `s d f F e E % x X o b`

/// Compiled format pattern
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Field { field: Field, spec: FormatSpec },
}

/// Which argument a field refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Position(usize),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Minus,
    Plus,
    Space,
}

/// Format spec of a single field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Sign,
    pub alternate: bool,
    pub zero: bool,
    pub width: Option<usize>,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub ty: Option<char>,
}

const TYPES: &str = "sdfFeE%xXob";

#[derive(PartialEq)]
enum Numbering {
    Unknown,
    Automatic,
    Manual,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut numbering = Numbering::Unknown;
        let mut next_auto = 0;
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err("single '}' encountered in pattern".to_string()),
                '{' => {
                    let mut content = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err("nested fields are not supported".to_string());
                            }
                            Some(c) => content.push(c),
                            None => return Err("unclosed '{' in pattern".to_string()),
                        }
                    }
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }

                    let (name, spec) = match content.split_once(':') {
                        Some((name, spec)) => (name, spec),
                        None => (content.as_str(), ""),
                    };
                    let field = parse_field(name, &mut numbering, &mut next_auto)?;
                    let spec = FormatSpec::parse(spec)?;
                    pieces.push(Piece::Field { field, spec });
                }
                c => text.push(c),
            }
        }

        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        Ok(Self { pieces })
    }
}

fn parse_field(name: &str, numbering: &mut Numbering, next_auto: &mut usize) -> Result<Field, String> {
    if name.contains('!') {
        return Err(format!("conversion in field '{}' is not supported", name));
    }
    if name.contains('.') || name.contains('[') {
        return Err(format!(
            "attribute or index access in field '{}' is not supported",
            name
        ));
    }

    if name.is_empty() {
        if *numbering == Numbering::Manual {
            return Err("cannot switch from manual field numbering to automatic".to_string());
        }
        *numbering = Numbering::Automatic;
        let position = *next_auto;
        *next_auto += 1;
        return Ok(Field::Position(position));
    }

    if name.bytes().all(|b| b.is_ascii_digit()) {
        if *numbering == Numbering::Automatic {
            return Err("cannot switch from automatic field numbering to manual".to_string());
        }
        *numbering = Numbering::Manual;
        let position = name
            .parse()
            .map_err(|_| format!("field index '{}' is too large", name))?;
        return Ok(Field::Position(position));
    }

    Ok(Field::Name(name.to_string()))
}

fn is_align(c: char) -> bool {
    matches!(c, '<' | '>' | '^' | '=')
}

fn to_align(c: char) -> Align {
    match c {
        '<' => Align::Left,
        '>' => Align::Right,
        '^' => Align::Center,
        _ => Align::AfterSign,
    }
}

fn take_number(chars: &[char], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    chars[start..*pos].iter().collect::<String>().parse().ok()
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let chars: Vec<char> = spec.chars().collect();
        let mut result = FormatSpec::default();
        let mut pos = 0;

        if chars.len() >= 2 && is_align(chars[1]) {
            result.fill = Some(chars[0]);
            result.align = Some(to_align(chars[1]));
            pos = 2;
        } else if !chars.is_empty() && is_align(chars[0]) {
            result.align = Some(to_align(chars[0]));
            pos = 1;
        }

        match chars.get(pos) {
            Some('+') => {
                result.sign = Sign::Plus;
                pos += 1;
            }
            Some('-') => pos += 1,
            Some(' ') => {
                result.sign = Sign::Space;
                pos += 1;
            }
            _ => {}
        }

        if chars.get(pos) == Some(&'#') {
            result.alternate = true;
            pos += 1;
        }
        if chars.get(pos) == Some(&'0') {
            result.zero = true;
            pos += 1;
        }

        result.width = take_number(&chars, &mut pos);

        if let Some(&(c @ (',' | '_'))) = chars.get(pos) {
            result.grouping = Some(c);
            pos += 1;
        }

        if chars.get(pos) == Some(&'.') {
            pos += 1;
            result.precision = Some(
                take_number(&chars, &mut pos)
                    .ok_or_else(|| format!("format spec '{}' is missing a precision", spec))?,
            );
        }

        match &chars[pos..] {
            [] => {}
            [ty] if TYPES.contains(*ty) => result.ty = Some(*ty),
            _ => return Err(format!("invalid format spec '{}'", spec)),
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field: Field, spec: &str) -> Piece {
        Piece::Field {
            field,
            spec: FormatSpec::parse(spec).unwrap(),
        }
    }

    #[test]
    fn test_parse_named_fields() {
        let pattern = Pattern::parse("{name}-{index}").unwrap();
        assert_eq!(
            pattern.pieces,
            vec![
                field(Field::Name("name".into()), ""),
                Piece::Text("-".into()),
                field(Field::Name("index".into()), ""),
            ]
        );
    }

    #[test]
    fn test_parse_automatic_numbering() {
        let pattern = Pattern::parse("{} and {}").unwrap();
        assert_eq!(
            pattern.pieces,
            vec![
                field(Field::Position(0), ""),
                Piece::Text(" and ".into()),
                field(Field::Position(1), ""),
            ]
        );
    }

    #[test]
    fn test_parse_escaped_braces() {
        let pattern = Pattern::parse("{{literal}} {0}").unwrap();
        assert_eq!(pattern.pieces[0], Piece::Text("{literal} ".into()));
    }

    #[test]
    fn test_parse_spec() {
        let spec = FormatSpec::parse("*^+#010,.3f").unwrap();
        assert_eq!(spec.fill, Some('*'));
        assert_eq!(spec.align, Some(Align::Center));
        assert_eq!(spec.sign, Sign::Plus);
        assert!(spec.alternate);
        assert!(spec.zero);
        assert_eq!(spec.width, Some(10));
        assert_eq!(spec.grouping, Some(','));
        assert_eq!(spec.precision, Some(3));
        assert_eq!(spec.ty, Some('f'));
    }

    #[test]
    fn test_parse_precision_with_leading_zero() {
        let spec = FormatSpec::parse(".03f").unwrap();
        assert_eq!(spec.precision, Some(3));
        assert_eq!(spec.ty, Some('f'));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Pattern::parse("{unclosed").is_err());
        assert!(Pattern::parse("stray }").is_err());
        assert!(Pattern::parse("{} {0}").is_err());
        assert!(Pattern::parse("{0} {}").is_err());
        assert!(Pattern::parse("{a.b}").is_err());
        assert!(Pattern::parse("{a!r}").is_err());
        assert!(Pattern::parse("{:.}").is_err());
        assert!(Pattern::parse("{:q}").is_err());
    }
}
