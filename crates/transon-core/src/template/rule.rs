//! Rule vocabulary: the closed set of operations a template can contain

use super::{Node, Pattern, TemplatePath};
use std::fmt;

/// Name of a rule, as written after the marker key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    This,
    Parent,
    Item,
    Index,
    Key,
    Value,
    Set,
    Get,
    Attr,
    Object,
    Map,
    Zip,
    Join,
    Chain,
    Expr,
    Convert,
    Format,
    Default,
    Omit,
    If,
    Include,
    Literal,
}

impl RuleKind {
    /// Every rule, in documentation order
    pub const ALL: [RuleKind; 22] = [
        RuleKind::This,
        RuleKind::Parent,
        RuleKind::Item,
        RuleKind::Index,
        RuleKind::Key,
        RuleKind::Value,
        RuleKind::Set,
        RuleKind::Get,
        RuleKind::Attr,
        RuleKind::Object,
        RuleKind::Map,
        RuleKind::Zip,
        RuleKind::Join,
        RuleKind::Chain,
        RuleKind::Expr,
        RuleKind::Convert,
        RuleKind::Format,
        RuleKind::Default,
        RuleKind::Omit,
        RuleKind::If,
        RuleKind::Include,
        RuleKind::Literal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::This => "this",
            RuleKind::Parent => "parent",
            RuleKind::Item => "item",
            RuleKind::Index => "index",
            RuleKind::Key => "key",
            RuleKind::Value => "value",
            RuleKind::Set => "set",
            RuleKind::Get => "get",
            RuleKind::Attr => "attr",
            RuleKind::Object => "object",
            RuleKind::Map => "map",
            RuleKind::Zip => "zip",
            RuleKind::Join => "join",
            RuleKind::Chain => "chain",
            RuleKind::Expr => "expr",
            RuleKind::Convert => "convert",
            RuleKind::Format => "format",
            RuleKind::Default => "default",
            RuleKind::Omit => "omit",
            RuleKind::If => "if",
            RuleKind::Include => "include",
            RuleKind::Literal => "literal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Parameters the rule accepts next to the marker key
    pub fn params(self) -> &'static [&'static str] {
        match self {
            RuleKind::This
            | RuleKind::Parent
            | RuleKind::Item
            | RuleKind::Index
            | RuleKind::Key
            | RuleKind::Value
            | RuleKind::Omit => &[],
            RuleKind::Set => &["name", "value"],
            RuleKind::Get => &["name"],
            RuleKind::Attr => &["name", "names", "default"],
            RuleKind::Object => &["key", "value"],
            RuleKind::Map => &["item", "items", "key", "value"],
            RuleKind::Zip => &["items"],
            RuleKind::Join => &["items", "sep"],
            RuleKind::Chain => &["funcs"],
            RuleKind::Expr => &["op", "value", "values"],
            RuleKind::Convert => &["name", "value", "values"],
            RuleKind::Format => &["pattern", "value"],
            RuleKind::Default => &["value", "fallback"],
            RuleKind::If => &["cond", "then", "else"],
            RuleKind::Include => &["name", "value"],
            RuleKind::Literal => &["value"],
        }
    }

    /// One-line description for rule listings
    pub fn summary(self) -> &'static str {
        match self {
            RuleKind::This => "Current context value.",
            RuleKind::Parent => "Value of the enclosing context.",
            RuleKind::Item => "Current element inside `map`.",
            RuleKind::Index => "0-based iteration index inside `map`.",
            RuleKind::Key => "Current key while `map` iterates a map.",
            RuleKind::Value => "Current value while `map` iterates a map.",
            RuleKind::Set => "Store a variable visible to all nested contexts.",
            RuleKind::Get => "Read a variable; no content when it is not set.",
            RuleKind::Attr => "Navigate into the current value by key, index or path.",
            RuleKind::Object => "Build a single-entry map from a dynamic key and value.",
            RuleKind::Map => "Evaluate a template for every element of a list or map.",
            RuleKind::Zip => "Combine lists element-wise into a list of tuples.",
            RuleKind::Join => "Merge maps, concatenate lists or join strings.",
            RuleKind::Chain => "Feed each template's result into the next one.",
            RuleKind::Expr => "Apply an arithmetic, comparison or logical operator.",
            RuleKind::Convert => "Convert a value with a named converter.",
            RuleKind::Format => "Render values into a string pattern.",
            RuleKind::Default => "Fall back when a value is missing or has no content.",
            RuleKind::Omit => "Produce no content.",
            RuleKind::If => "Choose a branch by a boolean condition.",
            RuleKind::Include => "Evaluate a named template from the loader.",
            RuleKind::Literal => "Emit a value verbatim without looking for rules.",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiled rule together with its location in the template
#[derive(Debug, Clone)]
pub struct Rule {
    pub path: TemplatePath,
    pub op: RuleOp,
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        self.op.kind()
    }
}

/// Operation of a rule with its compiled operands
#[derive(Debug, Clone)]
pub enum RuleOp {
    This,
    Parent,
    Item,
    Index,
    Key,
    Value,
    Set { name: Node, value: Option<Node> },
    Get { name: Node },
    Attr { target: AttrTarget, default: Option<Node> },
    Object { key: Node, value: Node },
    Map(MapBody),
    Zip { items: Node },
    Join { items: Node, sep: Option<Node> },
    Chain { funcs: Vec<Node> },
    Expr { op: Operator, operands: Operands },
    Convert { converter: Converter, operands: Operands },
    Format { pattern: Pattern, value: Option<Node> },
    Default { value: Node, fallback: Node },
    Omit,
    If { cond: Node, then: Node, otherwise: Option<Node> },
    Include { name: Node, value: Option<Node> },
    Literal(serde_json::Value),
}

impl RuleOp {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleOp::This => RuleKind::This,
            RuleOp::Parent => RuleKind::Parent,
            RuleOp::Item => RuleKind::Item,
            RuleOp::Index => RuleKind::Index,
            RuleOp::Key => RuleKind::Key,
            RuleOp::Value => RuleKind::Value,
            RuleOp::Set { .. } => RuleKind::Set,
            RuleOp::Get { .. } => RuleKind::Get,
            RuleOp::Attr { .. } => RuleKind::Attr,
            RuleOp::Object { .. } => RuleKind::Object,
            RuleOp::Map(_) => RuleKind::Map,
            RuleOp::Zip { .. } => RuleKind::Zip,
            RuleOp::Join { .. } => RuleKind::Join,
            RuleOp::Chain { .. } => RuleKind::Chain,
            RuleOp::Expr { .. } => RuleKind::Expr,
            RuleOp::Convert { .. } => RuleKind::Convert,
            RuleOp::Format { .. } => RuleKind::Format,
            RuleOp::Default { .. } => RuleKind::Default,
            RuleOp::Omit => RuleKind::Omit,
            RuleOp::If { .. } => RuleKind::If,
            RuleOp::Include { .. } => RuleKind::Include,
            RuleOp::Literal(_) => RuleKind::Literal,
        }
    }
}

/// What `attr` navigates by
#[derive(Debug, Clone)]
pub enum AttrTarget {
    /// Single key or index
    Name(Node),
    /// List of keys and indices applied in order
    Names(Node),
}

/// Body of a `map` rule
#[derive(Debug, Clone)]
pub enum MapBody {
    /// One output element per input element
    Item(Node),
    /// Each input element contributes a list of output elements
    Items(Node),
    /// Output is a map built from evaluated keys and values
    Entries { key: Node, value: Node },
}

/// Operand form shared by `expr` and `convert`
#[derive(Debug, Clone)]
pub enum Operands {
    /// The current context value
    Current,
    /// Current value combined with one more operand
    Value(Node),
    /// Operand list evaluated from a template
    Values(Node),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    In,
}

impl Operator {
    pub fn parse(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "//" => Operator::FloorDiv,
            "%" => Operator::Mod,
            "**" => Operator::Pow,
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "and" | "&&" => Operator::And,
            "or" | "||" => Operator::Or,
            "not" | "!" => Operator::Not,
            "in" => Operator::In,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::FloorDiv => "//",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::In => "in",
        }
    }

    /// Whether the operator can be applied to a single operand
    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Not | Operator::Sub)
    }

    /// Whether the operator can combine two operands
    pub fn is_binary(self) -> bool {
        !matches!(self, Operator::Not)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Str,
    Int,
    Float,
    Bool,
    Json,
    Parse,
}

impl Converter {
    pub fn parse(name: &str) -> Option<Self> {
        let converter = match name {
            "str" => Converter::Str,
            "int" => Converter::Int,
            "float" => Converter::Float,
            "bool" => Converter::Bool,
            "json" => Converter::Json,
            "parse" => Converter::Parse,
            _ => return None,
        };
        Some(converter)
    }

    pub fn name(self) -> &'static str {
        match self {
            Converter::Str => "str",
            Converter::Int => "int",
            Converter::Float => "float",
            Converter::Bool => "bool",
            Converter::Json => "json",
            Converter::Parse => "parse",
        }
    }
}
