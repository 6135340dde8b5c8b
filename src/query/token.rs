// Query tokens and the operator priority table

use std::fmt;

/// A lexical token of a query string.
///
/// Tokens are plain strings; whether a token is an operator, a grouping mark,
/// a literal or a column reference is decided when it is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Token(text.into())
    }

    /// Build a quoted literal token from a raw value.
    pub fn literal(value: &str) -> Self {
        Token(format!("'{}'", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn to_uppercase(&self) -> Token {
        Token(self.0.to_uppercase())
    }

    pub fn is_left_paren(&self) -> bool {
        self.0 == "("
    }

    pub fn is_right_paren(&self) -> bool {
        self.0 == ")"
    }

    pub fn is_grouping(&self) -> bool {
        self.is_left_paren() || self.is_right_paren()
    }

    /// Check if the token is a quoted literal such as `'Asia'`
    pub fn is_literal(&self) -> bool {
        self.0.starts_with('\'')
    }

    /// Classify the token as an operator, if it is one
    pub fn operator(&self) -> Option<Operator> {
        Operator::from_symbol(&self.0)
    }

    /// Check if the token is a plain operand (identifier or literal)
    pub fn is_operand(&self) -> bool {
        !self.is_grouping() && self.operator().is_none()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(text: &str) -> Self {
        Token::new(text)
    }
}

impl From<String> for Token {
    fn from(text: String) -> Self {
        Token(text)
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Operators recognized by the query engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Comparison
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Logical
    And,
    Or,
    Not,

    // Arithmetic (parsed, never evaluated)
    Plus,
    Minus,
    Star,
    Slash,
    Div,
    Mod,
}

impl Operator {
    /// Convert a string to an operator if it matches.
    ///
    /// Word operators match case-insensitively.
    pub fn from_symbol(s: &str) -> Option<Operator> {
        let op = match s {
            "=" => Operator::Eq,
            "<>" | "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::LtEq,
            ">=" => Operator::GtEq,
            "!" => Operator::Not,
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Star,
            "/" => Operator::Slash,
            _ => match s.to_uppercase().as_str() {
                "AND" => Operator::And,
                "OR" => Operator::Or,
                "NOT" => Operator::Not,
                "DIV" => Operator::Div,
                "MOD" => Operator::Mod,
                _ => return None,
            },
        };
        Some(op)
    }

    /// Precedence rank used by the infix to postfix conversion.
    ///
    /// Grouping marks rank 1 (see [`GROUPING_PRIORITY`]). `OR` binds tighter
    /// than `AND` here, and comparisons bind tightest.
    pub fn priority(&self) -> u8 {
        match self {
            Operator::Plus | Operator::Minus | Operator::Not => 2,
            Operator::Star | Operator::Slash | Operator::Div | Operator::Mod | Operator::And => 3,
            Operator::Or => 4,
            Operator::Eq
            | Operator::NotEq
            | Operator::Lt
            | Operator::Gt
            | Operator::LtEq
            | Operator::GtEq => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.priority() == 5
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Div => "DIV",
            Operator::Mod => "MOD",
        }
    }
}

/// Rank of `(` and `)` in the priority table
pub const GROUPING_PRIORITY: u8 = 1;

/// Look up the priority of any token; operands rank 0.
pub fn priority(token: &Token) -> u8 {
    if token.is_grouping() {
        return GROUPING_PRIORITY;
    }
    token.operator().map_or(0, |op| op.priority())
}
