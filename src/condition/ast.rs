//! Abstract Syntax Tree for rule expressions

use serde::Serialize;
use std::fmt;

/// Deepest tree the engine accepts, counted in nodes from root to leaf.
///
/// The parser rejects deeper expressions, the codec rejects deeper documents,
/// and serialization/evaluation reject deeper hand-built trees, so every tree
/// that serializes also deserializes and recursion stays bounded.
pub const MAX_DEPTH: usize = 100;

/// AST node for rule expressions
///
/// Serializes with an explicit `kind` discriminator:
/// `{"kind":"operand","field":..,"operator":..,"literal":..}` or
/// `{"kind":"operator","connective":..,"left":..,"right":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// Leaf comparison like "age > 30"
    Operand(Comparison),
    /// Logical connective joining two sub-trees
    Operator {
        connective: Connective,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Build an operand leaf
    pub fn operand(field: impl Into<String>, operator: Comparator, literal: Literal) -> Self {
        Node::Operand(Comparison {
            field: field.into(),
            operator,
            literal,
        })
    }

    /// Build an AND node
    pub fn and(left: Node, right: Node) -> Self {
        Node::Operator {
            connective: Connective::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build an OR node
    pub fn or(left: Node, right: Node) -> Self {
        Node::Operator {
            connective: Connective::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of operand leaves in the tree
    pub fn operand_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Operand(_) => count += 1,
                Node::Operator { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        count
    }

    /// Number of nodes on the longest root-to-leaf path (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            if let Node::Operator { left, right, .. } = node {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
        max
    }

    /// Field names referenced by the tree, in left-to-right order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Operand(cmp) => out.push(cmp.field.as_str()),
                Node::Operator { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out
    }
}

/// Renders the tree fully parenthesized, e.g. `((age > 30 AND dept = 'Sales') OR x < 1)`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operand(cmp) => write!(f, "{}", cmp),
            Node::Operator {
                connective,
                left,
                right,
            } => write!(f, "({} {} {})", left, connective, right),
        }
    }
}

/// Single comparison predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub field: String,
    pub operator: Comparator,
    pub literal: Literal,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.literal)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparator {
    /// Greater than (>)
    #[serde(rename = ">")]
    Greater,
    /// Less than (<)
    #[serde(rename = "<")]
    Less,
    /// Equal (=)
    #[serde(rename = "=")]
    Equal,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::Equal => "=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Comparator::Greater),
            "<" => Some(Comparator::Less),
            "=" => Some(Comparator::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }

    /// Case-insensitive keyword lookup
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Connective::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Connective::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal on the right-hand side of a comparison.
///
/// String literals are stored with their surrounding quotes stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    String(String),
}

/// Strings are single-quoted, or double-quoted when they contain `'`. A string
/// holding both quote characters has no quoted form the parser accepts, so
/// its rendering does not parse back.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}
