//! AST serialization to and from JSON text
//!
//! Only trees up to [`MAX_DEPTH`] levels are written or read, which keeps every
//! accepted document well inside serde_json's recursion limit.

use crate::condition::ast::{Comparator, Connective, Literal, Node, MAX_DEPTH};
use crate::error::{Result, RuleEngineError};
use serde::Deserialize;

fn check_depth(node: &Node) -> Result<()> {
    let depth = node.depth();
    if depth > MAX_DEPTH {
        return Err(RuleEngineError::InvalidAst(format!(
            "AST depth {} exceeds the limit of {}",
            depth, MAX_DEPTH
        )));
    }
    Ok(())
}

/// Serialize an AST to JSON text
pub fn serialize(node: &Node) -> Result<String> {
    check_depth(node)?;
    serde_json::to_string(node)
        .map_err(|e| RuleEngineError::CorruptAst(format!("Failed to serialize AST: {}", e)))
}

/// Serialize an AST to a JSON value
pub fn to_value(node: &Node) -> Result<serde_json::Value> {
    check_depth(node)?;
    serde_json::to_value(node)
        .map_err(|e| RuleEngineError::CorruptAst(format!("Failed to serialize AST: {}", e)))
}

/// Rebuild an AST from JSON text produced by [`serialize`]
pub fn deserialize(text: &str) -> Result<Node> {
    let raw: RawNode = serde_json::from_str(text)
        .map_err(|e| RuleEngineError::CorruptAst(format!("Unreadable AST: {}", e)))?;
    Node::try_from(raw)
}

/// Rebuild an AST from a JSON value
pub fn from_value(value: serde_json::Value) -> Result<Node> {
    let raw: RawNode = serde_json::from_value(value)
        .map_err(|e| RuleEngineError::CorruptAst(format!("Unreadable AST: {}", e)))?;
    Node::try_from(raw)
}

/// Loosely typed node; shape is checked in `TryFrom`
#[derive(Debug, Deserialize)]
struct RawNode {
    kind: Option<String>,
    field: Option<String>,
    operator: Option<String>,
    literal: Option<serde_json::Value>,
    connective: Option<String>,
    left: Option<Box<RawNode>>,
    right: Option<Box<RawNode>>,
}

impl TryFrom<RawNode> for Node {
    type Error = RuleEngineError;

    fn try_from(raw: RawNode) -> Result<Self> {
        decode(raw, 1)
    }
}

fn decode(raw: RawNode, depth: usize) -> Result<Node> {
    if depth > MAX_DEPTH {
        return Err(RuleEngineError::CorruptAst(format!(
            "AST nests deeper than {} levels",
            MAX_DEPTH
        )));
    }
    match raw.kind.as_deref() {
        Some("operand") => decode_operand(raw),
        Some("operator") => decode_operator(raw, depth),
        Some(other) => Err(RuleEngineError::CorruptAst(format!(
            "Unrecognized node kind: {}",
            other
        ))),
        None => Err(RuleEngineError::CorruptAst(
            "Missing node kind".to_string(),
        )),
    }
}

fn missing(kind: &str, key: &str) -> RuleEngineError {
    RuleEngineError::CorruptAst(format!("{} node is missing '{}'", kind, key))
}

fn decode_operand(raw: RawNode) -> Result<Node> {
    let field = raw.field.ok_or_else(|| missing("operand", "field"))?;
    if field.is_empty() {
        return Err(RuleEngineError::CorruptAst(
            "operand node has an empty field".to_string(),
        ));
    }

    let symbol = raw.operator.ok_or_else(|| missing("operand", "operator"))?;
    let operator = Comparator::from_symbol(&symbol).ok_or_else(|| {
        RuleEngineError::InvalidAst(format!("Unknown comparator '{}' on '{}'", symbol, field))
    })?;

    let literal = match raw.literal.ok_or_else(|| missing("operand", "literal"))? {
        serde_json::Value::String(s) => Literal::String(s),
        serde_json::Value::Number(n) => n.as_i64().map(Literal::Integer).ok_or_else(|| {
            RuleEngineError::CorruptAst(format!("Literal {} on '{}' is not an integer", n, field))
        })?,
        other => {
            return Err(RuleEngineError::CorruptAst(format!(
                "Literal on '{}' must be an integer or string, got {}",
                field, other
            )))
        }
    };

    if matches!(operator, Comparator::Greater | Comparator::Less)
        && matches!(literal, Literal::String(_))
    {
        return Err(RuleEngineError::InvalidLiteral(format!(
            "'{}' on '{}' requires an integer literal, got {}",
            operator, field, literal
        )));
    }

    Ok(Node::operand(field, operator, literal))
}

fn decode_operator(raw: RawNode, depth: usize) -> Result<Node> {
    let word = raw.connective.ok_or_else(|| missing("operator", "connective"))?;
    let connective = Connective::from_keyword(&word)
        .ok_or_else(|| RuleEngineError::InvalidAst(format!("Unknown connective '{}'", word)))?;

    let left = raw.left.ok_or_else(|| missing("operator", "left"))?;
    let right = raw.right.ok_or_else(|| missing("operator", "right"))?;

    Ok(Node::Operator {
        connective,
        left: Box::new(decode(*left, depth + 1)?),
        right: Box::new(decode(*right, depth + 1)?),
    })
}
