//! Rule evaluator

use crate::condition::ast::{Comparator, Comparison, Connective, Literal, Node, MAX_DEPTH};
use crate::condition::record::{Record, Value};
use crate::error::{Result, RuleEngineError};

/// Evaluate an AST against a record
///
/// Both children of an operator node are always evaluated, so an error on
/// either side surfaces regardless of the other side's value. Trees deeper
/// than [`MAX_DEPTH`] fail with `InvalidAst`.
pub fn evaluate(node: &Node, record: &Record) -> Result<bool> {
    let depth = node.depth();
    if depth > MAX_DEPTH {
        return Err(RuleEngineError::InvalidAst(format!(
            "AST depth {} exceeds the limit of {}",
            depth, MAX_DEPTH
        )));
    }
    evaluate_node(node, record)
}

fn evaluate_node(node: &Node, record: &Record) -> Result<bool> {
    match node {
        Node::Operand(cmp) => evaluate_comparison(cmp, record),
        Node::Operator {
            connective,
            left,
            right,
        } => {
            let left = evaluate_node(left, record)?;
            let right = evaluate_node(right, record)?;
            Ok(match connective {
                Connective::And => left && right,
                Connective::Or => left || right,
            })
        }
    }
}

fn evaluate_comparison(cmp: &Comparison, record: &Record) -> Result<bool> {
    let value = record
        .get(&cmp.field)
        .ok_or_else(|| RuleEngineError::MissingField(cmp.field.clone()))?;

    match cmp.operator {
        Comparator::Greater | Comparator::Less => {
            let Literal::Integer(threshold) = &cmp.literal else {
                return Err(RuleEngineError::InvalidAst(format!(
                    "'{}' on field '{}' has a non-integer literal",
                    cmp.operator, cmp.field
                )));
            };
            let actual = value.as_integer().ok_or_else(|| RuleEngineError::TypeMismatch {
                field: cmp.field.clone(),
                expected: "integer",
                actual: value.type_name().to_string(),
            })?;

            Ok(match cmp.operator {
                Comparator::Greater => actual > *threshold,
                _ => actual < *threshold,
            })
        }
        Comparator::Equal => Ok(match (value, &cmp.literal) {
            (Value::Integer(v), Literal::Integer(l)) => v == l,
            (Value::String(v), Literal::String(l)) => v == l,
            // Mixed kinds never compare equal
            _ => false,
        }),
    }
}
