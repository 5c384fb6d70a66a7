//! Rule expression parser
//!
//! Recursive descent over the token list:
//!
//! ```text
//! expr    := term (OR term)*
//! term    := factor (AND factor)*
//! factor  := '(' expr ')' | atom
//! atom    := field comparator literal
//! ```
//!
//! Both connectives are left-associative and AND binds tighter than OR.
//! Trees deeper than [`MAX_DEPTH`] are rejected as malformed.

use crate::condition::ast::{Comparator, Literal, Node, MAX_DEPTH};
use crate::condition::tokenizer::{tokenize, Token};
use crate::error::{Result, RuleEngineError};
use once_cell::sync::Lazy;
use regex::Regex;

static COMPARISON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<field>[A-Za-z_][A-Za-z0-9_.]*)\s*(?P<op>[<>=])\s*(?P<literal>.*)$")
        .expect("comparison pattern is valid")
});

/// Parse a rule expression into an AST
pub fn parse(expression: &str) -> Result<Node> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(RuleEngineError::MalformedExpression(
            "Empty expression".to_string(),
        ));
    }

    let tokens = tokenize(expression)?;
    parse_tokens(&tokens)
}

/// Parse an already tokenized expression
pub fn parse_tokens(tokens: &[Token]) -> Result<Node> {
    if tokens.is_empty() {
        return Err(RuleEngineError::MalformedExpression(
            "Empty token list".to_string(),
        ));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let (node, _) = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(RuleEngineError::MalformedExpression(format!(
            "Unexpected {} at token {}",
            token, parser.pos
        )));
    }

    Ok(node)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<(Node, usize)> {
        let (mut node, mut depth) = self.term()?;
        while let Some(Token::Or) = self.peek() {
            self.pos += 1;
            let (right, right_depth) = self.term()?;
            depth = join_depth(depth, right_depth)?;
            node = Node::or(node, right);
        }
        Ok((node, depth))
    }

    fn term(&mut self) -> Result<(Node, usize)> {
        let (mut node, mut depth) = self.factor()?;
        while let Some(Token::And) = self.peek() {
            self.pos += 1;
            let (right, right_depth) = self.factor()?;
            depth = join_depth(depth, right_depth)?;
            node = Node::and(node, right);
        }
        Ok((node, depth))
    }

    fn factor(&mut self) -> Result<(Node, usize)> {
        match self.next() {
            Some(Token::OpenParen) => {
                if let Some(Token::CloseParen) = self.peek() {
                    return Err(RuleEngineError::MalformedExpression(
                        "Empty parenthesis group".to_string(),
                    ));
                }
                let group = self.expr()?;
                match self.next() {
                    Some(Token::CloseParen) => Ok(group),
                    Some(token) => Err(RuleEngineError::MalformedExpression(format!(
                        "Expected ')' but found {}",
                        token
                    ))),
                    None => Err(RuleEngineError::MalformedExpression(
                        "Missing ')'".to_string(),
                    )),
                }
            }
            Some(Token::Atom(text)) => Ok((parse_comparison(text)?, 1)),
            Some(token) => Err(RuleEngineError::MalformedExpression(format!(
                "Expected a condition but found {}",
                token
            ))),
            None => Err(RuleEngineError::MalformedExpression(
                "Expression ends where a condition was expected".to_string(),
            )),
        }
    }
}

/// Depth of a connective over two sub-trees, bounded by [`MAX_DEPTH`]
fn join_depth(left: usize, right: usize) -> Result<usize> {
    let depth = left.max(right) + 1;
    if depth > MAX_DEPTH {
        return Err(RuleEngineError::MalformedExpression(format!(
            "Expression nests deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(depth)
}

/// Decompose a single condition atom like `age > 30` into an operand node
pub fn parse_comparison(atom: &str) -> Result<Node> {
    let atom = atom.trim();
    let caps = COMPARISON_RE.captures(atom).ok_or_else(|| {
        RuleEngineError::MalformedExpression(format!(
            "Expected 'field comparator literal' in: {}",
            atom
        ))
    })?;

    let field = &caps["field"];
    let operator = Comparator::from_symbol(&caps["op"]).ok_or_else(|| {
        RuleEngineError::MalformedExpression(format!("Unknown comparator in: {}", atom))
    })?;
    let literal_text = caps["literal"].trim();

    if literal_text.is_empty() {
        return Err(RuleEngineError::MalformedExpression(format!(
            "Missing literal in: {}",
            atom
        )));
    }
    if literal_text.starts_with(['<', '>', '=']) {
        return Err(RuleEngineError::MalformedExpression(format!(
            "Unsupported comparator in: {}",
            atom
        )));
    }

    let literal = parse_literal(literal_text, operator, atom)?;
    Ok(Node::operand(field, operator, literal))
}

fn parse_literal(text: &str, operator: Comparator, atom: &str) -> Result<Literal> {
    let quoted = unquote(text, atom)?;

    match operator {
        Comparator::Greater | Comparator::Less => {
            let digits = quoted.unwrap_or(text);
            digits
                .trim()
                .parse::<i64>()
                .map(Literal::Integer)
                .map_err(|_| {
                    RuleEngineError::InvalidLiteral(format!(
                        "'{}' requires an integer literal, got {} in: {}",
                        operator, text, atom
                    ))
                })
        }
        Comparator::Equal => match quoted {
            Some(inner) => Ok(Literal::String(inner.to_string())),
            None => Ok(text
                .parse::<i64>()
                .map(Literal::Integer)
                .unwrap_or_else(|_| Literal::String(text.to_string()))),
        },
    }
}

/// Strip surrounding quotes. Returns `None` for bare literals.
fn unquote<'t>(text: &'t str, atom: &str) -> Result<Option<&'t str>> {
    let Some(q) = text.chars().next().filter(|c| *c == '\'' || *c == '"') else {
        if text.chars().any(char::is_whitespace) {
            return Err(RuleEngineError::MalformedExpression(format!(
                "Unexpected text after literal in: {}",
                atom
            )));
        }
        return Ok(None);
    };

    let inner = &text[1..];
    match inner.find(q) {
        Some(end) if end + 1 == inner.len() => Ok(Some(&inner[..end])),
        _ => Err(RuleEngineError::MalformedExpression(format!(
            "Unexpected text after string literal in: {}",
            atom
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ast::{Comparison, Connective};

    fn operand(field: &str, operator: Comparator, literal: Literal) -> Node {
        Node::operand(field, operator, literal)
    }

    #[test]
    fn test_parse_simple_condition() {
        let ast = parse("age > 30").unwrap();
        match ast {
            Node::Operand(Comparison {
                field,
                operator,
                literal,
            }) => {
                assert_eq!(field, "age");
                assert_eq!(operator, Comparator::Greater);
                assert_eq!(literal, Literal::Integer(30));
            }
            _ => panic!("Expected operand"),
        }
    }

    #[test]
    fn test_parse_string_literal_strips_quotes() {
        assert_eq!(
            parse("department = 'Sales'").unwrap(),
            operand("department", Comparator::Equal, Literal::String("Sales".into()))
        );
        assert_eq!(
            parse("department = \"Sales\"").unwrap(),
            operand("department", Comparator::Equal, Literal::String("Sales".into()))
        );
    }

    #[test]
    fn test_parse_equality_literals() {
        assert_eq!(
            parse("level = 3").unwrap(),
            operand("level", Comparator::Equal, Literal::Integer(3))
        );
        assert_eq!(
            parse("city = Delhi").unwrap(),
            operand("city", Comparator::Equal, Literal::String("Delhi".into()))
        );
        assert_eq!(
            parse("code = '42'").unwrap(),
            operand("code", Comparator::Equal, Literal::String("42".into()))
        );
    }

    #[test]
    fn test_parse_without_spaces() {
        assert_eq!(
            parse("age>30").unwrap(),
            operand("age", Comparator::Greater, Literal::Integer(30))
        );
        assert_eq!(
            parse("temp<-5").unwrap(),
            operand("temp", Comparator::Less, Literal::Integer(-5))
        );
    }

    #[test]
    fn test_parse_and_condition() {
        let ast = parse("age > 30 AND department = 'Sales'").unwrap();
        match ast {
            Node::Operator {
                connective: Connective::And,
                ..
            } => {}
            _ => panic!("Expected AND node"),
        }
    }

    #[test]
    fn test_parse_operator_precedence() {
        let ast =
            parse("age > 30 and department = 'Sales' or age < 25 and department = 'Marketing'")
                .unwrap();

        let expected = Node::or(
            Node::and(
                operand("age", Comparator::Greater, Literal::Integer(30)),
                operand("department", Comparator::Equal, Literal::String("Sales".into())),
            ),
            Node::and(
                operand("age", Comparator::Less, Literal::Integer(25)),
                operand(
                    "department",
                    Comparator::Equal,
                    Literal::String("Marketing".into()),
                ),
            ),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_parse_or_then_and_binds_right() {
        // A or B and C == A or (B and C)
        let ast = parse("a > 1 or b > 2 and c > 3").unwrap();
        match ast {
            Node::Operator {
                connective: Connective::Or,
                right,
                ..
            } => match *right {
                Node::Operator {
                    connective: Connective::And,
                    ..
                } => {}
                _ => panic!("Expected AND on right side of OR"),
            },
            _ => panic!("Expected OR node"),
        }
    }

    #[test]
    fn test_parse_left_associative() {
        let ast = parse("a > 1 or b > 2 or c > 3").unwrap();
        let a = operand("a", Comparator::Greater, Literal::Integer(1));
        let b = operand("b", Comparator::Greater, Literal::Integer(2));
        let c = operand("c", Comparator::Greater, Literal::Integer(3));
        assert_eq!(ast, Node::or(Node::or(a, b), c));
    }

    #[test]
    fn test_parse_nested_parentheses() {
        let ast = parse("(a > 1 or b > 2) and c = 'x'").unwrap();
        match ast {
            Node::Operator {
                connective: Connective::And,
                left,
                ..
            } => match *left {
                Node::Operator {
                    connective: Connective::Or,
                    ..
                } => {}
                _ => panic!("Expected OR inside AND"),
            },
            _ => panic!("Expected AND node"),
        }
    }

    #[test]
    fn test_parse_redundant_parentheses() {
        assert_eq!(parse("((age > 30))").unwrap(), parse("age > 30").unwrap());
    }

    #[test]
    fn test_parse_keeps_every_atom() {
        let rule = "((age > 30 AND department = 'Sales') OR (age < 25 AND department = 'Marketing')) AND (salary > 50000 OR experience > 5)";
        let ast = parse(rule).unwrap();
        assert_eq!(ast.operand_count(), 6);
        assert_eq!(
            ast.fields(),
            vec!["age", "department", "age", "department", "salary", "experience"]
        );
    }

    #[test]
    fn test_malformed_expressions() {
        let cases = [
            "",
            "   ",
            "age > AND 30",
            "age > 30 AND",
            "OR age > 30",
            "age > 30 AND AND b > 1",
            "()",
            "age > 30 AND ()",
            "(age > 30) (b > 2)",
            "age > 30 department = 'Sales'",
            "age",
            "> 30",
            "age >= 30",
            "name = 'x' extra",
            "(age > 30",
        ];

        for input in cases {
            match parse(input) {
                Err(RuleEngineError::MalformedExpression(_)) => {}
                other => panic!("Expected MalformedExpression for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_invalid_numeric_literal() {
        for input in ["age > thirty", "age < 'abc'", "age > 3.5"] {
            match parse(input) {
                Err(RuleEngineError::InvalidLiteral(_)) => {}
                other => panic!("Expected InvalidLiteral for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_quoted_numeric_literal_for_ordering() {
        assert_eq!(
            parse("age > '30'").unwrap(),
            operand("age", Comparator::Greater, Literal::Integer(30))
        );
    }

    #[test]
    fn test_display_reparses_to_same_tree() {
        let rule = "a > 1 and (b = 'x y' or c < -2) or d = 7";
        let ast = parse(rule).unwrap();
        assert_eq!(parse(&ast.to_string()).unwrap(), ast);
    }

    fn and_chain(atoms: usize) -> String {
        (0..atoms)
            .map(|i| format!("x{} > 0", i))
            .collect::<Vec<_>>()
            .join(" and ")
    }

    #[test]
    fn test_parse_depth_limit() {
        // n atoms joined left-deep give a tree of depth n
        let ast = parse(&and_chain(MAX_DEPTH)).unwrap();
        assert_eq!(ast.depth(), MAX_DEPTH);
        assert_eq!(ast.operand_count(), MAX_DEPTH);

        match parse(&and_chain(MAX_DEPTH + 1)) {
            Err(RuleEngineError::MalformedExpression(_)) => {}
            other => panic!("Expected MalformedExpression, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_very_long_chain_fails_cleanly() {
        assert!(matches!(
            parse(&and_chain(50_000)),
            Err(RuleEngineError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_parse_deep_right_nesting_is_limited() {
        let nested = |levels: usize| {
            format!(
                "{}z > 0{}",
                "a > 0 and (".repeat(levels),
                ")".repeat(levels)
            )
        };
        assert_eq!(parse(&nested(MAX_DEPTH - 1)).unwrap().depth(), MAX_DEPTH);
        assert!(matches!(
            parse(&nested(MAX_DEPTH)),
            Err(RuleEngineError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_parse_dotted_fields_named_like_keywords() {
        let ast = parse("user.or > 1 and user.and = 'x'").unwrap();
        assert_eq!(
            ast,
            Node::and(
                operand("user.or", Comparator::Greater, Literal::Integer(1)),
                operand("user.and", Comparator::Equal, Literal::String("x".into())),
            )
        );
    }

    #[test]
    fn test_display_of_quoted_literals() {
        let apostrophe = operand("name", Comparator::Equal, Literal::String("it's".into()));
        assert_eq!(apostrophe.to_string(), "name = \"it's\"");
        assert_eq!(parse(&apostrophe.to_string()).unwrap(), apostrophe);

        let double = operand("name", Comparator::Equal, Literal::String("say \"hi\"".into()));
        assert_eq!(parse(&double.to_string()).unwrap(), double);

        // No quoting holds both kinds of quote
        let both = operand("name", Comparator::Equal, Literal::String("it's \"x\"".into()));
        assert!(parse(&both.to_string()).is_err());
    }
}
