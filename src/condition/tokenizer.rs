//! Expression tokenizer
//!
//! Splits raw rule text into parentheses, `AND`/`OR` connectives and condition
//! atoms. Connective keywords are matched case-insensitively on word
//! boundaries and never inside a quoted literal.

use crate::condition::ast::MAX_DEPTH;
use crate::error::{Result, RuleEngineError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Comparison text between connectives/parentheses, trimmed
    Atom(String),
    And,
    Or,
    OpenParen,
    CloseParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Atom(text) => write!(f, "condition '{}'", text),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
        }
    }
}

pub fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut paren_depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '(' => {
                flush_atom(&mut current, &mut tokens);
                tokens.push(Token::OpenParen);
                paren_depth += 1;
                if paren_depth > MAX_DEPTH {
                    return Err(RuleEngineError::MalformedExpression(format!(
                        "Parentheses nest deeper than {} levels at offset {}",
                        MAX_DEPTH, i
                    )));
                }
            }
            ')' => {
                if paren_depth == 0 {
                    return Err(RuleEngineError::MalformedExpression(format!(
                        "Unbalanced parentheses: unexpected ')' at offset {}",
                        i
                    )));
                }
                flush_atom(&mut current, &mut tokens);
                tokens.push(Token::CloseParen);
                paren_depth -= 1;
            }
            _ => {
                if let Some((token, len)) = keyword_at(&chars, i) {
                    flush_atom(&mut current, &mut tokens);
                    tokens.push(token);
                    i += len;
                    continue;
                }
                current.push(c);
            }
        }
        i += 1;
    }

    if quote.is_some() {
        return Err(RuleEngineError::MalformedExpression(
            "Unterminated string literal".to_string(),
        ));
    }

    if paren_depth != 0 {
        return Err(RuleEngineError::MalformedExpression(
            "Unbalanced parentheses".to_string(),
        ));
    }

    flush_atom(&mut current, &mut tokens);
    Ok(tokens)
}

fn flush_atom(current: &mut String, tokens: &mut Vec<Token>) {
    let atom = current.trim();
    if !atom.is_empty() {
        tokens.push(Token::Atom(atom.to_string()));
    }
    current.clear();
}

/// Characters that may appear in a field name, so `user.or` stays one word
#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Match `and`/`or` starting at `i` as a whole word
fn keyword_at(chars: &[char], i: usize) -> Option<(Token, usize)> {
    if i > 0 && is_word_char(chars[i - 1]) {
        return None;
    }

    for (word, token) in [("and", Token::And), ("or", Token::Or)] {
        let end = i + word.len();
        if end > chars.len() {
            continue;
        }
        let matches = chars[i..end]
            .iter()
            .zip(word.chars())
            .all(|(c, w)| c.eq_ignore_ascii_case(&w));
        if !matches {
            continue;
        }
        if end < chars.len() && is_word_char(chars[end]) {
            continue;
        }
        return Some((token, word.len()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(s: &str) -> Token {
        Token::Atom(s.to_string())
    }

    #[test]
    fn test_tokenize_simple_chain() {
        let tokens = tokenize("age > 30 AND department = 'Sales'").unwrap();
        assert_eq!(
            tokens,
            vec![atom("age > 30"), Token::And, atom("department = 'Sales'")]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("a > 1 and b > 2 Or c > 3 aNd d > 4").unwrap();
        assert_eq!(
            tokens,
            vec![
                atom("a > 1"),
                Token::And,
                atom("b > 2"),
                Token::Or,
                atom("c > 3"),
                Token::And,
                atom("d > 4"),
            ]
        );
    }

    #[test]
    fn test_parentheses() {
        let tokens = tokenize("(a > 1 or b > 2) and c = 'x'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                atom("a > 1"),
                Token::Or,
                atom("b > 2"),
                Token::CloseParen,
                Token::And,
                atom("c = 'x'"),
            ]
        );
    }

    #[test]
    fn test_keywords_inside_quotes_are_literal() {
        let tokens = tokenize("team = 'black and white' or motto = \"rock or roll\"").unwrap();
        assert_eq!(
            tokens,
            vec![
                atom("team = 'black and white'"),
                Token::Or,
                atom("motto = \"rock or roll\""),
            ]
        );
    }

    #[test]
    fn test_parentheses_inside_quotes_are_literal() {
        let tokens = tokenize("name = 'a (b'").unwrap();
        assert_eq!(tokens, vec![atom("name = 'a (b'")]);
    }

    #[test]
    fn test_keyword_needs_word_boundary() {
        let tokens = tokenize("orders > 5 and brand = 'Oracle'").unwrap();
        assert_eq!(
            tokens,
            vec![atom("orders > 5"), Token::And, atom("brand = 'Oracle'")]
        );

        let tokens = tokenize("band > 1").unwrap();
        assert_eq!(tokens, vec![atom("band > 1")]);
    }

    #[test]
    fn test_unbalanced_parentheses() {
        for input in ["(a > 1", "a > 1)", "((a > 1)", "a > 1) and (b > 2"] {
            let err = tokenize(input).unwrap_err();
            assert!(
                matches!(err, RuleEngineError::MalformedExpression(_)),
                "Expected MalformedExpression for: {}",
                input
            );
        }
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize("name = 'Sales").unwrap_err();
        assert!(matches!(err, RuleEngineError::MalformedExpression(_)));
    }

    #[test]
    fn test_connectives_without_surrounding_spaces() {
        let tokens = tokenize("(a > 1)and(b > 2)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                atom("a > 1"),
                Token::CloseParen,
                Token::And,
                Token::OpenParen,
                atom("b > 2"),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_dotted_field_segments_are_not_keywords() {
        let tokens = tokenize("user.or > 1 and user.and = 'x' or and.id < 3").unwrap();
        assert_eq!(
            tokens,
            vec![
                atom("user.or > 1"),
                Token::And,
                atom("user.and = 'x'"),
                Token::Or,
                atom("and.id < 3"),
            ]
        );
    }

    #[test]
    fn test_parenthesis_nesting_limit() {
        let at_limit = format!("{}a > 1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(tokenize(&at_limit).unwrap().len(), 2 * MAX_DEPTH + 1);

        let too_deep = format!(
            "{}a > 1{}",
            "(".repeat(MAX_DEPTH + 1),
            ")".repeat(MAX_DEPTH + 1)
        );
        assert!(matches!(
            tokenize(&too_deep),
            Err(RuleEngineError::MalformedExpression(_))
        ));
    }
}
