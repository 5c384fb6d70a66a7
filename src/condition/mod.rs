//! Rule parsing, serialization and evaluation
//!
//! This module turns rule strings like
//! `"age > 30 AND department = 'Sales'"` into an AST, converts that AST to and
//! from JSON, and evaluates it against a [`Record`].

mod ast;
pub mod codec;
mod evaluator;
pub mod parser;
mod record;
pub mod tokenizer;


pub use ast::*;
pub use codec::{deserialize, serialize};
pub use evaluator::*;
pub use parser::parse;
pub use record::*;
pub use tokenizer::{tokenize, Token};
