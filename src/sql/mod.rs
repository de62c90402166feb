//! SQL text handling: statement model and the statement splitter.

pub mod statement;
pub mod tokenizer;

pub use statement::{Statement, StatementKind};
pub use tokenizer::{SplitOptions, SyntaxError, SyntaxErrorKind, TrailingStatement, split, split_with};
