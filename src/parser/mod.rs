#![allow(clippy::empty_docs)]
#[derive(Parser)]
#[grammar = "parser/dsl_grammar.pest"] // relative to src
pub struct DslParser;

use pest::error::{Error, LineColLocation};
use pest::iterators::{Pair, Pairs};

use crate::error::{CompileError, Result};

pub mod expr_parser;
pub use expr_parser::parse_expression;

pub mod lexer;
pub use lexer::{
    parse_equation, parse_equations, parse_variable, parse_variables, rewrite_ownership,
    split_statements, ParsedEquation, ParsedTarget, ParsedVariable,
};

fn error_column(err: &Error<Rule>) -> usize {
    match err.line_col {
        LineColLocation::Pos((_, col)) => col,
        LineColLocation::Span((_, col), _) => col,
    }
}

// the grammar guarantees the shape of every pair we ask for, so a mismatch
// here is a defect in the grammar or in the code walking it
fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, expected: Rule) -> Result<Pair<'i, Rule>> {
    match pairs.next() {
        Some(pair) if pair.as_rule() == expected => Ok(pair),
        Some(pair) => Err(CompileError::internal(format!(
            "expected {:?} but the grammar produced {:?} (`{}`)",
            expected,
            pair.as_rule(),
            pair.as_str()
        ))),
        None => Err(CompileError::internal(format!(
            "expected {expected:?} but the grammar produced nothing"
        ))),
    }
}

fn next_any<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| CompileError::internal(format!("missing {what} in parse tree")))
}
