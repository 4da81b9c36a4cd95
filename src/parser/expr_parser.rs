use pest::iterators::{Pair, Pairs};
use pest::Parser;

use super::{error_column, next_any, next_pair, DslParser, Rule};
use crate::ast::{self, Ast, AstKind, BinaryOp, StringSpan, UnaryOp};
use crate::error::{CompileError, Result};

fn span_of(pair: &Pair<'_, Rule>) -> Option<StringSpan> {
    Some(StringSpan {
        pos_start: pair.as_span().start(),
        pos_end: pair.as_span().end(),
    })
}

fn merge_spans(left: Option<StringSpan>, right: Option<StringSpan>) -> Option<StringSpan> {
    match (left, right) {
        (Some(l), Some(r)) => Some(StringSpan {
            pos_start: l.pos_start,
            pos_end: r.pos_end,
        }),
        (l, r) => l.or(r),
    }
}

fn parse_binop(pair: Pair<'_, Rule>) -> Result<BinaryOp> {
    BinaryOp::from_token(pair.as_str())
        .ok_or_else(|| CompileError::internal(format!("unknown operator {}", pair.as_str())))
}

// head ~ (op ~ operand)*, folded to the left
fn fold_left<'a>(mut inner: Pairs<'a, Rule>, what: &str) -> Result<Ast<'a>> {
    let mut head = parse_value(next_any(&mut inner, what)?)?;
    while let Some(op) = inner.next() {
        let op = parse_binop(op)?;
        let rhs = parse_value(next_any(&mut inner, what)?)?;
        let span = merge_spans(head.span, rhs.span);
        head = Ast {
            kind: AstKind::Binop(ast::Binop {
                op,
                left: Box::new(head),
                right: Box::new(rhs),
            }),
            span,
        };
    }
    Ok(head)
}

fn parse_value(pair: Pair<'_, Rule>) -> Result<Ast<'_>> {
    let span = span_of(&pair);
    let node = match pair.as_rule() {
        // disjunction = { conjunction ~ (or_op ~ conjunction)* }
        Rule::disjunction => fold_left(pair.into_inner(), "conjunction")?,
        // conjunction = { comparison ~ (and_op ~ comparison)* }
        Rule::conjunction => fold_left(pair.into_inner(), "comparison")?,
        // comparison  = { sum ~ (cmp_op ~ sum)? }
        Rule::comparison => fold_left(pair.into_inner(), "sum")?,
        // sum         = { term ~ (term_op ~ term)* }
        Rule::sum => fold_left(pair.into_inner(), "term")?,
        // term        = { unary ~ (factor_op ~ unary)* }
        Rule::term => fold_left(pair.into_inner(), "factor")?,

        // unary       = { unary_op* ~ power }
        Rule::unary => {
            let mut ops = Vec::new();
            let mut operand = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::unary_op => {
                        let op = UnaryOp::from_token(inner.as_str()).ok_or_else(|| {
                            CompileError::internal(format!(
                                "unknown unary operator {}",
                                inner.as_str()
                            ))
                        })?;
                        ops.push(op);
                    }
                    _ => operand = Some(parse_value(inner)?),
                }
            }
            let mut node =
                operand.ok_or_else(|| CompileError::internal("unary without operand"))?;
            for op in ops.into_iter().rev() {
                node = Ast {
                    kind: AstKind::Monop(ast::Monop {
                        op,
                        child: Box::new(node),
                    }),
                    span,
                };
            }
            node
        }

        // power       = { factor ~ (pow_op ~ unary)? }
        Rule::power => fold_left(pair.into_inner(), "power operand")?,

        // factor      = { call | number | symbol | "(" ~ disjunction ~ ")" }
        Rule::factor => parse_value(next_any(&mut pair.into_inner(), "factor")?)?,

        // call        = { symbol ~ "(" ~ (disjunction ~ ("," ~ disjunction)*)? ~ ")" }
        Rule::call => {
            let mut inner = pair.into_inner();
            let fn_name = next_pair(&mut inner, Rule::symbol)?.as_str();
            let args = inner
                .map(|arg| parse_value(arg).map(Box::new))
                .collect::<Result<Vec<_>>>()?;
            Ast {
                kind: AstKind::Call(ast::Call { fn_name, args }),
                span,
            }
        }

        Rule::number => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|e| {
                CompileError::internal(format!("grammar accepted bad number {text}: {e}"))
            })?;
            Ast {
                kind: AstKind::Number(ast::Number { value, text }),
                span,
            }
        }

        Rule::symbol => Ast {
            kind: AstKind::Name(pair.as_str()),
            span,
        },

        rule => {
            return Err(CompileError::internal(format!(
                "unexpected rule {rule:?} in expression"
            )))
        }
    };
    Ok(node)
}

/// Parses a right-hand side or spike condition into an [Ast] borrowing from `text`.
pub fn parse_expression(text: &str) -> Result<Ast<'_>> {
    let mut pairs = DslParser::parse(Rule::expression, text)
        .map_err(|e| CompileError::syntax(text, error_column(&e), "invalid expression"))?;
    let mut inner = next_pair(&mut pairs, Rule::expression)?.into_inner();
    parse_value(next_pair(&mut inner, Rule::disjunction)?)
}
