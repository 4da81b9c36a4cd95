use log::trace;
use pest::Parser;

use super::{error_column, next_any, next_pair, DslParser, Rule};
use crate::ast::Owner;
use crate::error::{CompileError, Result};

/// `name = init : constraint*` with nothing resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVariable {
    pub name: String,
    pub init: String,
    pub constraints: Vec<String>,
}

/// Left-hand side of an equation, `v` or `post.g_exc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTarget {
    pub owner: Option<Owner>,
    pub name: String,
}

impl std::fmt::Display for ParsedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{}.{}", owner, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEquation {
    pub lhs: ParsedTarget,
    pub rhs: String,
    pub is_ode: bool,
}

/// Statements are separated by newlines or semicolons; blank ones are dropped.
pub fn split_statements(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == '\n' || c == ';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn parse_variable(line: &str) -> Result<ParsedVariable> {
    let mut pairs = DslParser::parse(Rule::variable, line).map_err(|e| {
        CompileError::syntax(line, error_column(&e), "invalid variable definition")
    })?;
    let mut inner = next_pair(&mut pairs, Rule::variable)?.into_inner();
    let name = next_pair(&mut inner, Rule::ident)?.as_str().to_string();
    let init = next_pair(&mut inner, Rule::numeral)?.as_str().to_string();
    let constraints = match inner.next() {
        Some(pair) if pair.as_rule() == Rule::constraints => pair
            .into_inner()
            .map(|c| c.as_str().to_string())
            .collect(),
        _ => Vec::new(),
    };
    trace!("lexed variable {name} = {init} : {constraints:?}");
    Ok(ParsedVariable {
        name,
        init,
        constraints,
    })
}

pub fn parse_variables(text: &str) -> Result<Vec<ParsedVariable>> {
    split_statements(text).map(parse_variable).collect()
}

pub fn parse_equation(line: &str) -> Result<ParsedEquation> {
    let mut pairs = DslParser::parse(Rule::equation, line)
        .map_err(|e| CompileError::syntax(line, error_column(&e), "invalid equation"))?;
    let mut inner = next_pair(&mut pairs, Rule::equation)?.into_inner();
    let statement = next_any(&mut inner, "equation body")?;
    let equation = match statement.as_rule() {
        // ode = { ode_target ~ "/" ~ "dt" ~ "=" ~ rhs }
        Rule::ode => {
            let mut inner = statement.into_inner();
            let mut target = next_pair(&mut inner, Rule::ode_target)?.into_inner();
            let name = next_pair(&mut target, Rule::ident)?.as_str().to_string();
            let rhs = next_pair(&mut inner, Rule::rhs)?.as_str().trim().to_string();
            ParsedEquation {
                lhs: ParsedTarget { owner: None, name },
                rhs,
                is_ode: true,
            }
        }
        // simple = { target ~ assign_op ~ rhs }
        Rule::simple => {
            let mut inner = statement.into_inner();
            let target = next_pair(&mut inner, Rule::target)?;
            let lhs_text = target.as_str().trim();
            let lhs = parse_target(target)?;
            let op = next_pair(&mut inner, Rule::assign_op)?.as_str();
            let rhs = next_pair(&mut inner, Rule::rhs)?.as_str().trim();
            let rhs = match op.strip_suffix('=') {
                Some(compound) if !compound.is_empty() => {
                    format!("{lhs_text} {compound} ({rhs})")
                }
                _ => rhs.to_string(),
            };
            ParsedEquation {
                lhs,
                rhs,
                is_ode: false,
            }
        }
        rule => {
            return Err(CompileError::internal(format!(
                "unexpected equation rule {rule:?}"
            )))
        }
    };
    trace!(
        "lexed equation {} = {} (ode: {})",
        equation.lhs,
        equation.rhs,
        equation.is_ode
    );
    Ok(equation)
}

// target = { qualified | ident }
fn parse_target(pair: pest::iterators::Pair<'_, Rule>) -> Result<ParsedTarget> {
    let mut inner = pair.into_inner();
    let target = next_any(&mut inner, "equation target")?;
    match target.as_rule() {
        Rule::ident => Ok(ParsedTarget {
            owner: None,
            name: target.as_str().to_string(),
        }),
        Rule::qualified => {
            let mut inner = target.into_inner();
            let owner_pair = next_pair(&mut inner, Rule::owner)?;
            let owner = Owner::from_token(owner_pair.as_str()).ok_or_else(|| {
                CompileError::internal(format!("unknown owner {}", owner_pair.as_str()))
            })?;
            let name = next_pair(&mut inner, Rule::ident)?.as_str().to_string();
            Ok(ParsedTarget {
                owner: Some(owner),
                name,
            })
        }
        rule => Err(CompileError::internal(format!(
            "unexpected target rule {rule:?}"
        ))),
    }
}

pub fn parse_equations(text: &str) -> Result<Vec<ParsedEquation>> {
    split_statements(text).map(parse_equation).collect()
}

/// Rewrites `pre.x` / `post.x` into the flat identifiers `_pre_x` / `_post_x`
/// so the expression grammar only ever sees plain symbols.
pub fn rewrite_ownership(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut rest = text;
    let mut prev: Option<char> = None;
    'outer: while let Some(c) = rest.chars().next() {
        let at_boundary = !matches!(prev, Some(p) if p.is_ascii_alphanumeric() || p == '_' || p == '.');
        if at_boundary {
            for owner in Owner::ALL {
                let prefix = owner.as_str();
                if rest.starts_with(prefix) && rest[prefix.len()..].starts_with('.') {
                    out.push('_');
                    out.push_str(prefix);
                    out.push('_');
                    rest = &rest[prefix.len() + 1..];
                    prev = Some('_');
                    continue 'outer;
                }
            }
        }
        out.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty() {
        assert!(parse_variables("").unwrap().is_empty());
        assert!(parse_equations("  \n\n ; \n").unwrap().is_empty());
    }

    #[test]
    fn variables_split_on_newlines_and_semicolons() {
        let vars = parse_variables(
            "
            tau = 12 : constant
            p = 0 : shared; x = -1.5e-3
            ",
        )
        .unwrap();
        assert_eq!(
            vars,
            vec![
                ParsedVariable {
                    name: "tau".to_string(),
                    init: "12".to_string(),
                    constraints: vec!["constant".to_string()],
                },
                ParsedVariable {
                    name: "p".to_string(),
                    init: "0".to_string(),
                    constraints: vec!["shared".to_string()],
                },
                ParsedVariable {
                    name: "x".to_string(),
                    init: "-1.5e-3".to_string(),
                    constraints: vec![],
                },
            ]
        );
    }

    #[test]
    fn bad_variable_names_the_line() {
        let err = parse_variables("tau = 12\n tau 12 : constant \n").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.has_error_contains("`tau 12 : constant`"), "{err}");
    }

    #[test]
    fn ode_and_simple_equations() {
        let eqs = parse_equations("dw/dt = w + 1 + delay\nx = p + tau + Uniform(2, 3)").unwrap();
        assert_eq!(eqs.len(), 2);
        assert!(eqs[0].is_ode);
        assert_eq!(eqs[0].lhs.name, "w");
        assert_eq!(eqs[0].rhs, "w + 1 + delay");
        assert!(!eqs[1].is_ode);
        assert_eq!(eqs[1].lhs.name, "x");
        assert_eq!(eqs[1].rhs, "p + tau + Uniform(2, 3)");
    }

    #[test]
    fn variable_starting_with_d_is_not_an_ode() {
        let eq = parse_equation("dv = 3").unwrap();
        assert!(!eq.is_ode);
        assert_eq!(eq.lhs.name, "dv");
    }

    macro_rules! compound_tests {
        ($($name:ident: $text:literal => $lhs:literal = $rhs:literal,)*) => {
        $(
            #[test]
            fn $name() {
                let eq = parse_equation($text).unwrap();
                assert!(!eq.is_ode);
                assert_eq!(eq.lhs.to_string(), $lhs);
                assert_eq!(eq.rhs, $rhs);
            }
        )*
        }
    }

    compound_tests!(
        add_assign: "v += 1" => "v" = "v + (1)",
        sub_assign: "v -= a + b" => "v" = "v - (a + b)",
        mul_assign: "v *= 2" => "v" = "v * (2)",
        div_assign: "v /= 2" => "v" = "v / (2)",
        mod_assign: "v %= 2" => "v" = "v % (2)",
        qualified_assign: "post.g_exc += w" => "post.g_exc" = "post.g_exc + (w)",
        plain_assign: "v = 3" => "v" = "3",
    );

    #[test]
    fn malformed_equation_is_syntax_error() {
        let err = parse_equations("v = 1\n= 3").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.has_error_contains("`= 3`"));
    }

    #[test]
    fn ownership_rewrite_respects_boundaries() {
        assert_eq!(rewrite_ownership("post.v + pre.w"), "_post_v + _pre_w");
        assert_eq!(rewrite_ownership("(pre.r*post.r)"), "(_pre_r*_post_r)");
        assert_eq!(rewrite_ownership("xpre.w + pressure"), "xpre.w + pressure");
        assert_eq!(rewrite_ownership("post"), "post");
    }
}
