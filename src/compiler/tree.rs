use log::debug;

use super::{SymbolTable, VariableSpec};
use crate::ast::{Ast, AstKind, BinaryOp, Owner, UnaryOp};
use crate::error::Result;

/// A name in an expression. `spec` is filled in by the analyzer and stays
/// `None` only for internal names such as `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub spec: Option<VariableSpec>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operands {
    pub op: BinaryOp,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

/// A `pre.x` / `post.x` reference. `display` is rendered once the owning
/// population is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Proprietorship {
    pub owner: Owner,
    pub variable: Symbol,
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Numeral {
    pub value: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Node>,
}

/// Scope-aware expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `+` and `-`
    Add(Operands),
    /// `*`, `/` and `%`
    Mul(Operands),
    Pow(Box<Node>, Box<Node>),
    /// comparisons and logical connectives
    BinaryOperator(Operands),
    Unary(UnaryOp, Box<Node>),
    Derivative(Symbol),
    Proprietorship(Proprietorship),
    Variable(Symbol),
    Numeral(Numeral),
    Function(Function),
}

impl Node {
    /// Binding strength of the node when printed infix; atoms bind tightest.
    pub fn precedence(&self) -> u8 {
        match self {
            Node::Add(o) | Node::Mul(o) | Node::BinaryOperator(o) => o.op.precedence(),
            Node::Unary(..) => 6,
            _ => u8::MAX,
        }
    }

    /// True when the node evaluates to a boolean.
    pub fn is_condition(&self) -> bool {
        match self {
            Node::BinaryOperator(_) => true,
            Node::Unary(UnaryOp::Not, _) => true,
            _ => false,
        }
    }

    /// A numeric literal, optionally signed.
    pub fn is_numeric_literal(&self) -> bool {
        match self {
            Node::Numeral(_) => true,
            Node::Unary(UnaryOp::Neg | UnaryOp::Plus, child) => {
                matches!(child.as_ref(), Node::Numeral(_))
            }
            _ => false,
        }
    }
}

fn operands(op: BinaryOp, left: Node, right: Node) -> Operands {
    Operands {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

// `_pre_x` -> (Pre, "x")
fn split_owner(name: &str) -> Option<(Owner, &str)> {
    Owner::ALL.into_iter().find_map(|owner| {
        name.strip_prefix('_')
            .and_then(|rest| rest.strip_prefix(owner.as_str()))
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| (owner, rest))
    })
}

fn extract_name(name: &str, symbols: &SymbolTable) -> Node {
    if let Some((owner, variable)) = split_owner(name) {
        return Node::Proprietorship(Proprietorship {
            owner,
            variable: Symbol::new(variable),
            display: None,
        });
    }
    // a declared name always wins over the `dNAME` reading, and only the
    // current entity's variables have a derivative
    if symbols.get(name).is_none() {
        if let Some(target) = name.strip_prefix('d') {
            if symbols.get_local(target).is_some() {
                return Node::Derivative(Symbol::new(target));
            }
        }
    }
    Node::Variable(Symbol::new(name))
}

/// Converts a raw grammar tree into a [Node] tree. Names are classified but
/// not resolved; `symbols` is only consulted to recognise `dNAME`.
pub fn extract(ast: &Ast, symbols: &SymbolTable) -> Result<Node> {
    let node = match &ast.kind {
        AstKind::Binop(binop) => {
            let left = extract(&binop.left, symbols)?;
            let right = extract(&binop.right, symbols)?;
            match binop.op {
                BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                    Node::Mul(operands(binop.op, left, right))
                }
                BinaryOp::Add | BinaryOp::Sub => Node::Add(operands(binop.op, left, right)),
                BinaryOp::Pow => Node::Pow(Box::new(left), Box::new(right)),
                BinaryOp::Gt
                | BinaryOp::Lt
                | BinaryOp::Ge
                | BinaryOp::Le
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::And
                | BinaryOp::Or => Node::BinaryOperator(operands(binop.op, left, right)),
            }
        }
        AstKind::Monop(monop) => Node::Unary(monop.op, Box::new(extract(&monop.child, symbols)?)),
        AstKind::Number(number) => Node::Numeral(Numeral {
            value: number.value,
            text: number.text.to_string(),
        }),
        AstKind::Call(call) => Node::Function(Function {
            name: call.fn_name.to_string(),
            params: call
                .args
                .iter()
                .map(|arg| extract(arg, symbols))
                .collect::<Result<Vec<_>>>()?,
        }),
        AstKind::Name(name) => extract_name(name, symbols),
    };
    Ok(node)
}

/// Parses and extracts in one go, logging the result.
pub fn extract_expression(text: &str, symbols: &SymbolTable) -> Result<Node> {
    let ast = crate::parser::parse_expression(text)?;
    let node = extract(&ast, symbols)?;
    debug!("extracted `{}` as {:?}", text, node);
    Ok(node)
}
