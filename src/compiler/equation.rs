use std::fmt;

use super::render::{render_owned, render_variable};
use super::tree::Node;
use super::VariableSpec;
use crate::ast::Owner;
use crate::model::PopulationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationKind {
    Simple,
    Ode,
    Reset,
    Spike,
}

/// The variable an equation writes to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Own(VariableSpec),
    Owned {
        owner: Owner,
        population: PopulationId,
        spec: VariableSpec,
    },
}

impl Target {
    pub fn spec(&self) -> &VariableSpec {
        match self {
            Target::Own(spec) => spec,
            Target::Owned { spec, .. } => spec,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Own(spec) => write!(f, "{}", render_variable(spec)),
            Target::Owned {
                owner,
                population,
                spec,
            } => write!(f, "{}", render_owned(*population, *owner, spec)),
        }
    }
}

/// One resolved statement. Spike conditions carry no target.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub target: Option<Target>,
    pub expression: Node,
    pub kind: EquationKind,
}

impl Equation {
    pub fn new(target: Target, expression: Node, kind: EquationKind) -> Self {
        Self {
            target: Some(target),
            expression,
            kind,
        }
    }

    pub fn spike(expression: Node) -> Self {
        Self {
            target: None,
            expression,
            kind: EquationKind::Spike,
        }
    }

    pub fn is_ode(&self) -> bool {
        self.kind == EquationKind::Ode
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.target, self.kind) {
            (Some(target), EquationKind::Ode) => {
                write!(f, "d{}/dt = {}", target.spec().name, self.expression)
            }
            (Some(target), _) => write!(f, "{} = {}", target, self.expression),
            (None, _) => write!(f, "{}", self.expression),
        }
    }
}
