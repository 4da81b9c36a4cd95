use std::fmt;

use itertools::Itertools;
use log::{debug, info, trace};

use super::equation::{Equation, EquationKind, Target};
use super::render::render_owned;
use super::tree::{extract_expression, Node};
use super::{
    build_variable_specs, CompiledConnection, CompiledNetwork, CompiledPopulation, ScopeSnapshot,
    SymbolTable, VariableContext, VariableSpec,
};
use crate::ast::Owner;
use crate::error::{CompileError, Result};
use crate::model::{Connection, Network, Population, PopulationId};
use crate::parser::{parse_equations, rewrite_ownership, ParsedEquation, ParsedTarget};
use crate::vocabulary::Vocabulary;

/// The statement blocks an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Equations,
    Reset,
    PreSpike,
    PostSpike,
}

impl Block {
    pub fn allows_ode(&self) -> bool {
        matches!(self, Block::Equations)
    }

    fn kind(&self, is_ode: bool) -> EquationKind {
        match (self, is_ode) {
            (_, true) => EquationKind::Ode,
            (Block::Reset, false) => EquationKind::Reset,
            (_, false) => EquationKind::Simple,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Block::Equations => "equations",
            Block::Reset => "reset",
            Block::PreSpike => "pre_spike",
            Block::PostSpike => "post_spike",
        };
        write!(f, "{name}")
    }
}

/// Frozen scope of a connection's pre- or post-synaptic population.
#[derive(Debug, Clone, Copy)]
pub struct OwnerScope<'a> {
    pub population: PopulationId,
    pub scope: &'a ScopeSnapshot,
}

impl OwnerScope<'_> {
    fn lookup(&self, owner: Owner, name: &str) -> Result<&VariableSpec> {
        self.scope.get(name).ok_or_else(|| {
            CompileError::semantic(format!(
                "variable {name} is not defined in {} ({owner})",
                self.population
            ))
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Proprietors<'a> {
    pub pre: OwnerScope<'a>,
    pub post: OwnerScope<'a>,
}

impl<'a> Proprietors<'a> {
    pub fn get(&self, owner: Owner) -> OwnerScope<'a> {
        match owner {
            Owner::Pre => self.pre,
            Owner::Post => self.post,
        }
    }
}

/// Everything the analysis of one entity's statements needs to know.
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext<'a> {
    pub symbols: &'a SymbolTable,
    pub context: VariableContext,
    /// Only set inside connections.
    pub proprietors: Option<Proprietors<'a>>,
    pub vocabulary: &'a Vocabulary,
}

impl<'a> TraversalContext<'a> {
    fn proprietors(&self, owner: Owner, name: &str) -> Result<Proprietors<'a>> {
        self.proprietors.ok_or_else(|| {
            CompileError::semantic(format!(
                "ownership reference {owner}.{name} is only allowed in connections"
            ))
        })
    }

    /// Resolves every name in `node` against the current scopes, filling in
    /// specs and ownership display names.
    pub fn resolve(&self, node: &mut Node) -> Result<()> {
        match node {
            Node::Add(o) | Node::Mul(o) | Node::BinaryOperator(o) => {
                self.resolve(&mut o.left)?;
                self.resolve(&mut o.right)
            }
            Node::Pow(base, exponent) => {
                self.resolve(base)?;
                self.resolve(exponent)
            }
            Node::Unary(_, child) => self.resolve(child),
            Node::Derivative(symbol) => {
                let spec = self.symbols.get(&symbol.name).ok_or_else(|| {
                    CompileError::internal(format!(
                        "derivative of {} extracted without a definition",
                        symbol.name
                    ))
                })?;
                if spec.is_constant() {
                    return Err(CompileError::semantic(format!(
                        "cannot derive constant variable: {}",
                        symbol.name
                    )));
                }
                symbol.spec = Some(spec.clone());
                Ok(())
            }
            Node::Proprietorship(p) => {
                let owner_scope = self.proprietors(p.owner, &p.variable.name)?.get(p.owner);
                let spec = owner_scope.lookup(p.owner, &p.variable.name)?;
                trace!(
                    "resolved {}.{} in {}",
                    p.owner,
                    p.variable.name,
                    owner_scope.population
                );
                p.display = Some(render_owned(owner_scope.population, p.owner, spec));
                p.variable.spec = Some(spec.clone());
                Ok(())
            }
            Node::Variable(symbol) => {
                if symbol.name.starts_with('_') {
                    return Err(CompileError::semantic(format!(
                        "identifiers starting with `_` are reserved: {}",
                        symbol.name
                    )));
                }
                match self.symbols.get(&symbol.name) {
                    Some(spec) => {
                        trace!("resolved {} as {}", symbol.name, spec);
                        symbol.spec = Some(spec.clone());
                        Ok(())
                    }
                    None if self.vocabulary.is_internal(&symbol.name) => Ok(()),
                    None => Err(CompileError::semantic(format!(
                        "variable {} is not defined in this scope",
                        symbol.name
                    ))),
                }
            }
            Node::Numeral(_) => Ok(()),
            Node::Function(function) => {
                if !self.vocabulary.is_function(&function.name) {
                    return Err(CompileError::semantic(format!(
                        "unknown function {}",
                        function.name
                    )));
                }
                if function.params.len() != 2 || !function.params.iter().all(Node::is_numeric_literal)
                {
                    return Err(CompileError::semantic(format!(
                        "function {} takes exactly two numeric arguments",
                        function.name
                    )));
                }
                Ok(())
            }
        }
    }

    /// Writes are only allowed to the entity's own scope or, inside a
    /// connection, to one of its populations.
    pub fn resolve_target(&self, lhs: &ParsedTarget) -> Result<Target> {
        if let Some(owner) = lhs.owner {
            let owner_scope = self.proprietors(owner, &lhs.name)?.get(owner);
            let spec = owner_scope.lookup(owner, &lhs.name)?;
            return Ok(Target::Owned {
                owner,
                population: owner_scope.population,
                spec: spec.clone(),
            });
        }
        match self.symbols.get_local(&lhs.name) {
            Some(spec) => Ok(Target::Own(spec.clone())),
            None if self.symbols.get(&lhs.name).is_some() => {
                Err(CompileError::semantic(format!(
                    "cannot assign to network variable {} from a {} block",
                    lhs.name, self.context
                )))
            }
            None => Err(CompileError::semantic(format!(
                "variable {} is not defined in this scope",
                lhs.name
            ))),
        }
    }

    fn expression(&self, text: &str) -> Result<Node> {
        let mut node = extract_expression(&rewrite_ownership(text), self.symbols)?;
        self.resolve(&mut node)?;
        Ok(node)
    }

    pub fn compile_equation(&self, parsed: &ParsedEquation, block: Block) -> Result<Equation> {
        if parsed.is_ode && !block.allows_ode() {
            return Err(CompileError::semantic(format!(
                "{block} block cannot contain an ODE: d{}/dt",
                parsed.lhs.name
            )));
        }
        let target = self.resolve_target(&parsed.lhs)?;
        if target.spec().is_constant() {
            let message = if parsed.is_ode {
                format!("cannot derive constant variable: {}", parsed.lhs.name)
            } else {
                format!("cannot assign to constant variable: {}", parsed.lhs)
            };
            return Err(CompileError::semantic(message));
        }
        let expression = self.expression(&parsed.rhs)?;
        let equation = Equation::new(target, expression, block.kind(parsed.is_ode));
        debug!("{block}: {equation}");
        Ok(equation)
    }

    pub fn compile_block(&self, text: &str, block: Block) -> Result<Vec<Equation>> {
        parse_equations(text)?
            .iter()
            .map(|parsed| self.compile_equation(parsed, block))
            .collect()
    }

    /// An empty condition means the population never spikes.
    pub fn compile_spike(&self, text: &str) -> Result<Option<Equation>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let expression = self.expression(text)?;
        if !expression.is_condition() {
            return Err(CompileError::semantic(format!(
                "spike condition must be a boolean expression: `{text}`"
            )));
        }
        let spike = Equation::spike(expression);
        debug!("spike: {spike}");
        Ok(Some(spike))
    }
}

pub fn check_required(
    specs: &[VariableSpec],
    context: VariableContext,
    vocabulary: &Vocabulary,
) -> Result<()> {
    let missing = vocabulary
        .context(context)
        .required
        .iter()
        .filter(|name| !specs.iter().any(|spec| &spec.name == *name))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CompileError::semantic(format!(
            "missing required {context} variables: {}",
            missing.iter().join(", ")
        )))
    }
}

/// Drives one compilation: network scope, then every population, then every
/// connection. The first error aborts the run.
pub struct Compiler<'a> {
    vocabulary: &'a Vocabulary,
    symbols: SymbolTable,
    snapshots: Vec<ScopeSnapshot>,
}

impl<'a> Compiler<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self {
            vocabulary,
            symbols: SymbolTable::new(),
            snapshots: Vec::new(),
        }
    }

    // opens a scope holding the declared variables of one entity
    fn declare(&mut self, text: &str, context: VariableContext) -> Result<Vec<VariableSpec>> {
        let specs = build_variable_specs(text, context, self.vocabulary)?;
        check_required(&specs, context, self.vocabulary)?;
        self.symbols.enter_scope();
        for spec in specs.iter() {
            self.symbols.define(spec.clone())?;
        }
        Ok(specs)
    }

    pub fn compile(&mut self, network: &Network) -> Result<CompiledNetwork> {
        self.symbols = SymbolTable::new();
        self.snapshots.clear();

        let variables = self.declare(network.variables(), VariableContext::Network)?;
        let populations = network
            .populations()
            .iter()
            .map(|population| self.compile_population(population))
            .collect::<Result<Vec<_>>>()?;
        let connections = network
            .connections()
            .iter()
            .map(|connection| self.compile_connection(connection))
            .collect::<Result<Vec<_>>>()?;
        self.symbols.exit_scope()?;
        if self.symbols.depth() != 0 {
            return Err(CompileError::internal(format!(
                "{} scopes left open after compilation",
                self.symbols.depth()
            )));
        }
        Ok(CompiledNetwork {
            variables,
            populations,
            connections,
        })
    }

    fn compile_population(&mut self, population: &Population) -> Result<CompiledPopulation> {
        let neuron = &population.neuron;
        let variables = self.declare(&neuron.variables, VariableContext::Neuron)?;

        let ctx = TraversalContext {
            symbols: &self.symbols,
            context: VariableContext::Neuron,
            proprietors: None,
            vocabulary: self.vocabulary,
        };
        let equations = ctx.compile_block(&neuron.equations, Block::Equations)?;
        let spike = ctx.compile_spike(&neuron.spike)?;
        let reset = ctx.compile_block(&neuron.reset, Block::Reset)?;

        let snapshot = self.symbols.snapshot()?;
        self.symbols.exit_scope()?;
        if self.snapshots.len() != population.id.index() {
            return Err(CompileError::internal(format!(
                "{} compiled out of order",
                population.id
            )));
        }
        self.snapshots.push(snapshot);
        info!(
            "compiled {}: {} variables, {} equations, {} reset",
            population.id,
            variables.len(),
            equations.len(),
            reset.len()
        );
        Ok(CompiledPopulation {
            id: population.id,
            size: population.size,
            variables,
            equations,
            spike,
            reset,
        })
    }

    fn owner_scope(&self, population: PopulationId) -> Result<OwnerScope<'_>> {
        let scope = self.snapshots.get(population.index()).ok_or_else(|| {
            CompileError::internal(format!("no snapshot for {population}"))
        })?;
        Ok(OwnerScope { population, scope })
    }

    fn compile_connection(&mut self, connection: &Connection) -> Result<CompiledConnection> {
        let synapse = &connection.synapse;
        let variables = self.declare(&synapse.variables, VariableContext::Synapse)?;

        let proprietors = Proprietors {
            pre: self.owner_scope(connection.pre)?,
            post: self.owner_scope(connection.post)?,
        };
        let ctx = TraversalContext {
            symbols: &self.symbols,
            context: VariableContext::Synapse,
            proprietors: Some(proprietors),
            vocabulary: self.vocabulary,
        };
        let equations = ctx.compile_block(&synapse.equations, Block::Equations)?;
        let pre_spike = ctx.compile_block(&synapse.pre_spike, Block::PreSpike)?;
        let post_spike = ctx.compile_block(&synapse.post_spike, Block::PostSpike)?;

        self.symbols.exit_scope()?;
        info!(
            "compiled {} ({} -> {}): {} variables, {} equations",
            connection.id,
            connection.pre,
            connection.post,
            variables.len(),
            equations.len()
        );
        Ok(CompiledConnection {
            id: connection.id,
            pre: connection.pre,
            post: connection.post,
            variables,
            equations,
            pre_spike,
            post_spike,
        })
    }
}
