use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{CompileError, Result};
use crate::parser::{parse_variable, parse_variables, ParsedVariable};
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    Double,
    Integer,
    Float,
}

impl VariableType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "double" => Some(Self::Double),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }

    /// Scalar type used for the variable in emitted code.
    pub fn c_type(&self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Integer => "int",
            Self::Float => "float",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variability {
    Constant,
    Variable,
}

impl Variability {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "constant" => Some(Self::Constant),
            "variable" => Some(Self::Variable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Variable => "variable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Local,
    Shared,
}

impl Scope {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "local" => Some(Self::Local),
            "shared" => Some(Self::Shared),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Shared => "shared",
        }
    }
}

/// The kind of entity a variable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableContext {
    Network,
    Neuron,
    Synapse,
}

impl fmt::Display for VariableContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Neuron => "neuron",
            Self::Synapse => "synapse",
        };
        write!(f, "{name}")
    }
}

/// A fully resolved variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    pub init: String,
    pub var_type: VariableType,
    pub variability: Variability,
    pub scope: Scope,
    pub context: VariableContext,
}

// at most one token per family, falling back to the family default
fn pick<T: Copy>(
    name: &str,
    family: &str,
    tokens: &BTreeSet<&str>,
    from_token: impl Fn(&str) -> Option<T>,
    default: T,
) -> Result<T> {
    let matched = tokens
        .iter()
        .copied()
        .filter(|t| from_token(*t).is_some())
        .collect::<Vec<_>>();
    match matched.as_slice() {
        [] => Ok(default),
        [token] => from_token(*token).ok_or_else(|| {
            CompileError::internal(format!("constraint {token} lost its {family} family"))
        }),
        _ => Err(CompileError::semantic(format!(
            "conflicting {family} constraints on variable {name}: {}",
            matched.join(", ")
        ))),
    }
}

impl VariableSpec {
    /// Resolves the constraint list of a lexed variable, without any name checks.
    pub fn resolve(parsed: &ParsedVariable, context: VariableContext) -> Result<Self> {
        let name = parsed.name.as_str();
        let tokens = parsed
            .constraints
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();
        if let Some(unknown) = tokens.iter().find(|t| {
            VariableType::from_token(t).is_none()
                && Variability::from_token(t).is_none()
                && Scope::from_token(t).is_none()
        }) {
            return Err(CompileError::semantic(format!(
                "unknown constraint {unknown} on variable {name}"
            )));
        }
        let spec = Self {
            name: parsed.name.clone(),
            init: parsed.init.clone(),
            var_type: pick(name, "type", &tokens, VariableType::from_token, VariableType::Float)?,
            variability: pick(
                name,
                "variability",
                &tokens,
                Variability::from_token,
                Variability::Variable,
            )?,
            scope: pick(name, "scope", &tokens, Scope::from_token, Scope::Local)?,
            context,
        };
        if context == VariableContext::Network && spec.scope == Scope::Shared {
            return Err(CompileError::semantic(format!(
                "network variable {name} cannot be shared"
            )));
        }
        Ok(spec)
    }

    /// Resolves a user declaration, rejecting forbidden and reserved names.
    pub fn from_parsed(
        parsed: &ParsedVariable,
        context: VariableContext,
        vocabulary: &Vocabulary,
    ) -> Result<Self> {
        let name = parsed.name.as_str();
        if vocabulary.is_forbidden(context, name) {
            return Err(CompileError::semantic(format!(
                "{name} is a forbidden variable name in {context} context"
            )));
        }
        if vocabulary.is_reserved(name) {
            return Err(CompileError::semantic(format!("{name} is a reserved word")));
        }
        Self::resolve(parsed, context)
    }

    pub fn is_constant(&self) -> bool {
        self.variability == Variability::Constant
    }

    pub fn is_shared(&self) -> bool {
        self.scope == Scope::Shared
    }
}

impl fmt::Display for VariableSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} = {} : {} {} {}",
            self.name,
            self.init,
            self.var_type.as_str(),
            self.variability.as_str(),
            self.scope.as_str()
        )
    }
}

/// Lexes a `variables` block and resolves every statement, followed by the
/// builtins of `context`. Names must be unique across both.
pub fn build_variable_specs(
    text: &str,
    context: VariableContext,
    vocabulary: &Vocabulary,
) -> Result<Vec<VariableSpec>> {
    let mut specs = parse_variables(text)?
        .iter()
        .map(|parsed| VariableSpec::from_parsed(parsed, context, vocabulary))
        .collect::<Result<Vec<_>>>()?;
    for builtin in vocabulary.context(context).builtins.iter() {
        specs.push(VariableSpec::resolve(&parse_variable(builtin)?, context)?);
    }
    let mut seen = HashSet::new();
    for spec in specs.iter() {
        if !seen.insert(spec.name.as_str()) {
            return Err(CompileError::semantic(format!(
                "variable {} redefined",
                spec.name
            )));
        }
    }
    Ok(specs)
}
