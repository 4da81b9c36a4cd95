use std::fmt;

use super::{Equation, VariableSpec};
use crate::model::{ConnectionId, PopulationId};

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPopulation {
    pub id: PopulationId,
    pub size: usize,
    pub variables: Vec<VariableSpec>,
    pub equations: Vec<Equation>,
    pub spike: Option<Equation>,
    pub reset: Vec<Equation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConnection {
    pub id: ConnectionId,
    pub pre: PopulationId,
    pub post: PopulationId,
    pub variables: Vec<VariableSpec>,
    pub equations: Vec<Equation>,
    pub pre_spike: Vec<Equation>,
    pub post_spike: Vec<Equation>,
}

/// Everything code generation needs, in the order the model declared it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledNetwork {
    pub variables: Vec<VariableSpec>,
    pub populations: Vec<CompiledPopulation>,
    pub connections: Vec<CompiledConnection>,
}

fn write_section<T: fmt::Display>(f: &mut fmt::Formatter, title: &str, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "  {title}:")?;
    for item in items {
        writeln!(f, "    {item}")?;
    }
    Ok(())
}

impl fmt::Display for CompiledPopulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} (size {})", self.id, self.size)?;
        write_section(f, "variables", &self.variables)?;
        write_section(f, "equations", &self.equations)?;
        if let Some(spike) = &self.spike {
            writeln!(f, "  spike: {spike}")?;
        }
        write_section(f, "reset", &self.reset)
    }
}

impl fmt::Display for CompiledConnection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} ({} -> {})", self.id, self.pre, self.post)?;
        write_section(f, "variables", &self.variables)?;
        write_section(f, "equations", &self.equations)?;
        write_section(f, "pre_spike", &self.pre_spike)?;
        write_section(f, "post_spike", &self.post_spike)
    }
}

impl fmt::Display for CompiledNetwork {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "network")?;
        write_section(f, "variables", &self.variables)?;
        for population in self.populations.iter() {
            write!(f, "{population}")?;
        }
        for connection in self.connections.iter() {
            write!(f, "{connection}")?;
        }
        Ok(())
    }
}
