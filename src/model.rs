use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::compiler::{CompiledNetwork, Compiler};
use crate::error::Result;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopulationId(pub usize);

impl PopulationId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "population{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub usize);

impl ConnectionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "connection{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown population {0}")]
    UnknownPopulation(PopulationId),
    #[error("population size must be positive")]
    EmptyPopulation,
}

/// DSL text describing one neuron model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Neuron {
    pub variables: String,
    pub equations: String,
    pub spike: String,
    pub reset: String,
}

/// DSL text describing one synapse model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Synapse {
    pub variables: String,
    pub equations: String,
    pub pre_spike: String,
    pub post_spike: String,
}

#[derive(Debug, Clone)]
pub struct Population {
    pub id: PopulationId,
    pub size: usize,
    pub neuron: Neuron,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub pre: PopulationId,
    pub post: PopulationId,
    pub synapse: Synapse,
}

/// Owns every population and connection and hands out their ids in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct Network {
    variables: String,
    populations: Vec<Population>,
    connections: Vec<Connection>,
}

impl Network {
    pub fn new(variables: impl Into<String>) -> Self {
        Self {
            variables: variables.into(),
            populations: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn variables(&self) -> &str {
        &self.variables
    }

    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn population(&self, id: PopulationId) -> Option<&Population> {
        self.populations.get(id.index())
    }

    pub fn add_population(
        &mut self,
        size: usize,
        neuron: Neuron,
    ) -> std::result::Result<PopulationId, ModelError> {
        if size == 0 {
            return Err(ModelError::EmptyPopulation);
        }
        let id = PopulationId(self.populations.len());
        self.populations.push(Population { id, size, neuron });
        Ok(id)
    }

    pub fn add_connection(
        &mut self,
        pre: PopulationId,
        post: PopulationId,
        synapse: Synapse,
    ) -> std::result::Result<ConnectionId, ModelError> {
        for id in [pre, post] {
            if self.population(id).is_none() {
                return Err(ModelError::UnknownPopulation(id));
            }
        }
        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection {
            id,
            pre,
            post,
            synapse,
        });
        Ok(id)
    }

    pub fn compile(&self) -> Result<CompiledNetwork> {
        self.compile_with(&Vocabulary::default())
    }

    pub fn compile_with(&self, vocabulary: &Vocabulary) -> Result<CompiledNetwork> {
        Compiler::new(vocabulary).compile(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_registration_order() {
        let mut network = Network::new("");
        let a = network.add_population(10, Neuron::default()).unwrap();
        let b = network.add_population(5, Neuron::default()).unwrap();
        assert_eq!((a, b), (PopulationId(0), PopulationId(1)));
        let c = network.add_connection(b, a, Synapse::default()).unwrap();
        assert_eq!(c, ConnectionId(0));
        assert_eq!(network.connections()[0].pre, b);
        assert_eq!(a.to_string(), "population0");
        assert_eq!(c.to_string(), "connection0");
    }

    #[test]
    fn argument_validation() {
        let mut network = Network::new("");
        assert_eq!(
            network.add_population(0, Neuron::default()),
            Err(ModelError::EmptyPopulation)
        );
        let a = network.add_population(1, Neuron::default()).unwrap();
        assert_eq!(
            network.add_connection(a, PopulationId(3), Synapse::default()),
            Err(ModelError::UnknownPopulation(PopulationId(3)))
        );
        assert!(network.connections().is_empty());
    }
}
