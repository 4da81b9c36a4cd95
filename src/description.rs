use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{ModelError, Network, Neuron, PopulationId, Synapse};
use crate::vocabulary::Vocabulary;

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("invalid description: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("population {0} is defined twice")]
    DuplicatePopulation(String),
    #[error("connection {index} refers to unknown population {name}")]
    UnknownPopulation { index: usize, name: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    pub variables: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationSection {
    pub name: String,
    pub size: usize,
    #[serde(default)]
    pub neuron: Neuron,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    pub pre: String,
    pub post: String,
    #[serde(default)]
    pub synapse: Synapse,
}

/// A whole network written as TOML, with populations named instead of numbered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Description {
    pub network: NetworkSection,
    #[serde(rename = "population")]
    pub populations: Vec<PopulationSection>,
    #[serde(rename = "connection")]
    pub connections: Vec<ConnectionSection>,
    pub vocabulary: Vocabulary,
}

impl FromStr for Description {
    type Err = DescriptionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(text)?)
    }
}

impl Description {
    /// Registers every population and connection, in file order.
    pub fn to_network(&self) -> Result<Network, DescriptionError> {
        let mut network = Network::new(self.network.variables.as_str());
        let mut ids: HashMap<&str, PopulationId> = HashMap::new();
        for population in self.populations.iter() {
            let id = network.add_population(population.size, population.neuron.clone())?;
            if ids.insert(population.name.as_str(), id).is_some() {
                return Err(DescriptionError::DuplicatePopulation(
                    population.name.clone(),
                ));
            }
        }
        for (index, connection) in self.connections.iter().enumerate() {
            let lookup = |name: &str| {
                ids.get(name)
                    .copied()
                    .ok_or_else(|| DescriptionError::UnknownPopulation {
                        index,
                        name: name.to_string(),
                    })
            };
            let pre = lookup(&connection.pre)?;
            let post = lookup(&connection.post)?;
            network.add_connection(pre, post, connection.synapse.clone())?;
        }
        Ok(network)
    }
}
