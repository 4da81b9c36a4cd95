extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod ast;
pub mod compiler;
pub mod description;
pub mod error;
pub mod model;
pub mod parser;
pub mod vocabulary;

pub use compiler::{
    CompiledConnection, CompiledNetwork, CompiledPopulation, Compiler, Equation, EquationKind,
    Node, VariableSpec,
};
pub use description::Description;
pub use error::{CompileError, Result};
pub use model::{ConnectionId, ModelError, Network, Neuron, PopulationId, Synapse};
pub use vocabulary::Vocabulary;

/// Compiles `network` with the default vocabulary.
pub fn compile(network: &Network) -> Result<CompiledNetwork> {
    network.compile()
}
