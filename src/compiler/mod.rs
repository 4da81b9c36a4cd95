pub mod compiled;
pub mod equation;
pub mod render;
pub mod semantic;
pub mod symbol_table;
pub mod tree;
pub mod variable;

pub use compiled::{CompiledConnection, CompiledNetwork, CompiledPopulation};
pub use equation::{Equation, EquationKind, Target};
pub use render::{render_owned, render_variable};
pub use semantic::{check_required, Block, Compiler, TraversalContext};
pub use symbol_table::{ScopeSnapshot, SymbolTable};
pub use tree::{extract, extract_expression, Node};
pub use variable::{
    build_variable_specs, Scope, Variability, VariableContext, VariableSpec, VariableType,
};
