use std::fmt;

use itertools::Itertools;

use super::tree::{Node, Operands};
use super::{Scope, VariableContext, VariableSpec};
use crate::ast::Owner;
use crate::model::PopulationId;

/// Indexed form of a variable inside its own entity's loop.
pub fn render_variable(spec: &VariableSpec) -> String {
    match (spec.scope, spec.context) {
        (Scope::Shared, _) | (_, VariableContext::Network) => spec.name.clone(),
        (Scope::Local, VariableContext::Neuron) => format!("{}[i]", spec.name),
        (Scope::Local, VariableContext::Synapse) => format!("{}[i][j]", spec.name),
    }
}

/// Form of a variable owned by the pre- or post-synaptic population of the
/// connection being rendered.
pub fn render_owned(population: PopulationId, owner: Owner, spec: &VariableSpec) -> String {
    match (spec.scope, spec.context) {
        (Scope::Local, VariableContext::Neuron) => {
            format!("{}.{}[{}]", population, spec.name, owner.rank())
        }
        _ => format!("{}.{}", population, spec.name),
    }
}

/// Temporary holding the derivative of `name` during one update.
pub fn render_derivative(name: &str) -> String {
    format!("_{name}")
}

fn write_child(f: &mut fmt::Formatter, child: &Node, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

fn is_comparison(node: &Node) -> bool {
    matches!(node, Node::BinaryOperator(o) if o.op.is_comparison())
}

// comparisons do not chain, so a comparison under another always keeps its parens
fn write_infix(f: &mut fmt::Formatter, operands: &Operands) -> fmt::Result {
    let precedence = operands.op.precedence();
    let nested = |child: &Node| operands.op.is_comparison() && is_comparison(child);
    write_child(
        f,
        &operands.left,
        operands.left.precedence() < precedence || nested(&operands.left),
    )?;
    write!(f, " {} ", operands.op)?;
    write_child(
        f,
        &operands.right,
        operands.right.precedence() <= precedence || nested(&operands.right),
    )
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Add(operands) | Node::Mul(operands) | Node::BinaryOperator(operands) => {
                write_infix(f, operands)
            }
            Node::Pow(base, exponent) => write!(f, "pow({base}, {exponent})"),
            Node::Unary(op, child) => {
                let child_text = if child.precedence() < self.precedence() {
                    format!("({child})")
                } else {
                    child.to_string()
                };
                // keep `- -x` from printing as a decrement
                let sep = if child_text.starts_with(op.as_str()) {
                    " "
                } else {
                    ""
                };
                write!(f, "{}{}{}", op.as_str(), sep, child_text)
            }
            Node::Derivative(symbol) => write!(f, "{}", render_derivative(&symbol.name)),
            Node::Proprietorship(p) => match &p.display {
                Some(display) => write!(f, "{display}"),
                None => write!(f, "{}.{}", p.owner, p.variable.name),
            },
            Node::Variable(symbol) => match &symbol.spec {
                Some(spec) => write!(f, "{}", render_variable(spec)),
                None => write!(f, "{}", symbol.name),
            },
            Node::Numeral(numeral) => write!(f, "{}", numeral.text),
            Node::Function(function) => {
                write!(f, "{}({})", function.name, function.params.iter().join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::tree::{extract_expression, Symbol};
    use crate::compiler::{SymbolTable, Variability, VariableType};

    fn spec(name: &str, scope: Scope, context: VariableContext) -> VariableSpec {
        VariableSpec {
            name: name.to_string(),
            init: "0".to_string(),
            var_type: VariableType::Float,
            variability: Variability::Variable,
            scope,
            context,
        }
    }

    macro_rules! variable_tests {
        ($($name:ident: $scope:ident $context:ident => $expect:literal,)*) => {
        $(
            #[test]
            fn $name() {
                let spec = spec("v", Scope::$scope, VariableContext::$context);
                assert_eq!(render_variable(&spec), $expect);
            }
        )*
        }
    }

    variable_tests!(
        neuron_local: Local Neuron => "v[i]",
        neuron_shared: Shared Neuron => "v",
        synapse_local: Local Synapse => "v[i][j]",
        synapse_shared: Shared Synapse => "v",
        network: Local Network => "v",
    );

    #[test]
    fn owned_uses_owner_rules() {
        let local = spec("v", Scope::Local, VariableContext::Neuron);
        let shared = spec("w", Scope::Shared, VariableContext::Neuron);
        assert_eq!(
            render_owned(PopulationId(1), Owner::Post, &local),
            "population1.v[rank_post]"
        );
        assert_eq!(
            render_owned(PopulationId(0), Owner::Pre, &local),
            "population0.v[rank_pre]"
        );
        assert_eq!(render_owned(PopulationId(0), Owner::Pre, &shared), "population0.w");
    }

    macro_rules! display_tests {
        ($($name:ident: $text:literal => $expect:literal,)*) => {
        $(
            #[test]
            fn $name() {
                let node = extract_expression($text, &SymbolTable::new()).unwrap();
                assert_eq!(node.to_string(), $expect);
            }
        )*
        }
    }

    display_tests!(
        minimal_parens: "(a + b) * c" => "(a + b) * c",
        redundant_parens_dropped: "((a)) + (b * c)" => "a + b * c",
        right_operand_keeps_parens: "a - (b - c)" => "a - (b - c)",
        left_assoc_no_parens: "(a - b) - c" => "a - b - c",
        pow_as_call: "x ^ 2 + y ** z" => "pow(x, 2) + pow(y, z)",
        neg_pow: "-x ^ 2" => "-pow(x, 2)",
        neg_sum: "-(a + b)" => "-(a + b)",
        double_negation: "- -x" => "- -x",
        logic: "v > 1 & !(u <= 2) | t == 0" => "v > 1 && !(u <= 2) || t == 0",
        numerals_verbatim: "1.50 * 2e3" => "1.50 * 2e3",
        function_call: "Normal(0, -1.5)" => "Normal(0, -1.5)",
        unresolved_ownership: "_post_v" => "post.v",
        equality_left_of_relational: "(a == b) > c" => "(a == b) > c",
        relational_left_of_equality: "(a < b) == c" => "(a < b) == c",
        relational_chain: "(a < b) < c" => "(a < b) < c",
        relational_right: "a != (b >= c)" => "a != (b >= c)",
        comparison_in_logic: "(a == b) && (c < d)" => "a == b && c < d",
    );

    #[test]
    fn nested_comparison_reparses() {
        let symbols = SymbolTable::new();
        for text in ["(a == b) > c", "(a < b) < c", "x != (y == z)"] {
            let rendered = extract_expression(text, &symbols).unwrap().to_string();
            let again = extract_expression(&rendered, &symbols).unwrap();
            assert_eq!(again.to_string(), rendered);
        }
    }

    #[test]
    fn resolved_nodes() {
        let node = Node::Add(Operands {
            op: crate::ast::BinaryOp::Add,
            left: Box::new(Node::Variable(Symbol {
                name: "v".to_string(),
                spec: Some(spec("v", Scope::Local, VariableContext::Neuron)),
            })),
            right: Box::new(Node::Derivative(Symbol::new("w"))),
        });
        assert_eq!(node.to_string(), "v[i] + _w");
    }
}
