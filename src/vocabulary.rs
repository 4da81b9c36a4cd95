use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::compiler::VariableContext;

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Name rules that apply to one kind of entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextNames {
    /// Names a user may not declare.
    pub forbidden: BTreeSet<String>,
    /// Names a user must declare.
    pub required: BTreeSet<String>,
    /// Variable statements appended to every entity of this kind, e.g.
    /// `g_exc = 0 : float variable local`.
    pub builtins: Vec<String>,
}

/// Every name set the compiler consults. Loaded from the `[vocabulary]`
/// table of a description file; each missing field, including a single field
/// of a context table, falls back to [Vocabulary::default].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VocabularyFile")]
pub struct Vocabulary {
    pub network: ContextNames,
    pub neuron: ContextNames,
    pub synapse: ContextNames,
    pub reserved: BTreeSet<String>,
    /// Names always readable from any equation without a declaration.
    pub internal: BTreeSet<String>,
    /// Stochastic functions callable as `NAME(NUM, NUM)`.
    pub functions: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ContextNamesFile {
    forbidden: Option<BTreeSet<String>>,
    required: Option<BTreeSet<String>>,
    builtins: Option<Vec<String>>,
}

impl ContextNamesFile {
    fn merge(self, defaults: ContextNames) -> ContextNames {
        ContextNames {
            forbidden: self.forbidden.unwrap_or(defaults.forbidden),
            required: self.required.unwrap_or(defaults.required),
            builtins: self.builtins.unwrap_or(defaults.builtins),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct VocabularyFile {
    network: ContextNamesFile,
    neuron: ContextNamesFile,
    synapse: ContextNamesFile,
    reserved: Option<BTreeSet<String>>,
    internal: Option<BTreeSet<String>>,
    functions: Option<BTreeSet<String>>,
}

impl From<VocabularyFile> for Vocabulary {
    fn from(file: VocabularyFile) -> Self {
        let defaults = Vocabulary::default();
        Self {
            network: file.network.merge(defaults.network),
            neuron: file.neuron.merge(defaults.neuron),
            synapse: file.synapse.merge(defaults.synapse),
            reserved: file.reserved.unwrap_or(defaults.reserved),
            internal: file.internal.unwrap_or(defaults.internal),
            functions: file.functions.unwrap_or(defaults.functions),
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            network: ContextNames {
                forbidden: names(&["t", "dt"]),
                ..Default::default()
            },
            neuron: ContextNames {
                forbidden: names(&["t", "dt", "size", "last_spike", "spiked", "r", "g_exc"]),
                required: BTreeSet::new(),
                builtins: vec!["g_exc = 0 : float variable local".to_string()],
            },
            synapse: ContextNames {
                forbidden: names(&[
                    "t",
                    "dt",
                    "size",
                    "post_rank",
                    "pre_rank",
                    "inv_pre_rank",
                    "inv_post_rank",
                ]),
                required: names(&["w"]),
                builtins: Vec::new(),
            },
            reserved: names(&[
                "population",
                "connection",
                "neuron",
                "synapse",
                "spike",
                "reset",
                "const",
                "int",
                "double",
                "float",
                "pre",
                "post",
            ]),
            internal: names(&["t", "g_exc"]),
            functions: names(&["Normal", "Uniform"]),
        }
    }
}

impl Vocabulary {
    pub fn context(&self, context: VariableContext) -> &ContextNames {
        match context {
            VariableContext::Network => &self.network,
            VariableContext::Neuron => &self.neuron,
            VariableContext::Synapse => &self.synapse,
        }
    }

    pub fn is_forbidden(&self, context: VariableContext, name: &str) -> bool {
        self.context(context).forbidden.contains(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    pub fn is_internal(&self, name: &str) -> bool {
        self.internal.contains(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sets() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_forbidden(VariableContext::Neuron, "g_exc"));
        assert!(vocab.is_forbidden(VariableContext::Synapse, "pre_rank"));
        assert!(!vocab.is_forbidden(VariableContext::Network, "size"));
        assert!(vocab.is_reserved("post"));
        assert!(vocab.is_internal("t"));
        assert!(vocab.is_function("Uniform"));
        assert!(!vocab.is_function("uniform"));
        assert!(vocab.synapse.required.contains("w"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let vocab: Vocabulary = toml::from_str(
            r#"
            functions = ["Normal", "Uniform", "Poisson"]

            [synapse]
            required = []
            "#,
        )
        .unwrap();
        assert!(vocab.is_function("Poisson"));
        assert!(vocab.synapse.required.is_empty());
        assert_eq!(vocab.synapse.forbidden, Vocabulary::default().synapse.forbidden);
        assert_eq!(vocab.neuron, Vocabulary::default().neuron);
    }

    #[test]
    fn overriding_required_keeps_forbidden() {
        let vocab: Vocabulary = toml::from_str("[synapse]\nrequired = [\"w\", \"g\"]").unwrap();
        assert!(vocab.synapse.required.contains("g"));
        assert!(vocab.is_forbidden(VariableContext::Synapse, "pre_rank"));
        let err = crate::compiler::build_variable_specs(
            "pre_rank = 0\nw = 1\ng = 0",
            VariableContext::Synapse,
            &vocab,
        )
        .unwrap_err();
        assert!(err.has_error_contains("pre_rank"), "{err}");
    }

    #[test]
    fn empty_table_is_default() {
        let vocab: Vocabulary = toml::from_str("").unwrap();
        assert_eq!(vocab, Vocabulary::default());
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(toml::from_str::<Vocabulary>("fuctions = [\"Poisson\"]").is_err());
        assert!(toml::from_str::<Vocabulary>("[neuron]\nforbiden = []").is_err());
    }
}
