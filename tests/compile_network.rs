use neurodsl::compiler::{build_variable_specs, VariableContext};
use neurodsl::{CompileError, EquationKind, Network, Neuron, Synapse, Vocabulary};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn neuron(variables: &str, equations: &str, spike: &str, reset: &str) -> Neuron {
    Neuron {
        variables: variables.to_string(),
        equations: equations.to_string(),
        spike: spike.to_string(),
        reset: reset.to_string(),
    }
}

fn synapse(variables: &str, equations: &str) -> Synapse {
    Synapse {
        variables: variables.to_string(),
        equations: equations.to_string(),
        ..Default::default()
    }
}

fn single_population(n: Neuron) -> Result<neurodsl::CompiledNetwork, CompileError> {
    init_logging();
    let mut network = Network::new("");
    network.add_population(10, n).unwrap();
    network.compile()
}

// pre population has `v` local and `w` shared, post has `v` local
fn connected(s: Synapse) -> Result<neurodsl::CompiledNetwork, CompileError> {
    init_logging();
    let mut network = Network::new("");
    let pre = network
        .add_population(4, neuron("v = 0\nw = 2 : shared", "", "", ""))
        .unwrap();
    let post = network
        .add_population(3, neuron("v = 0 : local", "", "", ""))
        .unwrap();
    network.add_connection(pre, post, s).unwrap();
    network.compile()
}

#[test]
fn scenario_a_neuron_update_spike_reset() {
    let compiled = single_population(neuron("v = 0 : local", "v = v + 0.1", "(v > 5)", "v = 3"))
        .unwrap();
    let population = &compiled.populations[0];

    assert_eq!(population.equations.len(), 1);
    assert_eq!(population.equations[0].kind, EquationKind::Simple);
    assert_eq!(population.equations[0].to_string(), "v[i] = v[i] + 0.1");

    let spike = population.spike.as_ref().unwrap();
    assert_eq!(spike.kind, EquationKind::Spike);
    assert_eq!(spike.to_string(), "v[i] > 5");

    assert_eq!(population.reset.len(), 1);
    assert_eq!(population.reset[0].kind, EquationKind::Reset);
    assert_eq!(population.reset[0].to_string(), "v[i] = 3");
}

#[test]
fn scenario_b_constant_cannot_be_derived() {
    let err = connected(synapse("tau = 12 : constant\nw = 1", "dtau/dt = 1")).unwrap_err();
    assert!(err.is_semantic(), "{err}");
    assert!(err.has_error_contains("tau"), "{err}");
}

#[test]
fn scenario_c_ownership_uses_owner_scope() {
    let compiled = connected(synapse("w = 1\nx = 0", "x = post.v + pre.w")).unwrap();
    let connection = &compiled.connections[0];
    assert_eq!(
        connection.equations[0].expression.to_string(),
        "population1.v[rank_post] + population0.w"
    );
    assert_eq!(
        connection.equations[0].to_string(),
        "x[i][j] = population1.v[rank_post] + population0.w"
    );
}

#[test]
fn scenario_d_conflicting_scope_before_equations() {
    // the equation is malformed too, but variables are checked first
    let err = single_population(neuron("x = 0 : local shared", "x 1", "", "")).unwrap_err();
    assert!(err.is_semantic(), "{err}");
    assert!(err.has_error_contains("x"));
}

#[test]
fn ode_on_constant_never_compiles() {
    for (variables, equations) in [
        ("tau = 1 : constant", "dtau/dt = 1"),
        ("tau = 1 : constant shared", "dtau/dt = -tau"),
        ("tau = 1 : integer constant", "dtau / dt = 0"),
    ] {
        let err = single_population(neuron(variables, equations, "", "")).unwrap_err();
        assert!(err.is_semantic(), "{err}");
        assert!(err.has_error_contains("cannot derive constant variable: tau"));
    }
}

#[test]
fn reset_never_holds_an_ode() {
    let err = single_population(neuron("v = 0", "", "v > 1", "v = 0\ndv/dt = 1")).unwrap_err();
    assert!(err.is_semantic());
    assert!(err.has_error_contains("reset block cannot contain an ODE"));
}

#[test]
fn population_shadows_network() {
    init_logging();
    let mut network = Network::new("v = 1\ndelay = 2");
    network
        .add_population(2, neuron("v = 0", "v = v + delay", "", ""))
        .unwrap();
    let compiled = network.compile().unwrap();
    assert_eq!(compiled.variables.len(), 2);
    assert_eq!(
        compiled.populations[0].equations[0].to_string(),
        "v[i] = v[i] + delay"
    );
}

#[test]
fn owner_is_resolved_even_when_shadowed_locally() {
    let compiled = connected(synapse("w = 1\nv = 5 : shared", "v = post.v * v")).unwrap();
    assert_eq!(
        compiled.connections[0].equations[0].to_string(),
        "v = population1.v[rank_post] * v"
    );
}

#[test]
fn syntax_errors_name_the_line() {
    let err = single_population(neuron("v = 0", "v = v + 1\nv 1", "", "")).unwrap_err();
    assert!(err.is_syntax(), "{err}");
    assert!(err.has_error_contains("`v 1`"));

    let err = single_population(neuron("v = 0", "v = (v + 1", "", "")).unwrap_err();
    assert!(err.is_syntax(), "{err}");
}

#[test]
fn variables_round_trip_through_display() {
    let vocabulary = Vocabulary::default();
    let text = "a = 1\nb = -2.5 : constant\nc = 3 : shared double\nd = 4e2 : integer variable";
    let specs = build_variable_specs(text, VariableContext::Neuron, &vocabulary).unwrap();
    // skip the builtin conductance, it is appended again on rebuild
    let user = &specs[..specs.len() - 1];
    let listing = user.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("\n");
    let again = build_variable_specs(&listing, VariableContext::Neuron, &vocabulary).unwrap();
    assert_eq!(specs, again);
}

#[test]
fn connection_blocks() {
    let compiled = connected(Synapse {
        pre_spike: "post.v += w; x = 0".to_string(),
        post_spike: "w *= 0.5".to_string(),
        ..synapse("w = 1 : shared\nx = 0", "dx/dt = -x + Normal(0, 1)")
    })
    .unwrap();
    let connection = &compiled.connections[0];
    assert_eq!(
        connection.equations[0].to_string(),
        "dx/dt = -x[i][j] + Normal(0, 1)"
    );
    assert!(connection.equations[0].is_ode());
    assert_eq!(
        connection
            .pre_spike
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>(),
        vec![
            "population1.v[rank_post] = population1.v[rank_post] + w",
            "x[i][j] = 0"
        ]
    );
    assert_eq!(connection.post_spike[0].to_string(), "w = w * 0.5");
}

#[test]
fn listing_mentions_every_entity() {
    let compiled = connected(synapse("w = 1", "w = w + pre.w")).unwrap();
    let listing = compiled.to_string();
    assert!(listing.starts_with("network\n"));
    assert!(listing.contains("population0 (size 4)"));
    assert!(listing.contains("population1 (size 3)"));
    assert!(listing.contains("connection0 (population0 -> population1)"));
    assert!(listing.contains("w[i][j] = w[i][j] + population0.w"));
}

#[test]
fn custom_vocabulary_allows_new_functions() {
    init_logging();
    let mut vocabulary = Vocabulary::default();
    vocabulary.functions.insert("Poisson".to_string());
    let mut network = Network::new("");
    network
        .add_population(1, neuron("v = 0", "v = Poisson(1, 2)", "", ""))
        .unwrap();
    assert!(network.compile().is_err());
    let compiled = network.compile_with(&vocabulary).unwrap();
    assert_eq!(
        compiled.populations[0].equations[0].to_string(),
        "v[i] = Poisson(1, 2)"
    );
}
