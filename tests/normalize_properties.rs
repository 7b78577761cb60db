//! End-to-end properties of graph normalization

mod common;

use common::{kick, kick_with_gain, normalizer, palette};
use patchcode::chain::NormalizedChain;
use patchcode::collapse::Collapser;
use patchcode::config::FanOutPolicy;
use patchcode::diagnostics::Diagnostic;
use patchcode::graph::{Graph, Node};
use patchcode::{Normalizer, NormalizerConfig};

#[test]
fn test_orphans_never_reach_the_output() {
    let graph = kick_with_gain(0.5)
        .with_node(Node::new("lonely", "drums").with_property("sound", "hh*8"));
    let result = normalizer().normalize_graph(&graph);

    assert!(result.success);
    assert_eq!(result.code, r#"s("bd*2 sd").gain(0.5)"#);
    assert!(!result.code.contains("hh*8"));
    assert_eq!(result.metadata.unwrap().input_chains, 1);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_graph_with_only_orphans_is_empty_code() {
    let graph = Graph::new().with_node(kick());
    let result = normalizer().normalize_graph(&graph);
    assert!(result.success);
    assert_eq!(result.code, "");
    assert!(result.chains.is_empty());
}

#[test]
fn test_cycles_are_rejected() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("a", "gain").with_property("gain", 0.5))
        .with_node(Node::new("b", "lpf").with_property("lpf", 500.0))
        .chain(&["kick", "a", "b", "a"]);
    let result = normalizer().normalize_graph(&graph);

    assert!(!result.success);
    assert_eq!(result.code, "");
    assert!(result.metadata.is_none());
    assert!(result.chains.is_empty());
    assert!(result.error.unwrap().to_lowercase().contains("cycle"));
}

#[test]
fn test_effects_follow_stage_order_not_wiring_order() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("verb", "room").with_property("room", 0.4))
        .with_node(Node::new("filter", "lpf").with_property("lpf", 2000.0))
        .with_node(Node::new("speedup", "fast").with_property("fast", 2.0))
        .chain(&["kick", "verb", "filter", "speedup"]);
    let result = normalizer().normalize_graph(&graph);
    assert_eq!(result.code, r#"s("bd*2 sd").fast(2).lpf(2000).room(0.4)"#);
}

#[test]
fn test_equal_stages_keep_wiring_order() {
    let lpf = Node::new("l", "lpf").with_property("lpf", 2000.0);
    let hpf = Node::new("h", "hpf").with_property("hpf", 300.0);

    let lpf_first = Graph::new()
        .with_node(kick())
        .with_node(lpf.clone())
        .with_node(hpf.clone())
        .chain(&["kick", "l", "h"]);
    let hpf_first = Graph::new()
        .with_node(kick())
        .with_node(lpf)
        .with_node(hpf)
        .chain(&["kick", "h", "l"]);

    assert_eq!(
        normalizer().normalize_graph(&lpf_first).code,
        r#"s("bd*2 sd").lpf(2000).hpf(300)"#
    );
    assert_eq!(
        normalizer().normalize_graph(&hpf_first).code,
        r#"s("bd*2 sd").hpf(300).lpf(2000)"#
    );
}

#[test]
fn test_gains_multiplying_to_one_vanish() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("g1", "gain").with_property("gain", 0.5))
        .with_node(Node::new("g2", "gain").with_property("gain", 2.0))
        .chain(&["kick", "g1", "g2"]);
    let result = normalizer().normalize_graph(&graph);

    assert_eq!(result.code, r#"s("bd*2 sd")"#);
    assert!(!result.code.contains("gain"));
    assert_eq!(result.metadata.unwrap().rules_applied, vec!["gain".to_string()]);
}

#[test]
fn test_last_pan_wins() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("p1", "pan").with_property("pan", -0.3))
        .with_node(Node::new("p2", "pan").with_property("pan", 0.2))
        .chain(&["kick", "p1", "p2"]);
    let result = normalizer().normalize_graph(&graph);

    assert_eq!(result.code, r#"s("bd*2 sd").pan(0.2)"#);
    assert!(!result.code.contains("-0.3"));
}

#[test]
fn test_outermost_wrapper_encloses_everything() {
    // [source, effectA, wrapperX, effectB, wrapperY]
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("a", "gain").with_property("gain", 0.8))
        .with_node(Node::new("x", "chop").with_property("chop", 4.0))
        .with_node(Node::new("b", "lpf").with_property("lpf", 1000.0))
        .with_node(Node::new("y", "jux").with_property("jux", "rev"))
        .chain(&["kick", "a", "x", "b", "y"]);
    let result = normalizer().normalize_graph(&graph);

    assert!(result.success);
    assert_eq!(
        result.code,
        r#"jux(s("bd*2 sd").gain(0.8).lpf(1000).chop(4), "rev")"#
    );

    let wrapped = result.chains[0].as_wrapped().unwrap();
    assert_eq!(wrapped.wrapper.id, "y");
    assert_eq!(wrapped.outer_chain.ids(), vec!["y"]);
}

#[test]
fn test_collapse_is_idempotent_on_pipeline_output() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("g1", "gain").with_property("gain", 0.9))
        .with_node(Node::new("l", "lpf").with_property("lpf", 1500.0))
        .with_node(Node::new("p", "pan").with_property("pan", 0.0))
        .with_node(Node::new("g2", "gain").with_property("gain", 0.5))
        .chain(&["kick", "g1", "l", "p", "g2"]);
    let result = normalizer().normalize_graph(&graph);
    let chain = result.chains[0].as_plain().unwrap();
    assert_eq!(chain.len(), 2);

    let config = NormalizerConfig::default();
    let again = Collapser::new(&config).collapse_chain(chain, None).unwrap();
    assert_eq!(&again, chain);

    let again = Collapser::new(&config)
        .collapse(result.chains[0].clone())
        .unwrap();
    assert_eq!(again, result.chains[0]);
}

#[test]
fn test_collapse_is_idempotent_with_two_wrappers_of_one_type() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("x", "jux").with_property("jux", "rev"))
        .with_node(Node::new("y", "jux").with_property("jux", "press"))
        .chain(&["kick", "x", "y"]);
    let result = normalizer().normalize_graph(&graph);
    assert_eq!(result.code, r#"jux(s("bd*2 sd").jux("rev"), "press")"#);

    let config = NormalizerConfig::default();
    let again = Collapser::new(&config)
        .collapse(result.chains[0].clone())
        .unwrap();
    assert_eq!(again, result.chains[0]);
}

#[test]
fn test_huge_gain_renders_as_a_finite_literal() {
    let result = normalizer().normalize_graph(&kick_with_gain(1e300));
    assert!(result.success);
    assert!(!result.code.contains("inf"));
    assert!(result.code.starts_with(r#"s("bd*2 sd").gain(1000000"#));
}

#[test]
fn test_overflowing_gain_product_fails_cleanly() {
    let graph = kick_with_gain(1e200)
        .with_node(Node::new("g2", "gain").with_property("gain", 1e200))
        .connect("g", "g2");
    let result = normalizer().normalize_graph(&graph);
    assert!(!result.success);
    assert_eq!(result.code, "");
    assert!(result.error.unwrap().contains("'gain'"));
}

#[test]
fn test_source_properties_outside_the_argument_are_reported() {
    let graph = Graph::new()
        .with_node(kick().with_property("gain", 0.5))
        .with_node(Node::new("r", "room").with_property("room", 0.2))
        .connect("kick", "r");
    let result = normalizer().normalize_graph(&graph);
    assert!(result.success);
    assert_eq!(result.code, r#"s("bd*2 sd").room(0.2)"#);
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::HeadPropertiesDropped {
            node: "kick".to_string(),
            properties: vec!["gain".to_string()],
        }]
    );
}

#[test]
fn test_identical_graphs_give_identical_output() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("verb", "room").with_property("room", 0.4))
        .with_node(Node::new("y", "jux").with_property("jux", "rev"))
        .with_node(Node::new("g", "gain").with_property("gain", 0.7))
        .chain(&["kick", "y", "verb", "g"]);
    let normalizer = normalizer();

    let first = normalizer.normalize_graph(&graph);
    let second = normalizer.normalize_graph(&graph);
    assert_eq!(first.code, second.code);
    assert_eq!(first.chains, second.chains);
    assert_eq!(
        first.metadata.unwrap().fingerprint,
        second.metadata.unwrap().fingerprint
    );
}

#[test]
fn test_node_list_order_does_not_change_a_chain() {
    let nodes = vec![
        kick(),
        Node::new("verb", "room").with_property("room", 0.4),
        Node::new("g", "gain").with_property("gain", 0.7),
        Node::new("f", "fast").with_property("fast", 2.0),
    ];
    let mut reversed = nodes.clone();
    reversed.reverse();

    let wiring = ["kick", "verb", "g", "f"];
    let forward = Graph { nodes, connections: Vec::new() }.chain(&wiring);
    let backward = Graph { nodes: reversed, connections: Vec::new() }.chain(&wiring);

    let normalizer = normalizer();
    assert_eq!(
        normalizer.normalize_graph(&forward).code,
        normalizer.normalize_graph(&backward).code
    );
}

#[test]
fn test_independent_sources_are_space_joined() {
    let lead = || {
        Graph::new()
            .with_node(Node::new("lead", "synth").with_property("notes", "c e g"))
            .with_node(Node::new("verb", "room").with_property("room", 0.6))
            .connect("lead", "verb")
    };

    let first = normalizer().normalize_graph(&kick_with_gain(0.5)).code;
    let second = normalizer().normalize_graph(&lead()).code;

    let mut both = kick_with_gain(0.5);
    let other = lead();
    both.nodes.extend(other.nodes);
    both.connections.extend(other.connections);

    let result = normalizer().normalize_graph(&both);
    assert_eq!(result.code, format!("{} {}", first, second));
    assert_eq!(result.code, r#"s("bd*2 sd").gain(0.5) note("c e g").room(0.6)"#);
    assert_eq!(result.metadata.unwrap().input_chains, 2);
}

#[test]
fn test_fan_out_is_reported_not_silently_dropped() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("g", "gain").with_property("gain", 0.5))
        .with_node(Node::new("l", "lpf").with_property("lpf", 400.0))
        .connect("kick", "g")
        .connect("kick", "l");
    let result = normalizer().normalize_graph(&graph);

    assert!(result.success);
    assert_eq!(result.code, r#"s("bd*2 sd").gain(0.5)"#);
    assert!(result.diagnostics.contains(&Diagnostic::StrandedNode {
        node: "l".to_string()
    }));

    let strict = Normalizer::new(
        palette(),
        NormalizerConfig::default().with_fan_out(FanOutPolicy::Reject),
    );
    let result = strict.normalize_graph(&graph);
    assert!(!result.success);
    assert!(result.error.unwrap().contains("fans out"));
}

#[test]
fn test_unknown_node_type_is_recovered() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("mystery", "granulator").with_property("grain", 0.1))
        .with_node(Node::new("l", "lpf").with_property("lpf", 700.0))
        .chain(&["kick", "l", "mystery"]);
    let result = normalizer().normalize_graph(&graph);

    assert!(result.success);
    // Unknown stage sorts at 50, ahead of the spectral filter
    assert_eq!(result.code, r#"s("bd*2 sd").grain(0.1).lpf(700)"#);
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::SchemaLookupMissing {
            node: "mystery".to_string(),
            node_type: "granulator".to_string(),
        }]
    );
}

#[test]
fn test_malformed_property_fails_cleanly() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("g", "gain").with_property("gain", serde_json::json!({ "db": -6 })))
        .connect("kick", "g");
    let result = normalizer().normalize_graph(&graph);

    assert!(!result.success);
    assert_eq!(result.code, "");
    assert!(result.chains.is_empty());
    assert!(result.error.unwrap().contains("Malformed property 'gain'"));
}

#[test]
fn test_result_serializes_with_camel_case_keys() {
    let result = normalizer().normalize_graph(&kick_with_gain(0.5));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["inputChains"], 1);
    assert_eq!(json["metadata"]["outputPattern"], result.code);
    assert_eq!(json["metadata"]["rulesApplied"][0], "gain");
    assert_eq!(json["chains"][0]["kind"], "plain");
    assert!(json.get("error").is_none());

    let back: patchcode::NormalizationResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_failed_result_serializes_null_metadata() {
    let graph = Graph::new()
        .with_node(kick())
        .with_node(Node::new("g", "gain"))
        .chain(&["kick", "g", "kick"]);
    let json = serde_json::to_value(normalizer().normalize_graph(&graph)).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["metadata"].is_null());
    assert_eq!(json["chains"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_chain_kinds_in_result() {
    let result = normalizer().normalize_graph(&kick_with_gain(0.25));
    assert!(matches!(result.chains[0], NormalizedChain::Plain(_)));
}
