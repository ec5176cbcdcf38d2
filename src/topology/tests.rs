//! Unit tests for demand-driven binding and forwarding chains.

use std::collections::{BTreeMap, BTreeSet};

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::channel::{ChannelMethod, ChannelSpec, ChannelType};
use crate::spec::{InputSpec, OutputSpec, ProcessorSpec, SubSpec, Workflow, WorkflowSpec};

fn workflow(processors: Vec<ProcessorSpec>) -> Workflow {
    WorkflowSpec::new(processors).validate_and_build().unwrap()
}

fn producer(name: &str, description: &str) -> ProcessorSpec {
    ProcessorSpec::new(name).output(OutputSpec::new("TST", description))
}

fn consumer(name: &str, description: &str) -> ProcessorSpec {
    ProcessorSpec::new(name).input(InputSpec::new("TST", description))
}

fn bind(name: &str, port: u16) -> ChannelSpec {
    ChannelSpec {
        name: name.to_string(),
        method: ChannelMethod::Bind,
        kind: ChannelType::Pub,
        port,
    }
}

fn connect(name: &str, port: u16) -> ChannelSpec {
    ChannelSpec {
        name: name.to_string(),
        method: ChannelMethod::Connect,
        kind: ChannelType::Sub,
        port,
    }
}

/// Check referential integrity and port uniqueness of a compiled topology.
fn assert_well_formed(topology: &Topology) {
    let mut bound: BTreeMap<u16, usize> = BTreeMap::new();
    for (_, c) in topology.channels().filter(|(_, c)| c.is_bind()) {
        *bound.entry(c.port).or_default() += 1;
    }
    for (port, count) in &bound {
        assert_eq!(*count, 1, "port {port} bound more than once");
    }
    for (d, c) in topology.channels().filter(|(_, c)| !c.is_bind()) {
        assert!(
            bound.contains_key(&c.port),
            "{}:{} connects to unbound port {}",
            d.id,
            c.name,
            c.port
        );
    }
}

// ---- Scenarios ----

#[test]
fn test_fan_out_to_two_consumers_forwards_once() {
    let wf = workflow(vec![producer("A", "X"), consumer("B", "X"), consumer("C", "X")]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();

    let a = topology.device("A").unwrap();
    let b = topology.device("B").unwrap();
    let c = topology.device("C").unwrap();

    assert_eq!(a.channels, vec![bind("out_TST_X_0", 22000)]);
    assert_eq!(
        b.channels,
        vec![connect("in_out_TST_X_0", 22000), bind("out_TST_X_1", 22001)]
    );
    assert_eq!(c.channels, vec![connect("in_out_TST_X_1", 22001)]);

    assert_eq!(b.forwards.keys().collect::<Vec<_>>(), vec!["out_TST_X_1"]);
    assert!(c.forwards.is_empty());
    assert_well_formed(&topology);
}

#[test]
fn test_single_consumer_connects_without_forward() {
    let wf = workflow(vec![producer("A", "X"), consumer("B", "X")]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();

    let b = topology.device("B").unwrap();
    assert_eq!(b.channels, vec![connect("in_out_TST_X_0", 22000)]);
    assert!(b.forwards.is_empty());
    assert_eq!(
        b.inputs.get("in_out_TST_X_0"),
        Some(&InputSpec::new("TST", "X"))
    );
}

#[test]
fn test_unconsumed_output_still_binds() {
    let wf = workflow(vec![producer("A", "X")]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();

    assert_eq!(topology.len(), 1);
    let a = topology.device("A").unwrap();
    assert_eq!(a.channels, vec![bind("out_TST_X_0", 22000)]);
    assert_eq!(topology.channels().filter(|(_, c)| !c.is_bind()).count(), 0);
}

#[test]
fn test_unconsumed_output_denied_by_policy() {
    let wf = workflow(vec![producer("A", "X")]);
    let config = CompilerConfig {
        unconsumed: UnconsumedPolicy::Deny,
        ..CompilerConfig::default()
    };
    let err = compile(&wf, &config).unwrap_err();
    assert_eq!(err.to_string(), "output out_TST_X of A is never consumed");
}

#[test]
fn test_device_copies_algorithm_and_options() {
    use crate::spec::{ConfigParamSpec, VariantType};

    let wf = workflow(vec![
        producer("A", "X")
            .algorithm(json!({ "kind": "reader", "file": "in.root" }))
            .option(ConfigParamSpec::new("rate", VariantType::Int)),
    ]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();
    let a = topology.device("A").unwrap();
    assert_eq!(a.algorithm.0, json!({ "kind": "reader", "file": "in.root" }));
    assert_eq!(a.options, vec![ConfigParamSpec::new("rate", VariantType::Int)]);
    assert_eq!(
        a.outputs.get("out_TST_X_0"),
        Some(&OutputSpec::new("TST", "X"))
    );
}

#[test]
fn test_port_base_is_configurable() {
    let wf = workflow(vec![producer("A", "X"), consumer("B", "X")]);
    let config = CompilerConfig {
        port_base: 40000,
        ..CompilerConfig::default()
    };
    let topology = compile(&wf, &config).unwrap();
    assert_eq!(topology.device("A").unwrap().channels[0].port, 40000);
    assert_eq!(topology.device("B").unwrap().channels[0].port, 40000);
}

#[test]
fn test_pipeline_allocates_in_declaration_order() {
    let wf = workflow(vec![
        producer("reader", "RAW"),
        ProcessorSpec::new("clusterer")
            .input(InputSpec::new("TST", "RAW"))
            .output(OutputSpec::new("TST", "CLUSTERS")),
        ProcessorSpec::new("tracker")
            .input(InputSpec::new("TST", "CLUSTERS"))
            .output(OutputSpec::new("TST", "TRACKS")),
        consumer("writer", "TRACKS"),
    ]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();

    // Outputs are bound before inputs are resolved within a device.
    assert_eq!(
        topology.device("clusterer").unwrap().channels,
        vec![
            bind("out_TST_CLUSTERS_0", 22001),
            connect("in_out_TST_RAW_0", 22000),
        ]
    );
    assert_eq!(
        topology.device("writer").unwrap().channels,
        vec![connect("in_out_TST_TRACKS_0", 22002)]
    );
    assert_well_formed(&topology);
}

#[test]
fn test_wildcard_consumer_resolves_producer_subspec() {
    let wf = workflow(vec![
        ProcessorSpec::new("A").output(OutputSpec::new("TST", "X").with_subspec(3)),
        ProcessorSpec::new("B").input(InputSpec::new("TST", "X").with_subspec(SubSpec::Any)),
        ProcessorSpec::new("C").input(InputSpec::new("TST", "X").with_subspec(SubSpec::Exact(3))),
    ]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();
    assert_eq!(
        topology.device("C").unwrap().channels,
        vec![connect("in_out_TST_X_1", 22001)]
    );
}

#[test]
fn test_device_consuming_same_item_twice() {
    let wf = workflow(vec![
        producer("A", "X"),
        ProcessorSpec::new("B")
            .input(InputSpec::new("TST", "X").with_binding("first"))
            .input(InputSpec::new("TST", "X").with_binding("second")),
    ]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();
    assert_eq!(
        topology.device("B").unwrap().channels,
        vec![
            connect("in_out_TST_X_0", 22000),
            bind("out_TST_X_1", 22001),
            connect("in_out_TST_X_1", 22001),
        ]
    );
    assert_well_formed(&topology);
}

#[test]
fn test_distinct_logical_channels_get_distinct_names() {
    // Hyphens are allowed in header fields; they never merge two channels.
    let wf = workflow(vec![
        ProcessorSpec::new("A")
            .output(OutputSpec::new("A-B", "C"))
            .output(OutputSpec::new("A", "B-C")),
        ProcessorSpec::new("B")
            .input(InputSpec::new("A-B", "C"))
            .input(InputSpec::new("A", "B-C")),
    ]);
    let topology = compile(&wf, &CompilerConfig::default()).unwrap();

    let a = topology.device("A").unwrap();
    let b = topology.device("B").unwrap();
    assert_eq!(a.outputs.len(), 2);
    assert_eq!(b.inputs.len(), 2);
    assert_eq!(
        b.channels,
        vec![
            connect("in_out_A-B_C_0", 22000),
            connect("in_out_A_B-C_0", 22001),
        ]
    );

    for device in &topology.devices {
        let names: BTreeSet<&str> = device.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), device.channels.len(), "{}", device.id);
    }
}

#[test]
fn test_underscore_in_header_field_never_reaches_compile() {
    let err = WorkflowSpec::new(vec![
        ProcessorSpec::new("A")
            .output(OutputSpec::new("A_B", "C"))
            .output(OutputSpec::new("A", "B_C")),
    ])
    .validate_and_build()
    .unwrap_err();
    assert!(matches!(err, crate::spec::WorkflowError::InvalidIdentifier { .. }));
}

// ---- Failures ----

#[test]
fn test_duplicate_producer_fails() {
    let wf = workflow(vec![producer("A", "X"), producer("B", "X"), consumer("C", "X")]);
    let err = compile(&wf, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TopologyError::DuplicateProducer { ref first, ref second, .. }
            if first == "A" && second == "B"
    ));
}

#[test]
fn test_consumer_without_producer_fails() {
    let wf = workflow(vec![producer("A", "X"), consumer("B", "Y")]);
    let err = compile(&wf, &CompilerConfig::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not find output matching out_TST_Y/* required by B"
    );
}

#[test]
fn test_forward_reference_fails() {
    // Binding must precede connecting in declaration order.
    let wf = workflow(vec![consumer("B", "X"), producer("A", "X")]);
    let err = compile(&wf, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TopologyError::UnmatchedConsumer { ref device, .. } if device == "B"
    ));
}

#[test]
fn test_port_exhaustion_fails() {
    let wf = workflow(vec![producer("A", "X"), consumer("B", "X"), consumer("C", "X")]);
    let config = CompilerConfig {
        port_base: u16::MAX,
        ..CompilerConfig::default()
    };
    let err = compile(&wf, &config).unwrap_err();
    assert!(matches!(err, TopologyError::PortRangeExhausted { base } if base == u16::MAX));
}

// ---- Properties ----

#[test]
fn test_demand_d_gives_d_connects_and_d_minus_one_forwards() {
    for d in 1..=6usize {
        let mut processors = vec![producer("P", "X")];
        for i in 0..d {
            processors.push(consumer(&format!("C{i}"), "X"));
        }
        let topology = compile(&workflow(processors), &CompilerConfig::default()).unwrap();

        let connects = topology.channels().filter(|(_, c)| !c.is_bind()).count();
        let binds = topology.channels().filter(|(_, c)| c.is_bind()).count();
        let forwards: usize = topology.devices.iter().map(|dev| dev.forwards.len()).sum();
        assert_eq!(connects, d);
        assert_eq!(binds, d);
        assert_eq!(forwards, d - 1);

        // The chain is linear: consumer i connects to usage i.
        for i in 0..d {
            let dev = topology.device(&format!("C{i}")).unwrap();
            assert_eq!(dev.connects().count(), 1);
            assert_eq!(dev.connects().next().unwrap().name, format!("in_out_TST_X_{i}"));
        }
        assert_well_formed(&topology);
    }
}

#[test]
fn test_recompilation_is_deterministic() {
    let processors = vec![
        producer("A", "X"),
        producer("B", "Y"),
        ProcessorSpec::new("C")
            .input(InputSpec::new("TST", "X"))
            .input(InputSpec::new("TST", "Y")),
        consumer("D", "X"),
        consumer("E", "Y"),
        consumer("F", "X"),
    ];
    let first = compile(&workflow(processors.clone()), &CompilerConfig::default()).unwrap();
    let second = compile(&workflow(processors), &CompilerConfig::default()).unwrap();
    assert_eq!(first, second);
    assert_well_formed(&first);

    let ports: BTreeSet<u16> = first
        .channels()
        .filter(|(_, c)| c.is_bind())
        .map(|(_, c)| c.port)
        .collect();
    assert_eq!(ports, (22000..22005).collect::<BTreeSet<u16>>());
}

#[test]
fn test_concurrent_compilations_are_isolated() {
    let wf = workflow(vec![producer("A", "X"), consumer("B", "X"), consumer("C", "X")]);
    let expected = compile(&wf, &CompilerConfig::default()).unwrap();

    let results: Vec<Topology> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| compile(&wf, &CompilerConfig::default()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for t in results {
        assert_eq!(t, expected);
    }
}
