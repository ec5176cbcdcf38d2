//! Workflow -> device topology.
//!
//! Processors are compiled in declaration order, which fixes the order in
//! which ports are handed out.
//! - Every output gets a bind/pub channel on a fresh port.
//! - Every input connects to the currently bound endpoint of its logical
//!   channel.
//! - If an input is used by multiple processors, all but the last one
//!   republish it on a fresh port as `out_<origin>_<description>_<N>`, and
//!   the next consumer connects there instead. The transport is
//!   point-to-point, so fan-out is a forwarding chain.

use crate::channel::{
    ChannelSpec, DEFAULT_PORT_BASE, LogicalChannel, PhysicalChannel, PortAllocator,
};
use crate::spec::{ProcessorSpec, Workflow};
use crate::topology::demand::{DemandTable, UnconsumedPolicy};
use crate::topology::device::{DeviceSpec, Topology};
use crate::topology::TopologyError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    /// First port handed out.
    pub port_base: u16,
    pub unconsumed: UnconsumedPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            port_base: DEFAULT_PORT_BASE,
            unconsumed: UnconsumedPolicy::default(),
        }
    }
}

/// Currently bound endpoint of a logical channel.
#[derive(Debug, Clone, Copy)]
struct Usage {
    /// Consumers connected so far; also the usage index of the bound endpoint.
    count: usize,
    /// Subspec of the producer.
    subspec: u32,
}

/// All mutable state of one compilation. Never shared between compilations.
#[derive(Debug)]
pub struct CompileContext {
    ports: PortAllocator,
    demand: DemandTable,
    usages: BTreeMap<LogicalChannel, Usage>,
    port_mappings: BTreeMap<PhysicalChannel, u16>,
}

impl CompileContext {
    /// Run the demand pass over the whole workflow and set up a fresh
    /// allocator.
    pub fn new(workflow: &Workflow, config: &CompilerConfig) -> Result<Self, TopologyError> {
        Ok(Self {
            ports: PortAllocator::new(config.port_base),
            demand: DemandTable::build(workflow, config.unconsumed)?,
            usages: BTreeMap::new(),
            port_mappings: BTreeMap::new(),
        })
    }

    pub fn demand(&self) -> &DemandTable {
        &self.demand
    }

    fn compile_processor(&mut self, processor: &ProcessorSpec) -> Result<DeviceSpec, TopologyError> {
        let mut device = DeviceSpec {
            id: processor.name.clone(),
            algorithm: processor.algorithm.clone(),
            options: processor.options.clone(),
            channels: Vec::new(),
            outputs: BTreeMap::new(),
            inputs: BTreeMap::new(),
            forwards: BTreeMap::new(),
        };

        for out in &processor.outputs {
            let logical = LogicalChannel::of_output(out);
            if self.usages.contains_key(&logical) {
                let first = self
                    .demand
                    .producer(&logical)
                    .map(|p| p.device.clone())
                    .unwrap_or_default();
                return Err(TopologyError::DuplicateProducer {
                    channel: logical.name(),
                    first,
                    second: processor.name.clone(),
                });
            }

            let physical = logical.physical(out.subspec, 0);
            let port = self.bind(&physical)?;
            let channel = ChannelSpec::publisher(&physical, port);

            device.outputs.insert(channel.name.clone(), out.clone());
            device.channels.push(channel);
            self.usages.insert(
                logical,
                Usage {
                    count: 0,
                    subspec: out.subspec,
                },
            );
        }

        for input in &processor.inputs {
            let logical = LogicalChannel::of_input(input);
            let unmatched = || TopologyError::UnmatchedConsumer {
                device: processor.name.clone(),
                channel: format!("{}/{}", logical, input.subspec),
            };

            let usage = self.usages.get(&logical).copied().ok_or_else(unmatched)?;
            if !input.subspec.matches(usage.subspec) {
                return Err(unmatched());
            }
            let max_usages = self.demand.demand(&logical).ok_or_else(unmatched)?;

            let physical = logical.physical(usage.subspec, usage.count);
            let port = *self
                .port_mappings
                .get(&physical)
                .ok_or_else(|| TopologyError::PortMappingMissing(physical.id()))?;
            let channel = ChannelSpec::subscriber(&physical, port);
            device.inputs.insert(channel.name.clone(), input.clone());
            device.channels.push(channel);

            let used = usage.count + 1;
            self.usages.insert(
                logical.clone(),
                Usage {
                    count: used,
                    subspec: usage.subspec,
                },
            );

            if used != max_usages {
                let forward = logical.physical(usage.subspec, used);
                let port = self.bind(&forward)?;
                let channel = ChannelSpec::publisher(&forward, port);
                tracing::debug!(
                    device = %device.id,
                    channel = %channel.name,
                    port,
                    "forwarding for next consumer ({used} of {max_usages})"
                );
                device.forwards.insert(channel.name.clone(), input.clone());
                device.channels.push(channel);
            }
        }

        Ok(device)
    }

    /// Allocate a port for a new publishing endpoint.
    fn bind(&mut self, physical: &PhysicalChannel) -> Result<u16, TopologyError> {
        let port = self.ports.allocate()?;
        debug_assert!(!self.port_mappings.contains_key(physical));
        self.port_mappings.insert(physical.clone(), port);
        Ok(port)
    }
}

/// Construct the devices for `workflow`.
///
/// All-or-nothing: on error nothing of the partially built topology escapes.
pub fn compile(workflow: &Workflow, config: &CompilerConfig) -> Result<Topology, TopologyError> {
    let mut ctx = CompileContext::new(workflow, config)?;

    let mut devices = Vec::with_capacity(workflow.len());
    for processor in workflow.processors() {
        let device = ctx.compile_processor(processor)?;
        tracing::debug!(
            device = %device.id,
            channels = device.channels.len(),
            forwards = device.forwards.len(),
            "compiled device"
        );
        devices.push(device);
    }

    tracing::info!(
        devices = devices.len(),
        ports = ctx.ports.allocated(),
        first_port = ctx.ports.base(),
        "compiled workflow topology"
    );
    Ok(Topology { devices })
}
