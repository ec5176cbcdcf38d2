//! Demand counting: how many consumers each produced item has.
//!
//! Runs over the whole workflow before any device is compiled, so the binding
//! pass knows up front whether a consumer is the last one on a chain or has
//! to forward.

use crate::channel::LogicalChannel;
use crate::spec::{OutputSpec, Workflow};
use crate::topology::TopologyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do with an output that no processor consumes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum UnconsumedPolicy {
    /// Accept silently.
    Allow,
    /// Accept, log a warning per channel.
    #[default]
    Warn,
    /// Fail the compilation.
    Deny,
}

/// Producer of a logical channel, as seen by the demand pass.
#[derive(Debug, Clone)]
pub struct Producer {
    pub device: String,
    pub output: OutputSpec,
}

/// Immutable per-compilation table: logical channel -> number of consumers.
#[derive(Debug, Clone, Default)]
pub struct DemandTable {
    producers: BTreeMap<LogicalChannel, Producer>,
    demand: BTreeMap<LogicalChannel, usize>,
}

impl DemandTable {
    /// Count consumers for every output of `workflow`.
    ///
    /// Fails on a second producer for a logical channel and on an input no
    /// output matches. Unconsumed outputs are handled per `policy`.
    pub fn build(workflow: &Workflow, policy: UnconsumedPolicy) -> Result<Self, TopologyError> {
        let mut table = DemandTable::default();

        // 1) Register every output with zero demand.
        for p in workflow.processors() {
            for out in &p.outputs {
                let logical = LogicalChannel::of_output(out);
                if let Some(prev) = table.producers.get(&logical) {
                    return Err(TopologyError::DuplicateProducer {
                        channel: logical.name(),
                        first: prev.device.clone(),
                        second: p.name.clone(),
                    });
                }
                table.demand.insert(logical.clone(), 0);
                table.producers.insert(
                    logical,
                    Producer {
                        device: p.name.clone(),
                        output: out.clone(),
                    },
                );
            }
        }

        // 2) Count inputs against them.
        for p in workflow.processors() {
            for input in &p.inputs {
                let logical = LogicalChannel::of_input(input);
                let matched = table
                    .producers
                    .get(&logical)
                    .is_some_and(|prod| input.matches(&prod.output));
                if !matched {
                    return Err(TopologyError::UnmatchedConsumer {
                        device: p.name.clone(),
                        channel: format!("{}/{}", logical, input.subspec),
                    });
                }
                *table.demand.entry(logical).or_default() += 1;
            }
        }

        // 3) Outputs nobody reads.
        for (logical, prod) in table.unconsumed() {
            match policy {
                UnconsumedPolicy::Allow => {}
                UnconsumedPolicy::Warn => {
                    tracing::warn!(
                        channel = %logical,
                        device = %prod.device,
                        "output is never consumed"
                    );
                }
                UnconsumedPolicy::Deny => {
                    return Err(TopologyError::UnconsumedOutput {
                        device: prod.device.clone(),
                        channel: logical.name(),
                    });
                }
            }
        }

        Ok(table)
    }

    /// Total number of consumers of `logical`, if anything produces it.
    pub fn demand(&self, logical: &LogicalChannel) -> Option<usize> {
        self.demand.get(logical).copied()
    }

    pub fn producer(&self, logical: &LogicalChannel) -> Option<&Producer> {
        self.producers.get(logical)
    }

    /// Logical channels in name order with their consumer counts.
    pub fn iter(&self) -> impl Iterator<Item = (&LogicalChannel, usize)> {
        self.demand.iter().map(|(k, v)| (k, *v))
    }

    pub fn unconsumed(&self) -> impl Iterator<Item = (&LogicalChannel, &Producer)> {
        self.demand
            .iter()
            .filter(|(_, d)| **d == 0)
            .filter_map(|(k, _)| self.producers.get_key_value(k))
    }

    pub fn len(&self) -> usize {
        self.demand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demand.is_empty()
    }
}
