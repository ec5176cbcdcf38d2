//! Compiled devices and the topology that holds them.

use crate::channel::{ChannelMethod, ChannelSpec};
use crate::spec::{AlgorithmSpec, ConfigParamSpec, InputSpec, OutputSpec};
use serde::Serialize;
use std::collections::BTreeMap;

/// The compiled counterpart of one processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSpec {
    pub id: String,
    pub algorithm: AlgorithmSpec,
    pub options: Vec<ConfigParamSpec>,
    /// Owned endpoints in creation order.
    pub channels: Vec<ChannelSpec>,
    /// channel name -> output it publishes
    pub outputs: BTreeMap<String, OutputSpec>,
    /// channel name -> input it subscribes to
    pub inputs: BTreeMap<String, InputSpec>,
    /// channel name -> input republished for the next consumer
    pub forwards: BTreeMap<String, InputSpec>,
}

impl DeviceSpec {
    pub fn channel(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn binds(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.channels.iter().filter(|c| c.method == ChannelMethod::Bind)
    }

    pub fn connects(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.channels
            .iter()
            .filter(|c| c.method == ChannelMethod::Connect)
    }
}

/// Result of one compilation: devices in workflow declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    pub devices: Vec<DeviceSpec>,
}

impl Topology {
    pub fn device(&self, id: &str) -> Option<&DeviceSpec> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Every channel with its owning device.
    pub fn channels(&self) -> impl Iterator<Item = (&DeviceSpec, &ChannelSpec)> {
        self.devices
            .iter()
            .flat_map(|d| d.channels.iter().map(move |c| (d, c)))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
