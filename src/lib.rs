//! Compile a declarative workflow into a set of devices wired together by
//! point-to-point pub/sub channels, and render what is needed to launch them.

pub mod channel;
pub mod render;
pub mod spec;
pub mod topology;

pub use render::{DeviceExecution, channel_to_string, dump_dds, prepare_arguments};
pub use spec::{Workflow, WorkflowSpec};
pub use topology::{CompilerConfig, Topology, TopologyError, UnconsumedPolicy, compile};
