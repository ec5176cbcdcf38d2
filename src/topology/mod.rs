//! Topology compilation: demand counting, channel binding, forwarding chains.

pub mod compiler;
pub mod demand;
pub mod device;
pub mod error;

#[cfg(test)]
mod tests;

pub use compiler::{CompileContext, CompilerConfig, compile};
pub use demand::{DemandTable, Producer, UnconsumedPolicy};
pub use device::{DeviceSpec, Topology};
pub use error::TopologyError;
