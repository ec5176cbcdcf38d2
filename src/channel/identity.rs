//! Logical and physical channel identities.
//!
//! A logical channel names a data item by origin + description only. A
//! physical channel adds the resolved sub-specification and the usage index
//! (the Nth consumer), and is what a port is allocated for.
//!
//! Example: TPC/CLUSTERS  =>  logical "out_TPC_CLUSTERS"
//!                            physical "out_TPC_CLUSTERS_0", "out_TPC_CLUSTERS_1", ...

use crate::spec::{InputSpec, OutputSpec};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LogicalChannel {
    pub origin: String,
    pub description: String,
}

impl LogicalChannel {
    pub fn new(origin: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            description: description.into(),
        }
    }

    /// The logical channel an output advertises.
    pub fn of_output(output: &OutputSpec) -> Self {
        Self::new(output.origin.as_str(), output.description.as_str())
    }

    /// The logical channel an input looks for. The sub-specification plays no
    /// part here; it is checked against the producer separately.
    pub fn of_input(input: &InputSpec) -> Self {
        Self::new(input.origin.as_str(), input.description.as_str())
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn physical(&self, subspec: u32, usage: usize) -> PhysicalChannel {
        PhysicalChannel {
            logical: self.clone(),
            subspec,
            usage,
        }
    }
}

impl fmt::Display for LogicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out_{}_{}", self.origin, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PhysicalChannel {
    pub logical: LogicalChannel,
    /// Concrete sub-specification of the producer feeding this channel.
    pub subspec: u32,
    /// Zero-based consumer index on the forwarding chain.
    pub usage: usize,
}

impl PhysicalChannel {
    /// Stable identifier used as the bind endpoint name.
    pub fn id(&self) -> String {
        format!("{}_{}", self.logical, self.usage)
    }
}

impl fmt::Display for PhysicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{} (subspec {})", self.logical, self.usage, self.subspec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SubSpec;

    #[test]
    fn logical_channel_ignores_subspec() {
        let out = OutputSpec::new("TPC", "CLUSTERS").with_subspec(4);
        let input = InputSpec::new("TPC", "CLUSTERS").with_subspec(SubSpec::Exact(9));
        assert_eq!(LogicalChannel::of_output(&out), LogicalChannel::of_input(&input));
        assert_eq!(LogicalChannel::of_output(&out).name(), "out_TPC_CLUSTERS");
    }

    #[test]
    fn physical_ids_carry_the_usage_index() {
        let logical = LogicalChannel::new("ITS", "DIGITS");
        assert_eq!(logical.physical(0, 0).id(), "out_ITS_DIGITS_0");
        assert_eq!(logical.physical(0, 3).id(), "out_ITS_DIGITS_3");
        assert_ne!(logical.physical(0, 0), logical.physical(0, 1));
        assert_eq!(
            logical.physical(2, 1).to_string(),
            "out_ITS_DIGITS_1 (subspec 2)"
        );
    }
}
