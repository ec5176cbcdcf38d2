//! Error types for topology compilation.

/// Errors that abort a compilation. No partial topology is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// Two outputs advertise the same logical channel.
    #[error("duplicate producer for {channel}: already produced by {first}, again by {second}")]
    DuplicateProducer {
        /// Logical channel name.
        channel: String,
        /// Processor that bound the channel first.
        first: String,
        /// Processor that tried to bind it again.
        second: String,
    },

    /// An input has no matching producer bound before it.
    #[error("could not find output matching {channel} required by {device}")]
    UnmatchedConsumer {
        /// Consuming processor.
        device: String,
        /// Logical channel name (with the requested subspec).
        channel: String,
    },

    /// A physical channel resolved by a consumer has no allocated port.
    #[error("missing port mapping for physical channel {0}")]
    PortMappingMissing(String),

    /// An output nobody consumes, rejected by `UnconsumedPolicy::Deny`.
    #[error("output {channel} of {device} is never consumed")]
    UnconsumedOutput {
        /// Producing processor.
        device: String,
        /// Logical channel name.
        channel: String,
    },

    /// Port allocation ran past 65535.
    #[error("port range exhausted (allocation started at {base})")]
    PortRangeExhausted {
        /// First port handed out in this compilation.
        base: u16,
    },
}
