//! Spec layer: workflow JSON schema + validated in-memory structures.
//!
//! This module is intentionally separate from compilation and rendering.
//! It owns:
//! - data item descriptors (what a processor produces and consumes)
//! - option declarations
//! - the workflow itself and its validation

pub mod data;
pub mod error;
pub mod params;
pub mod workflow;

pub use data::{InputSpec, OutputSpec, SubSpec};
pub use error::WorkflowError;
pub use params::{ConfigParamSpec, VariantType};
pub use workflow::{AlgorithmSpec, ProcessorSpec, Workflow, WorkflowSpec};
