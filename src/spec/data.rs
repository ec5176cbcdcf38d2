//! Data item descriptors: what a processor produces and what it consumes.
//!
//! JSON shape:
//!   outputs: { "origin": "TPC", "description": "CLUSTERS", "subspec": 0 }
//!   inputs:  { "binding": "clusters", "origin": "TPC", "description": "CLUSTERS", "subspec": "*" }
//!
//! `subspec` defaults to 0 on outputs and to the wildcard on inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed header widths of the data model.
pub const MAX_ORIGIN_LEN: usize = 4;
pub const MAX_DESCRIPTION_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub origin: String,
    pub description: String,
    #[serde(default)]
    pub subspec: u32,
}

impl OutputSpec {
    pub fn new(origin: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            description: description.into(),
            subspec: 0,
        }
    }

    pub fn with_subspec(mut self, subspec: u32) -> Self {
        self.subspec = subspec;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Consumer-local label. Informational only, never used for routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    pub origin: String,
    pub description: String,
    #[serde(default)]
    pub subspec: SubSpec,
}

impl InputSpec {
    pub fn new(origin: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            binding: None,
            origin: origin.into(),
            description: description.into(),
            subspec: SubSpec::Any,
        }
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    pub fn with_subspec(mut self, subspec: SubSpec) -> Self {
        self.subspec = subspec;
        self
    }

    /// Whether this input can be fed by `output`.
    ///
    /// Origin and description compare exactly; only the sub-specification may
    /// be a wildcard, and only on the input side.
    pub fn matches(&self, output: &OutputSpec) -> bool {
        self.origin == output.origin
            && self.description == output.description
            && self.subspec.matches(output.subspec)
    }
}

/// Input-side sub-specification. Written as `"*"` or an integer in JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSubSpec", into = "RawSubSpec")]
pub enum SubSpec {
    #[default]
    Any,
    Exact(u32),
}

impl SubSpec {
    pub fn matches(self, concrete: u32) -> bool {
        match self {
            SubSpec::Any => true,
            SubSpec::Exact(v) => v == concrete,
        }
    }
}

impl fmt::Display for SubSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubSpec::Any => f.write_str("*"),
            SubSpec::Exact(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSubSpec {
    Exact(u32),
    Wildcard(String),
}

impl TryFrom<RawSubSpec> for SubSpec {
    type Error = String;

    fn try_from(raw: RawSubSpec) -> Result<Self, Self::Error> {
        match raw {
            RawSubSpec::Exact(v) => Ok(SubSpec::Exact(v)),
            RawSubSpec::Wildcard(s) if s == "*" => Ok(SubSpec::Any),
            RawSubSpec::Wildcard(s) => Err(format!(
                "subspec must be an unsigned integer or \"*\", got {s:?}"
            )),
        }
    }
}

impl From<SubSpec> for RawSubSpec {
    fn from(subspec: SubSpec) -> Self {
        match subspec {
            SubSpec::Any => RawSubSpec::Wildcard("*".to_string()),
            SubSpec::Exact(v) => RawSubSpec::Exact(v),
        }
    }
}
