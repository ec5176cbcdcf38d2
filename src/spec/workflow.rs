//! Workflow description: an ordered list of processors.
//!
//! JSON shape:
//! {
//!   "processors": [
//!     {
//!       "name": "reader",                       // unique, becomes the device id
//!       "outputs": [{ "origin": "TST", "description": "A" }],
//!       "inputs": [],
//!       "algorithm": { ... },                   // opaque, copied to the device
//!       "options": [{ "name": "rate", "type": "int" }]
//!     },
//!     ...
//!   ]
//! }
//!
//! We keep two representations:
//! - WorkflowSpec: raw JSON input (serde-friendly)
//! - Workflow: validated, what the compiler accepts

use crate::spec::data::{InputSpec, MAX_DESCRIPTION_LEN, MAX_ORIGIN_LEN, OutputSpec};
use crate::spec::error::WorkflowError;
use crate::spec::params::ConfigParamSpec;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Characters allowed in names that end up inside the `key=value,...`
/// channel configuration string.
const IDENTIFIER_RE: &str = r"^[A-Za-z0-9_-]+$";

/// Origins and descriptions are joined with `_` into channel names, so they
/// must not contain it themselves.
const HEADER_FIELD_RE: &str = r"^[A-Za-z0-9-]+$";

/// Flags every device already receives; a processor cannot declare them.
pub const RESERVED_OPTIONS: [&str; 4] = ["id", "control", "log-color", "channel-config"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub processors: Vec<ProcessorSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSpec {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub algorithm: AlgorithmSpec,
    #[serde(default)]
    pub options: Vec<ConfigParamSpec>,
}

/// Opaque algorithm handle. The compiler copies it onto the device and
/// never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgorithmSpec(pub Value);

impl ProcessorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            algorithm: AlgorithmSpec::default(),
            options: Vec::new(),
        }
    }

    pub fn output(mut self, output: OutputSpec) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn option(mut self, option: ConfigParamSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn algorithm(mut self, algorithm: Value) -> Self {
        self.algorithm = AlgorithmSpec(algorithm);
        self
    }
}

/// A validated workflow. Processor order is the declaration order and is
/// preserved through compilation.
#[derive(Debug, Clone)]
pub struct Workflow {
    processors: Vec<ProcessorSpec>,
}

impl Workflow {
    pub fn processors(&self) -> &[ProcessorSpec] {
        &self.processors
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl WorkflowSpec {
    pub fn new(processors: Vec<ProcessorSpec>) -> Self {
        Self { processors }
    }

    /// Validate a WorkflowSpec and build a Workflow:
    /// - at least one processor
    /// - unique processor names
    /// - names, origins and descriptions usable inside channel names
    /// - option names not clashing with the fixed device flags
    /// - option defaults match their declared type
    pub fn validate_and_build(self) -> Result<Workflow, WorkflowError> {
        if self.processors.is_empty() {
            return Err(WorkflowError::Empty);
        }

        let re = Regex::new(IDENTIFIER_RE)?;
        let header_re = Regex::new(HEADER_FIELD_RE)?;

        let mut seen = BTreeSet::new();
        for p in &self.processors {
            if !seen.insert(p.name.as_str()) {
                return Err(WorkflowError::DuplicateName(p.name.clone()));
            }
            check_identifier(&re, &p.name, "processor name", &p.name, None)?;

            let headers = p
                .outputs
                .iter()
                .map(|o| (&o.origin, &o.description))
                .chain(p.inputs.iter().map(|i| (&i.origin, &i.description)));
            for (origin, description) in headers {
                check_identifier(&header_re, &p.name, "origin", origin, Some(MAX_ORIGIN_LEN))?;
                check_identifier(
                    &header_re,
                    &p.name,
                    "description",
                    description,
                    Some(MAX_DESCRIPTION_LEN),
                )?;
            }

            for opt in &p.options {
                check_identifier(&re, &p.name, "option name", &opt.name, None)?;
                if RESERVED_OPTIONS.contains(&opt.name.as_str()) {
                    return Err(WorkflowError::ReservedOption {
                        processor: p.name.clone(),
                        option: opt.name.clone(),
                    });
                }
                if let Some(default) = &opt.default {
                    if !opt.kind.accepts_json(default) {
                        return Err(WorkflowError::InvalidDefault {
                            processor: p.name.clone(),
                            option: opt.name.clone(),
                            value: default.to_string(),
                            expected: opt.kind.name(),
                        });
                    }
                }
            }
        }

        Ok(Workflow {
            processors: self.processors,
        })
    }
}

fn check_identifier(
    re: &Regex,
    processor: &str,
    kind: &'static str,
    value: &str,
    max: Option<usize>,
) -> Result<(), WorkflowError> {
    if !re.is_match(value) {
        return Err(WorkflowError::InvalidIdentifier {
            processor: processor.to_string(),
            kind,
            value: value.to_string(),
            allowed: re.as_str().trim_start_matches('^').trim_end_matches('$').to_string(),
        });
    }
    if let Some(max) = max {
        if value.len() > max {
            return Err(WorkflowError::IdentifierTooLong {
                processor: processor.to_string(),
                kind,
                value: value.to_string(),
                max,
            });
        }
    }
    Ok(())
}
