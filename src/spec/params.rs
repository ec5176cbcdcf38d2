//! Option declarations carried by each processor.
//!
//! A processor lists the options it understands; the emitter forwards to a
//! device only the declared options that were supplied on the command line,
//! after checking the value against the declared type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    Int,
    Int64,
    Float,
    Double,
    #[default]
    String,
    Bool,
}

impl VariantType {
    pub fn name(self) -> &'static str {
        match self {
            VariantType::Int => "int",
            VariantType::Int64 => "int64",
            VariantType::Float => "float",
            VariantType::Double => "double",
            VariantType::String => "string",
            VariantType::Bool => "bool",
        }
    }

    /// Whether a command line value parses as this type.
    pub fn accepts_str(self, value: &str) -> bool {
        match self {
            VariantType::Int => value.parse::<i32>().is_ok(),
            VariantType::Int64 => value.parse::<i64>().is_ok(),
            VariantType::Float => value.parse::<f32>().is_ok(),
            VariantType::Double => value.parse::<f64>().is_ok(),
            VariantType::String => true,
            VariantType::Bool => matches!(
                value,
                "true" | "false" | "1" | "0" | "yes" | "no" | "on" | "off"
            ),
        }
    }

    /// Whether a JSON default value is of this type.
    pub fn accepts_json(self, value: &Value) -> bool {
        match self {
            VariantType::Int => value
                .as_i64()
                .map(|v| i32::try_from(v).is_ok())
                .unwrap_or(false),
            VariantType::Int64 => value.is_i64(),
            VariantType::Float | VariantType::Double => value.is_number(),
            VariantType::String => value.is_string(),
            VariantType::Bool => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParamSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VariantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub help: String,
}

impl ConfigParamSpec {
    pub fn new(name: impl Into<String>, kind: VariantType) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            help: String::new(),
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The flag this option is passed with, e.g. `--rate`.
    pub fn flag(&self) -> String {
        format!("--{}", self.name)
    }
}
