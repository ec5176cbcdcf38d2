//! Per-device channel configuration strings and process argument vectors.

use crate::channel::{ChannelMethod, ChannelSpec};
use crate::spec::ConfigParamSpec;
use crate::topology::{DeviceSpec, Topology};
use serde::Serialize;
use std::collections::BTreeMap;
use std::process::Command;

/// Errors raised while building argument vectors.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// A declared option was given on the command line without a value.
    #[error("missing value for --{option} (needed by {device})")]
    MissingOptionValue {
        /// Device declaring the option.
        device: String,
        /// Option name.
        option: String,
    },

    /// A declared option was given a value that does not parse as its type.
    #[error("invalid value {value:?} for --{option} of {device}: expected {expected}")]
    InvalidOptionValue {
        /// Device declaring the option.
        device: String,
        /// Option name.
        option: String,
        /// Supplied value.
        value: String,
        /// Declared type name.
        expected: &'static str,
    },
}

/// Everything needed to launch one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceExecution {
    pub id: String,
    pub exe: String,
    /// Arguments after the executable.
    pub args: Vec<String>,
    /// Options forwarded to this device: name -> value.
    pub options: BTreeMap<String, String>,
}

impl DeviceExecution {
    /// Full argument vector, executable first.
    pub fn argv(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.exe.as_str()).chain(self.args.iter().map(String::as_str))
    }

    /// A command ready to be spawned by whoever supervises the devices.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.args(&self.args);
        cmd
    }
}

/// Render a channel in the `key=value,...` form devices take via
/// `--channel-config`.
///
/// Bind endpoints listen on every interface, connect endpoints dial localhost.
pub fn channel_to_string(channel: &ChannelSpec) -> String {
    let address = match channel.method {
        ChannelMethod::Bind => format!("tcp://*:{}", channel.port),
        ChannelMethod::Connect => format!("tcp://127.0.0.1:{}", channel.port),
    };
    format!(
        "name={},type={},method={},address={}",
        channel.name, channel.kind, channel.method, address
    )
}

/// Build the argument vector of every device in `topology`.
///
/// `invocation` is the compiler's own command line (without the program
/// name). Of those, only options a device declares are forwarded to it, in
/// the order they were given. Both `--name value` and `--name=value` are
/// understood.
pub fn prepare_arguments(
    topology: &Topology,
    invocation: &[String],
    exe: &str,
) -> Result<Vec<DeviceExecution>, EmitError> {
    topology
        .devices
        .iter()
        .map(|device| prepare_device(device, invocation, exe))
        .collect()
}

fn prepare_device(
    device: &DeviceSpec,
    invocation: &[String],
    exe: &str,
) -> Result<DeviceExecution, EmitError> {
    let mut args: Vec<String> = vec![
        "--id".into(),
        device.id.clone(),
        "--control".into(),
        "static".into(),
        "--log-color".into(),
        "0".into(),
    ];
    let mut options = BTreeMap::new();

    let mut i = 0;
    while i < invocation.len() {
        let current = &invocation[i];
        i += 1;

        let Some((param, inline_value)) = match_declared(&device.options, current) else {
            continue;
        };
        let value = match inline_value {
            Some(v) => v.to_string(),
            None => match invocation.get(i) {
                Some(next) if !next.starts_with("--") => {
                    i += 1;
                    next.clone()
                }
                _ => {
                    return Err(EmitError::MissingOptionValue {
                        device: device.id.clone(),
                        option: param.name.clone(),
                    });
                }
            },
        };

        if !param.kind.accepts_str(&value) {
            return Err(EmitError::InvalidOptionValue {
                device: device.id.clone(),
                option: param.name.clone(),
                value,
                expected: param.kind.name(),
            });
        }

        args.push(param.flag());
        args.push(value.clone());
        options.insert(param.name.clone(), value);
    }

    for channel in &device.channels {
        args.push("--channel-config".into());
        args.push(channel_to_string(channel));
    }

    tracing::debug!(
        device = %device.id,
        args = %args.join(" "),
        "arguments forwarded to device"
    );

    Ok(DeviceExecution {
        id: device.id.clone(),
        exe: exe.to_string(),
        args,
        options,
    })
}

/// Find the declared option `arg` refers to, with its inline value if given
/// as `--name=value`.
fn match_declared<'a, 'b>(
    declared: &'a [ConfigParamSpec],
    arg: &'b str,
) -> Option<(&'a ConfigParamSpec, Option<&'b str>)> {
    let rest = arg.strip_prefix("--")?;
    let (name, value) = match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };
    declared.iter().find(|p| p.name == name).map(|p| (p, value))
}
