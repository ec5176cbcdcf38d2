//! Rendering of a compiled topology: argument vectors, a JSON dump, and a
//! DDS deployment descriptor. No topology decisions are made here.

pub mod args;
pub mod dds;

pub use args::{DeviceExecution, EmitError, channel_to_string, prepare_arguments};
pub use dds::dump_dds;

use crate::topology::Topology;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Report<'a> {
    topology: &'a Topology,
    executions: &'a [DeviceExecution],
}

/// Serialize the topology and launch descriptors as pretty JSON.
pub fn render_json(topology: &Topology, executions: &[DeviceExecution]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report {
        topology,
        executions,
    })
}

/// One line per device: the shell-quoted command line.
pub fn render_command_lines(executions: &[DeviceExecution]) -> String {
    let mut out = String::new();
    for exec in executions {
        let line = exec.argv().map(shell_quote).collect::<Vec<_>>().join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
