//! DDS deployment descriptor for a set of device executions.

use crate::render::args::DeviceExecution;
use std::io::{self, Write};

/// Write a DDS topology describing how to run every device.
///
/// One `decltask` per device carrying its full command line, and a single
/// collection grouping all tasks.
pub fn dump_dds<W: Write>(out: &mut W, executions: &[DeviceExecution]) -> io::Result<()> {
    writeln!(out, r#"<topology id="dataflow">"#)?;
    for exec in executions {
        let cmdline = exec.argv().map(escape_xml).collect::<Vec<_>>().join(" ");
        writeln!(out, r#"   <decltask id="{}">"#, escape_xml(&exec.id))?;
        writeln!(out, r#"       <exe reachable="true">{}</exe>"#, cmdline)?;
        writeln!(out, "   </decltask>")?;
    }
    writeln!(out, r#"   <declcollection id="workflow">"#)?;
    writeln!(out, "       <tasks>")?;
    for exec in executions {
        writeln!(out, "          <name>{}</name>", escape_xml(&exec.id))?;
    }
    writeln!(out, "       </tasks>")?;
    writeln!(out, "   </declcollection>")?;
    writeln!(out, "</topology>")?;
    Ok(())
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
