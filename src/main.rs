use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use workflow_topology::channel::DEFAULT_PORT_BASE;
use workflow_topology::render;
use workflow_topology::topology::{CompileContext, CompilerConfig, UnconsumedPolicy};
use workflow_topology::{Workflow, WorkflowSpec};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "workflow-topology")]
#[command(about = "Compile a workflow into a device topology", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a workflow and emit per-device launch descriptors.
    Compile {
        #[arg(long)]
        workflow: String,

        /// First port handed out to a channel.
        #[arg(long, env = "WORKFLOW_TOPOLOGY_PORT_BASE", default_value_t = DEFAULT_PORT_BASE)]
        port_base: u16,

        /// What to do with outputs no processor consumes.
        #[arg(long, value_enum, default_value_t = UnconsumedPolicy::Warn)]
        unconsumed: UnconsumedPolicy,

        /// Executable the devices are launched with. Defaults to this binary.
        #[arg(long)]
        exe: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Args)]
        format: Format,

        #[arg(short = 'o', long)]
        out: Option<String>,

        /// Device options, forwarded to the devices that declare them.
        #[arg(last = true)]
        device_args: Vec<String>,
    },

    /// Validate a workflow and print the consumer count of every output.
    Check {
        #[arg(long)]
        workflow: String,

        #[arg(long, value_enum, default_value_t = UnconsumedPolicy::Warn)]
        unconsumed: UnconsumedPolicy,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One shell command line per device.
    Args,
    /// Topology and launch descriptors as JSON.
    Json,
    /// DDS topology XML.
    Dds,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Compile {
            workflow,
            port_base,
            unconsumed,
            exe,
            format,
            out,
            device_args,
        } => {
            // 1) Parse + validate the workflow.
            let wf = load_workflow(&workflow)?;

            // 2) Compile.
            let config = CompilerConfig {
                port_base,
                unconsumed,
            };
            let topology = workflow_topology::compile(&wf, &config)
                .with_context(|| format!("compile workflow {}", workflow))?;

            // 3) Build the per-device argument vectors.
            let exe = match exe {
                Some(exe) => exe,
                None => std::env::current_exe()
                    .context("resolve current executable")?
                    .to_string_lossy()
                    .into_owned(),
            };
            let executions = render::prepare_arguments(&topology, &device_args, &exe)?;

            // 4) Render.
            let rendered = match format {
                Format::Args => render::render_command_lines(&executions),
                Format::Json => render::render_json(&topology, &executions)?,
                Format::Dds => {
                    let mut buf = Vec::new();
                    render::dump_dds(&mut buf, &executions)?;
                    String::from_utf8(buf)?
                }
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered).with_context(|| format!("write {}", path))?;
                    println!("Wrote {}", path);
                }
                None => print!("{}", rendered),
            }
        }
        Commands::Check {
            workflow,
            unconsumed,
        } => {
            let wf = load_workflow(&workflow)?;
            let config = CompilerConfig {
                unconsumed,
                ..CompilerConfig::default()
            };
            let ctx = CompileContext::new(&wf, &config)
                .with_context(|| format!("check workflow {}", workflow))?;
            for (channel, demand) in ctx.demand().iter() {
                println!("{}\t{}", channel, demand);
            }
            println!("OK: {} processors", wf.len());
        }
    }

    Ok(())
}

fn load_workflow(path: &str) -> Result<Workflow> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read workflow file {}", path))?;
    let spec: WorkflowSpec =
        serde_json::from_str(&text).with_context(|| format!("parse workflow file {}", path))?;
    let wf = spec
        .validate_and_build()
        .with_context(|| format!("validate workflow file {}", path))?;
    Ok(wf)
}
