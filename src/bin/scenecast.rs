use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scenecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a session script against in-memory collaborators and print the resulting calls.
    Plan(PlanArgs),
    /// Resolve the layer geometry of one scene for a canvas size.
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input session script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print the run as JSON instead of one call per line.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Exit with an error if any step failed.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Input scene JSON (as produced by `Scene`'s serde form).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 720.0)]
    height: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let script = scenecast::Script::from_path(&args.in_path)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("build tokio runtime")?;
    let run = rt.block_on(script.run());

    if args.json {
        let out = serde_json::to_string_pretty(&run).context("serialize run")?;
        println!("{out}");
    } else {
        for step in &run.steps {
            println!("#{} {} -> {:?}", step.index, step.op, step.phase);
            for call in &step.calls {
                println!("    {call}");
            }
            if let Some(note) = &step.note {
                println!("    ({note})");
            }
            for failure in &step.failures {
                println!("    failed: {failure}");
            }
            if let Some(err) = &step.error {
                println!("    error: {err}");
            }
        }
    }

    if args.strict && !run.is_clean() {
        anyhow::bail!("script '{}' had failing steps", args.in_path.display());
    }
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let f = std::fs::File::open(&args.in_path)
        .with_context(|| format!("open scene JSON '{}'", args.in_path.display()))?;
    let scene: scenecast::Scene = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse scene JSON '{}'", args.in_path.display()))?;
    let canvas = scenecast::Size::new(args.width, args.height);

    for slot in &scene.slots {
        match scenecast::resolve_slot_geometry(slot, canvas) {
            Ok(g) => println!(
                "{:<20} x={:<8} y={:<8} w={:<8} h={:<8} z={} visible={}",
                slot.name, g.x, g.y, g.width, g.height, g.index, slot.visible
            ),
            Err(e) => println!("{:<20} error: {e}", slot.name),
        }
    }
    Ok(())
}
