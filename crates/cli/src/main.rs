mod description;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_anno::describe::{Invocation, Recorder, build, report};
use clap_anno::{App, InjectionRegistry, InvokeError, Outcome, Value};
use clap_anno_metadata::NodeReport;
use serde_json::{Map, Number, json};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use crate::description::{load_description, write_default_description};

#[derive(Parser)]
#[command(name = "clap-anno")]
#[command(version, about = "Build command trees from described signatures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter anno.json
    Init(InitArgs),

    /// Show the declarations built from a description
    Inspect(InspectArgs),

    /// Parse arguments against a description and print the recorded calls
    Run(RunArgs),

    /// Print the help text of a command path
    HelpText(HelpTextArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Replace an existing anno.json
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct InspectArgs {
    /// Path to the description file
    #[arg(short, long, value_name = "FILE")]
    description: Option<PathBuf>,

    /// Print the JSON report instead of a tree
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the description file
    #[arg(short, long, value_name = "FILE")]
    description: Option<PathBuf>,

    /// Arguments for the described command tree (after `--`)
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Parser)]
struct HelpTextArgs {
    /// Path to the description file
    #[arg(short, long, value_name = "FILE")]
    description: Option<PathBuf>,

    /// Subcommand path, e.g. `sub-group sync`
    #[arg(value_name = "PATH")]
    path: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Run(args) => run(args),
        Commands::HelpText(args) => help_text(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let path = write_default_description(&dir, args.force)?;
    eprintln!("Created: {}", path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit anno.json to describe your commands");
    eprintln!("  2. Run: clap-anno inspect");
    Ok(())
}

fn load_app(path: Option<&std::path::Path>, recorder: &Recorder) -> Result<App> {
    let loaded = load_description(path)?;
    tracing::debug!(path = %loaded.path.display(), "loaded description");
    build(&loaded.description, &InjectionRegistry::new(), recorder)
        .with_context(|| format!("invalid description: {}", loaded.path.display()))
}

fn inspect(args: InspectArgs) -> Result<()> {
    let app = load_app(args.description.as_deref(), &Recorder::new())?;
    let report = report(&app);

    if args.json {
        println!("{}", report.to_json_pretty());
    } else {
        print_node(&report.root, 0);
    }
    Ok(())
}

fn print_node(node: &NodeReport, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.alias_of {
        Some(origin) => println!("{indent}{} -> {origin}", node.name),
        None => {
            let mut line = format!("{indent}{} ({})", node.name, node.kind);
            if !node.help.is_empty() {
                line.push_str(&format!(": {}", node.help));
            }
            println!("{line}");
        }
    }
    for param in &node.params {
        let shown = if param.injected {
            format!("{} [injected]", param.name)
        } else {
            param.names.first().cloned().unwrap_or_else(|| param.name.clone())
        };
        let mut line = format!("{indent}    {shown}");
        if let Some(value_type) = &param.value_type {
            line.push_str(&format!(" <{value_type}>"));
        }
        if param.required {
            line.push_str(" (required)");
        }
        println!("{line}");
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn run(args: RunArgs) -> Result<()> {
    let recorder = Recorder::new();
    let app = load_app(args.description.as_deref(), &recorder)?;

    match app.run(&args.args) {
        Ok(Outcome::Value(_)) => {
            let calls: Vec<_> = recorder.take().iter().map(invocation_to_json).collect();
            let out = serde_json::to_string_pretty(&calls)?;
            println!("{out}");
            Ok(())
        }
        Ok(Outcome::Help(text)) | Ok(Outcome::Version(text)) => {
            print!("{text}");
            Ok(())
        }
        Err(InvokeError::Usage(e)) => {
            eprint!("{}", e.render());
            std::process::exit(2);
        }
        Err(e) => Err(e).context("command failed"),
    }
}

fn help_text(args: HelpTextArgs) -> Result<()> {
    let app = load_app(args.description.as_deref(), &Recorder::new())?;
    let path: Vec<&str> = args.path.iter().map(String::as_str).collect();
    let text = app
        .help_for(&path)
        .with_context(|| format!("no such command: {}", args.path.join(" ")))?;
    print!("{text}");
    Ok(())
}

fn invocation_to_json(invocation: &Invocation) -> serde_json::Value {
    let kwargs: Map<String, serde_json::Value> = invocation
        .call
        .kwargs
        .iter()
        .map(|(k, v)| (k.clone(), value_to_json(v)))
        .collect();
    json!({
        "callable": invocation.callable,
        "receiver": invocation.receiver,
        "args": invocation.call.args.iter().map(value_to_json).collect::<Vec<_>>(),
        "kwargs": kwargs,
    })
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Unit => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(n) => json!(n),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => json!(s),
        Value::Tuple(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Object(_) => json!("<object>"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
