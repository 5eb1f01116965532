mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use cairokit_lib::RecipeError;

use crate::cmd::{RecipeArgs, cmd_build, cmd_graph, cmd_info, cmd_manifest, cmd_resolve, cmd_source};
use crate::output::{OutputFormat, print_error};

/// cairokit - multi-variant cairo build orchestrator
#[derive(Parser)]
#[command(name = "cairokit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show host platform and directories
  Info,

  /// Resolve options for the target platform
  Resolve(RecipeArgs),

  /// Print dependency declarations for the resolved options
  Graph(RecipeArgs),

  /// Fetch, extract and patch the upstream source
  Source(RecipeArgs),

  /// Build and package the library
  Build(RecipeArgs),

  /// Print the artifact manifest of a packaged build
  Manifest {
    /// Package directory containing cairokit-manifest.json
    dir: PathBuf,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn report(err: &anyhow::Error, output: OutputFormat) {
  let kind = err.downcast_ref::<RecipeError>().map(|e| e.kind().to_string());
  if output.is_json() {
    let value = json!({ "error": { "kind": kind, "message": format!("{err:#}") } });
    println!("{value:#}");
  } else {
    print_error(&format!("{err:#}"));
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match &cli.command {
    Commands::Info => cmd_info(cli.output),
    Commands::Resolve(args) => cmd_resolve(args, cli.output),
    Commands::Graph(args) => cmd_graph(args, cli.output),
    Commands::Source(args) => cmd_source(args, cli.output),
    Commands::Build(args) => cmd_build(args, cli.output),
    Commands::Manifest { dir } => cmd_manifest(dir, cli.output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      report(&err, cli.output);
      ExitCode::FAILURE
    }
  }
}
