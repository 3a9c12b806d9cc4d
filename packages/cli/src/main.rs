mod commands;
mod config;
mod diagnostics;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{run, transform, watch, RunArgs, TransformArgs, WatchArgs};
use tracing_subscriber::EnvFilter;

/// Playbox CLI - live previews for editable component examples
#[derive(Parser, Debug)]
#[command(name = "playbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rewritten or compiled text of a source unit
    Transform(TransformArgs),

    /// Compile, execute and render the default component as JSON
    Run(RunArgs),

    /// Recompile on every save, keeping the last good component on failure
    Watch(WatchArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Transform(args) => transform(args, &cwd),
                Command::Run(args) => run(args, &cwd),
                Command::Watch(args) => watch(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
