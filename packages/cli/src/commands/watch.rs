use super::{file_name, read_source};
use crate::config::Config;
use crate::diagnostics;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use playbox_editor::{LiveSession, Recompute};
use playbox_evaluator::Value;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::debug;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Source unit to edit; its contents at startup are the baseline
    pub file: PathBuf,

    /// Print the rendered virtual DOM after every successful recompile
    #[arg(long)]
    pub render: bool,
}

pub fn watch(args: WatchArgs, cwd: &str) -> Result<()> {
    let path = args
        .file
        .canonicalize()
        .with_context(|| format!("Cannot find {}", args.file.display()))?;
    let name = file_name(&path);
    let pipeline = Config::load(cwd)?.pipeline()?;
    let mut session = LiveSession::open(pipeline, &path)?;

    println!(
        "{} {} ({})",
        "👀 Watching".bright_blue().bold(),
        path.display(),
        session.component().name().bright_white()
    );

    // Editors often replace the file, so watch its directory
    let dir = path.parent().ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    for event in rx {
        let event = event?;
        if !touches(&event, &path) {
            continue;
        }
        debug!(kind = ?event.kind, "file event");

        let text = match read_source(&path) {
            Ok(text) => text,
            // Mid-save; the next event carries the new contents
            Err(_) => continue,
        };
        let outcome = session.on_text_change(&text);
        print_outcome(&session, &name, outcome, args.render)?;
    }

    Ok(())
}

fn touches(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) && event.paths.iter().any(|p| p == path)
}

fn print_outcome(session: &LiveSession, name: &str, outcome: Recompute, render: bool) -> Result<()> {
    let state = session.render_state();
    match outcome {
        Recompute::Unchanged => {
            println!("  {} unchanged", "·".dimmed());
            return Ok(());
        }
        Recompute::Restored => {
            println!("  {} restored {}", "↺".green(), state.component.name().bright_white());
        }
        Recompute::Compiled => {
            println!(
                "  {} compiled {} (#{})",
                "✓".green(),
                state.component.name().bright_white(),
                session.recompute_count()
            );
        }
        Recompute::Failed(kind) => {
            println!(
                "  {} {:?} failure, still showing {}",
                "✗".red(),
                kind,
                state.component.name().bright_white()
            );
            if let Some(err) = session.failure() {
                eprintln!("{}", diagnostics::report(session.pipeline(), name, session.text(), err));
            }
            return Ok(());
        }
    }

    if render {
        match session.render(Value::Undefined) {
            Ok(nodes) => println!("{}", serde_json::to_string_pretty(&nodes)?),
            Err(err) => eprintln!("  {} render failed: {}", "✗".red(), err),
        }
    }
    Ok(())
}
