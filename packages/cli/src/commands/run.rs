use super::{file_name, read_source};
use crate::config::Config;
use crate::diagnostics;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use playbox_evaluator::{props_from_json, render_component, Value};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source unit exporting a component
    pub file: PathBuf,

    /// Props passed to the component, as JSON
    #[arg(short, long)]
    pub props: Option<String>,
}

pub fn run(args: RunArgs, cwd: &str) -> Result<()> {
    let source = read_source(&args.file)?;
    let pipeline = Config::load(cwd)?.pipeline()?;

    let props = match args.props.as_deref() {
        Some(json) => {
            let value: serde_json::Value = serde_json::from_str(json).context("Invalid --props JSON")?;
            props_from_json(&value)
        }
        None => Value::Undefined,
    };

    let component = match pipeline.run(&source) {
        Ok(component) => component,
        Err(err) => {
            eprintln!("{}", diagnostics::report(&pipeline, &file_name(&args.file), &source, &err));
            return Err(anyhow!("{} did not produce a component", args.file.display()));
        }
    };

    let nodes = render_component(&component, props).map_err(|e| anyhow!("Render failed: {}", e))?;
    eprintln!("{} {}", "✓".green(), component.name().bright_white());
    println!("{}", serde_json::to_string_pretty(&nodes)?);
    Ok(())
}
