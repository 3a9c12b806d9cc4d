use super::read_source;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use playbox_rewriter::rewrite;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    /// Module syntax replaced by resolve() calls, markup untouched
    Rewrite,
    /// Fully executable text
    Compile,
}

#[derive(Debug, Args)]
pub struct TransformArgs {
    /// Source unit to transform
    pub file: PathBuf,

    /// Last pipeline stage to run
    #[arg(short, long, value_enum, default_value = "compile")]
    pub stage: Stage,
}

pub fn transform(args: TransformArgs, cwd: &str) -> Result<()> {
    let source = read_source(&args.file)?;

    let output = match args.stage {
        Stage::Rewrite => {
            let rewritten = rewrite(&source);
            for ignored in &rewritten.ignored_defaults {
                eprintln!("{} ignoring additional default export {}", "warning:".yellow().bold(), ignored);
            }
            rewritten.text
        }
        Stage::Compile => {
            let pipeline = Config::load(cwd)?.pipeline()?;
            pipeline.compile(&source).map_err(|e| anyhow!(e))?.executable_text
        }
    };

    println!("{}", output);
    Ok(())
}
