//! CLI definitions and plumbing.

use std::path::Path;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a typedblocks.toml file
    #[arg(short = 'c', long)]
    pub config: Option<Box<Path>>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a TypedLang program and print the type of each expression
    Check { input: Box<Path> },
    /// Import a TypedLang program and print the code generated from its blocks
    Gen { input: Box<Path> },
}
