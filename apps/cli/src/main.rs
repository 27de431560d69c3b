//! studyloop CLI — study-capture to knowledge-workspace pipeline.
//!
//! Converts a captured study document into structured text, generates
//! task-specific study content, and writes task pages into a knowledge
//! workspace with a feedback-driven strategy note.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
