// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All work is delegated to Layer 2 (application); this layer
// only turns results into console output.
//
// Two commands are supported:
//   1. `generate` — one .docx per office from the budget workbook
//   2. `inspect`  — show how a template will be spliced

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, InspectArgs};

#[derive(Parser, Debug)]
#[command(
    name = "budget-docgen",
    version = "0.1.0",
    about = "Generate per-office expense approval documents from a budget workbook and a .docx template."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => Self::run_generate(args),
            Commands::Inspect(args)  => Self::run_inspect(args),
        }
    }

    fn run_generate(args: GenerateArgs) -> Result<()> {
        use crate::application::generate_use_case::GenerateUseCase;

        tracing::info!("Generating from '{}' with template '{}'", args.workbook, args.template);

        let output_dir = args.output_dir.clone();
        let summary    = GenerateUseCase::new(args.into()).execute()?;

        println!(
            "\n{} succeeded, {} failed. Output in '{}'.",
            summary.succeeded(),
            summary.failed(),
            output_dir
        );
        for outcome in summary.failures() {
            println!(
                "  ✗ {}: {}",
                outcome.group,
                outcome.failure.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }

    fn run_inspect(args: InspectArgs) -> Result<()> {
        use crate::application::inspect_use_case::InspectUseCase;

        let (report, profile) = InspectUseCase::new(&args.template, args.profile).execute()?;

        for block in &report.blocks {
            let mark = if report.is_replaced(block.index, profile.replace_end_marker) { "*" } else { " " };
            println!("{mark}[{:>3}] {:<9} {}", block.index, format!("{:?}", block.kind), block.text);
        }

        match &report.region {
            Ok(r)  => println!("\nRegion: start marker at {}, end marker at {} (* = replaced)", r.start, r.end),
            Err(e) => println!("\nRegion: {e}"),
        }

        if let Some(path) = args.write_profile {
            InspectUseCase::write_profile(&profile, std::path::Path::new(&path))?;
            println!("Profile written to '{path}'.");
        }
        Ok(())
    }
}
