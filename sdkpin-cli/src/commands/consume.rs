//! `sdkpin consume`: validate, materialize, patch.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use sdkpin_core::Mode;
use sdkpin_sync::{Orchestrator, PatchStatus, RunOutcome, SystemTools};

pub fn run(root: Option<PathBuf>) -> Result<i32> {
    let layout = super::load_layout(root)?;
    let tools = SystemTools::default();
    let outcome = Orchestrator::new(&layout, &tools).run(Mode::Consume)?;

    if let RunOutcome::Consumed {
        destination,
        files,
        patch,
    } = &outcome
    {
        let note = match patch {
            PatchStatus::Clean => "patch applied cleanly".green().to_string(),
            PatchStatus::Fuzzy => "patch applied with offsets/fuzz; review before building"
                .yellow()
                .to_string(),
            PatchStatus::Rejected(count) => format!(
                "patch left {count} *.rej file(s) under {}; rejected hunks must be fixed by hand",
                destination.display()
            )
            .red()
            .bold()
            .to_string(),
            PatchStatus::Failed(code) => format!("patch FAILED (status {code})").red().bold().to_string(),
        };
        println!("✓ Materialized {} ({files} files)", destination.display());
        println!("  {note}");
    }
    Ok(outcome.exit_code())
}
