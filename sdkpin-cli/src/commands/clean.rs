//! `sdkpin clean`: remove the materialized destination.

use std::path::PathBuf;

use anyhow::Result;

use sdkpin_core::Mode;
use sdkpin_sync::{Orchestrator, RunOutcome, SystemTools};

pub fn run(root: Option<PathBuf>) -> Result<i32> {
    let layout = super::load_layout(root)?;
    let tools = SystemTools::default();
    let outcome = Orchestrator::new(&layout, &tools).run(Mode::Clean)?;

    if let RunOutcome::Cleaned {
        destination,
        removed,
    } = &outcome
    {
        if *removed {
            println!("✓ Removed {}", destination.display());
        } else {
            println!("✓ Nothing to remove at {}", destination.display());
        }
    }
    Ok(outcome.exit_code())
}
