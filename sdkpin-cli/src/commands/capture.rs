//! `sdkpin capture [--dry-run]`: regenerate the patch from the mirror.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use sdkpin_core::Mode;
use sdkpin_sync::{MirrorReport, Orchestrator, RunOutcome, SystemTools};

/// Arguments for `sdkpin capture`.
#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Print how the stored patch would change without writing it.
    #[arg(long)]
    pub dry_run: bool,
}

impl CaptureArgs {
    pub fn run(self, root: Option<PathBuf>) -> Result<i32> {
        let layout = super::load_layout(root)?;
        let tools = SystemTools::default();
        let outcome = Orchestrator::new(&layout, &tools).run(Mode::Capture {
            dry_run: self.dry_run,
        })?;

        match &outcome {
            RunOutcome::Captured {
                patch,
                bytes,
                changed,
                mirror,
            } => {
                let verb = if *changed { "Wrote" } else { "Unchanged" };
                println!("✓ {verb} {} ({bytes} bytes)", patch.display());
                print_mirror(mirror);
            }
            RunOutcome::Previewed {
                patch,
                diff,
                mirror,
            } => {
                if diff.is_empty() {
                    println!("[dry-run] ✓ {} is up to date", patch.display());
                } else {
                    print!("{diff}");
                    if !diff.ends_with('\n') {
                        println!();
                    }
                }
                print_mirror(mirror);
            }
            _ => {}
        }
        Ok(outcome.exit_code())
    }
}

fn print_mirror(mirror: &MirrorReport) {
    if mirror.cloned {
        println!("  ·  mirror cloned");
    } else if !mirror.refreshed() {
        println!("  ·  mirror not refreshed; diff reflects its current local state");
    }
}
