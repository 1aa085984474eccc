//! `sdkpin status`: what is on disk and whether it matches the declared version.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use sdkpin_sync::{status, StatusReport, SystemTools};

/// Arguments for `sdkpin status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, root: Option<PathBuf>) -> Result<i32> {
        let layout = super::load_layout(root)?;
        let report = status::collect(&layout, &SystemTools::default());

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
        } else {
            print_table(&report);
        }
        Ok(0)
    }
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "item")]
    item: &'static str,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_table(report: &StatusReport) {
    let version = match (&report.version, &report.version_error) {
        (Some(v), _) => v.bold().to_string(),
        (None, Some(err)) => err.red().to_string(),
        (None, None) => "unknown".red().to_string(),
    };
    println!(
        "sdkpin v{} | {} | SDK {version}",
        env!("CARGO_PKG_VERSION"),
        report.root.display()
    );

    let up = &report.upstream;
    let upstream_state = match up.tag_matches {
        Some(true) => ok("at tag"),
        Some(false) => bad("MISMATCH"),
        None => warn("unknown"),
    };
    let upstream_detail = match (&up.checked_out_tag, &up.expected_tag, &up.error) {
        (_, _, Some(err)) => err.clone(),
        (Some(actual), Some(expected), None) => format!("{actual} (expected {expected})"),
        (None, Some(expected), None) => format!("untagged (expected {expected})"),
        (actual, None, None) => actual.clone().unwrap_or_default(),
    };

    let destination_detail = report
        .destination
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mirror_state = match (report.mirror.present, report.mirror.working_copy) {
        (true, true) => ok("present"),
        (true, false) => bad("not a working copy"),
        (false, _) => warn("absent"),
    };

    let (patch_state, patch_detail) = match &report.patch.digest {
        Some(d) => (
            ok("present"),
            format!("{} bytes, sha256 {}", d.bytes, &d.sha256[..12]),
        ),
        None => (bad("missing"), report.patch.path.display().to_string()),
    };

    let rows = vec![
        StatusTableRow {
            item: "upstream",
            state: upstream_state,
            detail: upstream_detail,
        },
        StatusTableRow {
            item: "destination",
            state: if report.destination.present {
                ok("present")
            } else {
                warn("absent")
            },
            detail: destination_detail,
        },
        StatusTableRow {
            item: "mirror",
            state: mirror_state,
            detail: report.mirror.path.display().to_string(),
        },
        StatusTableRow {
            item: "patch",
            state: patch_state,
            detail: patch_detail,
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn ok(s: &str) -> String {
    s.green().to_string()
}

fn warn(s: &str) -> String {
    s.yellow().to_string()
}

fn bad(s: &str) -> String {
    s.red().bold().to_string()
}
