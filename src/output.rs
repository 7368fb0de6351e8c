//! CLI output formatting for build results.
//!
//! Output is information-centric: the primary display for every page is its
//! name and positional index, with the concrete routes it produced as
//! indented context lines. Format functions are pure — they return lines
//! and never touch stdout — so they can be asserted against directly; the
//! `print_*` wrappers do the writing.
//!
//! ```text
//! 001 home
//!     → hello_world.html
//! 002 cruise_report
//!     → Shippy/cruise/1/index.html
//!     → Shippy/cruise/2/index.html
//!     = Boatty/cruise/99/index.html (kept)
//!
//! Generated 2 pages, 3 files (1 kept)
//! ```

use crate::builder::BuildReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format one build report as display lines.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, page) in report.pages.iter().enumerate() {
        lines.push(format!("{} {}", format_index(pos + 1), page.name));
        for route in &page.written {
            lines.push(format!("    → {route}"));
        }
        for route in &page.skipped {
            lines.push(format!("    = {route} (kept)"));
        }
    }
    lines.push(String::new());
    let written = report.total_written();
    let skipped = report.total_skipped();
    let mut summary = format!(
        "Generated {} page{}, {} file{}",
        report.pages.len(),
        plural(report.pages.len()),
        written,
        plural(written),
    );
    if skipped > 0 {
        summary.push_str(&format!(" ({skipped} kept)"));
    }
    lines.push(summary);
    lines.push(format!("Site generated at {}", report.dest.display()));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{line}");
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PageReport;
    use std::path::PathBuf;

    fn sample_report() -> BuildReport {
        BuildReport {
            dest: PathBuf::from("build"),
            pages: vec![
                PageReport {
                    name: "home".into(),
                    written: vec!["hello_world.html".into()],
                    skipped: vec![],
                },
                PageReport {
                    name: "cruise_report".into(),
                    written: vec!["Shippy/cruise/1/index.html".into()],
                    skipped: vec!["Boatty/cruise/99/index.html".into()],
                },
            ],
        }
    }

    #[test]
    fn pages_are_indexed_and_routes_indented() {
        let lines = format_build_output(&sample_report());
        assert_eq!(lines[0], "001 home");
        assert_eq!(lines[1], "    → hello_world.html");
        assert_eq!(lines[2], "002 cruise_report");
        assert_eq!(lines[4], "    = Boatty/cruise/99/index.html (kept)");
    }

    #[test]
    fn summary_counts_written_and_kept() {
        let lines = format_build_output(&sample_report());
        assert_eq!(lines[lines.len() - 2], "Generated 2 pages, 2 files (1 kept)");
        assert_eq!(lines.last().unwrap(), "Site generated at build");
    }

    #[test]
    fn singular_summary_reads_naturally() {
        let report = BuildReport {
            dest: PathBuf::from("build"),
            pages: vec![PageReport {
                name: "home".into(),
                written: vec!["index.html".into()],
                skipped: vec![],
            }],
        };
        let lines = format_build_output(&report);
        assert_eq!(lines[lines.len() - 2], "Generated 1 page, 1 file");
    }
}
