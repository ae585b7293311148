//! Console output.
//!
//! Stage progress lines, the end-of-run summary table and the next steps
//! list. Everything here writes to stdout; diagnostics go through `tracing`.

use crate::config::ProvisionConfig;
use crate::orchestrator::RunReport;
use crate::platform::{OsFamily, PlatformProfile};
use crate::provision::{ProvisioningResult, Stage, StageStatus};
use colored::*;
use std::cmp;

/// Box-drawn table that shrinks its widest column to fit the terminal.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], visible_len(&flatten(cell)));
            }
        }

        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((widest, &width)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if width <= 8 {
                break;
            }
            widths[widest] -= 1;
        }
        widths
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let border = |left: &str, mid: &str, right: &str| -> String {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, inner.join(mid), right)
        };
        let line = |cells: Vec<String>| -> String {
            let mut out = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let shown = console::truncate_str(cell, *width, "...").to_string();
                let padding = width.saturating_sub(visible_len(&shown));
                out.push_str(&format!(" {}{} │", shown, " ".repeat(padding)));
            }
            out
        };

        let mut lines = vec![border("┌", "┬", "┐")];
        lines.push(line(
            self.headers.iter().map(|h| h.bold().to_string()).collect(),
        ));
        lines.push(border("├", "┼", "┤"));
        for row in &self.rows {
            lines.push(line(row.iter().map(|c| flatten(c)).collect()));
        }
        lines.push(border("└", "┴", "┘"));
        lines
    }
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

fn visible_len(s: &str) -> usize {
    console::measure_text_width(s)
}

pub fn print_banner() {
    println!(
        "{} {}",
        "bootstrap-deps".bold().cyan(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}

pub fn print_profile(profile: &PlatformProfile) {
    println!("{} Checking platform...", "🔍".blue());
    println!(
        "   {} OS: {} ({})",
        "✓".green(),
        profile.os_family(),
        profile.arch()
    );
    if profile.os_family() == OsFamily::Windows {
        println!("   {} Packages: vcpkg", "✓".green());
    } else if profile.package_manager().binary().is_some() {
        println!(
            "   {} Package manager: {}",
            "✓".green(),
            profile.package_manager()
        );
    } else {
        println!("   {} Package manager: none detected", "!".yellow());
    }
    println!("   {} Platform key: {}", "✓".green(), profile.platform_key());
    println!();
}

pub fn print_stage_header(stage: Stage) {
    let title = match stage {
        Stage::Submodules => "Initializing submodules...",
        Stage::Packages => "Installing system packages...",
        Stage::Archive => "Fetching prebuilt dependencies...",
    };
    println!("{} {}", "⚙".cyan(), title.bold());
}

pub fn print_stage_result(result: &ProvisioningResult) {
    println!(
        "   {} {}: {}",
        glyph(result.status),
        result.stage,
        result.detail
    );
    println!();
}

fn glyph(status: StageStatus) -> ColoredString {
    match status {
        StageStatus::Ok => "✓".green(),
        StageStatus::Skipped => "-".dimmed(),
        StageStatus::Degraded => "!".yellow(),
        StageStatus::Failed => "x".red(),
    }
}

fn colored_status(status: StageStatus) -> String {
    let label = status.to_string();
    match status {
        StageStatus::Ok => label.green(),
        StageStatus::Skipped => label.dimmed(),
        StageStatus::Degraded => label.yellow(),
        StageStatus::Failed => label.red().bold(),
    }
    .to_string()
}

pub fn summary_table(report: &RunReport) -> Table {
    let mut table = Table::new(&["Stage", "Status", "Detail"]);
    for result in &report.results {
        table.add_row(vec![
            result.stage.to_string(),
            colored_status(result.status),
            result.detail.clone(),
        ]);
    }
    table
}

pub fn print_summary(report: &RunReport) {
    println!("{}", "Summary".bold());
    summary_table(report).print();

    let advisories: Vec<&str> = report.advisories().collect();
    if !advisories.is_empty() {
        println!();
        println!("{}", "Advisories".bold().yellow());
        for advisory in advisories {
            println!("   {} {}", "!".yellow(), advisory);
        }
    }
}

/// Printed regardless of outcome.
pub fn next_steps(config: &ProvisionConfig, profile: &PlatformProfile) -> Vec<String> {
    let mut steps = vec![format!(
        "cmake -B build -S {}",
        config.root.display()
    )];
    let dist = config.dist_dir(&profile.platform_key());
    if dist.is_dir() {
        steps.push(format!(
            "Prebuilt dependencies are in {}",
            dist.display()
        ));
    }
    if profile.os_family() == OsFamily::Windows {
        steps.push(format!(
            "Pass -DCMAKE_TOOLCHAIN_FILE={} to cmake",
            config
                .vcpkg_root
                .join("scripts/buildsystems/vcpkg.cmake")
                .display()
        ));
    }
    steps.push("cmake --build build".to_string());
    steps
}

pub fn print_next_steps(config: &ProvisionConfig, profile: &PlatformProfile) {
    println!();
    println!("{}", "Next steps".bold());
    for (i, step) in next_steps(config, profile).iter().enumerate() {
        println!("   {}. {}", i + 1, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PackageManager;

    #[test]
    fn test_table_fits_requested_width() {
        let mut table = Table::new(&["Stage", "Status", "Detail"]);
        table.add_row(vec![
            "archive".to_string(),
            "degraded".to_string(),
            "download failed: transport error: connection refused by remote host".to_string(),
        ]);

        for line in table.render(50) {
            assert!(visible_len(&line) <= 50, "too wide: {}", line);
        }
    }

    #[test]
    fn test_rows_with_wrong_arity_are_dropped() {
        let mut table = Table::new(&["Stage", "Status"]);
        table.add_row(vec!["only one".to_string()]);
        // borders and header only
        assert_eq!(table.render(80).len(), 4);
    }

    #[test]
    fn test_summary_has_one_row_per_stage() {
        let report = RunReport {
            results: Stage::ALL
                .iter()
                .map(|s| ProvisioningResult::skipped(*s, "skipped"))
                .collect(),
            interrupted: false,
        };
        assert_eq!(summary_table(&report).render(120).len(), 4 + Stage::ALL.len());
    }

    #[test]
    fn test_next_steps_mention_toolchain_file_on_windows() {
        let config = ProvisionConfig::new("/src/app");
        let windows = PlatformProfile::new(OsFamily::Windows, "x86_64", PackageManager::None);
        let linux = PlatformProfile::new(OsFamily::Linux, "x86_64", PackageManager::Apt);

        assert!(
            next_steps(&config, &windows)
                .iter()
                .any(|s| s.contains("vcpkg.cmake"))
        );
        let steps = next_steps(&config, &linux);
        assert_eq!(steps.first().unwrap(), "cmake -B build -S /src/app");
        assert_eq!(steps.last().unwrap(), "cmake --build build");
    }
}
