//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status
//! lines, plan listings, progress tracking and summary tables.

use crate::executor::ExecutionReport;
use crate::planner::{EntryKind, Plan, PlanEntry};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

const FOLDER_ICON: &str = "\u{1F4C1}";

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use foldersort::output::OutputFormatter;
    /// OutputFormatter::success("Sorting complete.");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints one planned transfer with its category icon.
    pub fn plan_entry(entry: &PlanEntry) {
        let name = entry
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.source.display().to_string());
        match entry.kind {
            EntryKind::File(category) => println!(
                "{} {} → {}",
                category.icon(),
                name,
                entry.destination.display()
            ),
            EntryKind::Folder => println!(
                "{} {} {} → {}",
                FOLDER_ICON,
                "[folder]".bold(),
                name.bold(),
                entry.destination.display()
            ),
        }
    }

    /// Prints every entry of a plan followed by the found-counts status line.
    pub fn plan(plan: &Plan, sort_folders: bool) {
        for entry in plan {
            Self::plan_entry(entry);
        }
        Self::info(&Self::plan_status(plan, sort_folders));
    }

    /// Status line such as `3 files found. | 1 folder found.`
    pub fn plan_status(plan: &Plan, sort_folders: bool) -> String {
        let files = plan.file_count();
        let mut status = format!("{} {} found.", files, plural(files, "file", "files"));
        if sort_folders {
            let folders = plan.folder_count();
            status.push_str(&format!(
                " | {} {} found.",
                folders,
                plural(folders, "folder", "folders")
            ));
        }
        status
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use foldersort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a summary table with entry counts by destination bucket.
    pub fn summary_table(bucket_counts: &BTreeMap<String, usize>, total: usize) {
        Self::header("SUMMARY");

        let max_bucket_len = bucket_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Items".bold(),
            width = max_bucket_len
        );
        println!("{}", "-".repeat(max_bucket_len + 10));

        for (bucket, count) in bucket_counts {
            println!(
                "{:<width$} | {} {}",
                bucket,
                count.to_string().green(),
                plural(*count, "item", "items"),
                width = max_bucket_len
            );
        }

        println!("{}", "-".repeat(max_bucket_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total, "item", "items"),
            width = max_bucket_len
        );
    }

    /// Prints the outcome of a completed run.
    pub fn report(report: &ExecutionReport, verb: &str) {
        Self::success(&format!(
            "Sorting complete: {} {} and {} {} {}.",
            report.files,
            plural(report.files, "file", "files"),
            report.folders,
            plural(report.folders, "folder", "folders"),
            verb
        ));
        if report.skipped_folders > 0 {
            Self::warning(&format!(
                "{} {} skipped because the destination already exists.",
                report.skipped_folders,
                plural(report.skipped_folders, "folder", "folders")
            ));
        }
    }

    /// Prints a preview notice message.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
