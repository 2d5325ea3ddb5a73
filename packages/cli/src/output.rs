//! Terminal tables and CSV/JSON export.

use std::io::Write;
use std::path::{Path, PathBuf};

use roster_diff_compare_models::{
    Comparison, ComparisonRow, ComparisonSummary, OverallSummary, Situation,
};
use roster_diff_roster_models::{PositionRecord, Snapshot, SnapshotSummary};
use roster_diff_snapshot::{BatchOutcome, DocumentReport, DocumentStatus};
use serde::Serialize;

const COMPARISON_HEADER: [&str; 12] = [
    "code",
    "situation",
    "title",
    "grade",
    "corps",
    "province",
    "old_occupant",
    "new_occupant",
    "old_funding",
    "new_funding",
    "funding_status",
    "occupation_status",
];

const RECORD_HEADER: [&str; 8] = [
    "code",
    "title",
    "grade",
    "corps",
    "province",
    "funding_status",
    "occupant",
    "occupation_status",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Header of one snapshot in the JSON report.
#[derive(Debug, Serialize)]
pub struct SnapshotHeader<'a> {
    pub source_name: &'a str,
    pub date_label: &'a str,
    pub summary: SnapshotSummary,
}

/// Everything `compare --json` prints.
#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub overall: OverallSummary,
    pub snapshots: Vec<SnapshotHeader<'a>>,
    pub comparisons: &'a [Comparison],
}

impl<'a> ComparisonReport<'a> {
    #[must_use]
    pub fn new(
        overall: OverallSummary,
        snapshots: &'a [Snapshot],
        comparisons: &'a [Comparison],
    ) -> Self {
        Self {
            overall,
            snapshots: snapshots
                .iter()
                .map(|snapshot| SnapshotHeader {
                    source_name: &snapshot.source_name,
                    date_label: &snapshot.date_label,
                    summary: snapshot.summary,
                })
                .collect(),
            comparisons,
        }
    }
}

/// Cuts `value` to `width` characters, marking the cut with `~`.
fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_owned();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn status_label(report: &DocumentReport) -> String {
    match &report.status {
        DocumentStatus::Succeeded { records } => format!("ok ({records})"),
        DocumentStatus::Failed { .. } => "FAILED".to_owned(),
    }
}

/// Prints one line per input document, then the failure reasons.
pub fn print_reports(outcome: &BatchOutcome) {
    println!(
        "{:<32} {:<12} {:>7} {:>6} {:>6} {:>8} {:>9}",
        "DOCUMENT", "STATUS", "LINES", "PAGES", "EMPTY", "NO CODE", "RELEASED"
    );
    println!("{}", "-".repeat(86));
    for report in &outcome.reports {
        let stats = &report.stats;
        println!(
            "{:<32} {:<12} {:>7} {:>6} {:>6} {:>8} {:>9}",
            fit(&report.name, 32),
            status_label(report),
            stats.lines,
            stats.pages,
            stats.pages_without_text,
            stats.positions_without_code,
            stats.positions_released,
        );
    }

    for report in &outcome.reports {
        if let DocumentStatus::Failed { error } = &report.status {
            println!("  {}: {error}", report.name);
        }
        if !report.stats.empty_pages_listed.is_empty() {
            let pages: Vec<String> = report
                .stats
                .empty_pages_listed
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("  {}: no text on page(s) {}", report.name, pages.join(", "));
        }
    }
    println!();
}

pub fn print_overall(overall: &OverallSummary, snapshots: &[Snapshot]) {
    println!("{:<12} {:<32} {:>9}", "DATE", "DOCUMENT", "POSITIONS");
    println!("{}", "-".repeat(55));
    for snapshot in snapshots {
        println!(
            "{:<12} {:<32} {:>9}",
            snapshot.date_label,
            fit(&snapshot.source_name, 32),
            snapshot.len()
        );
    }
    println!(
        "\n{} versions: {} -> {} positions ({:+})\n",
        overall.versions, overall.initial_total, overall.final_total, overall.delta
    );
}

fn print_summary(summary: &ComparisonSummary) {
    println!(
        "  total {} | new {} | removed {} | occupant {} | funding {} | both {} | unchanged {}",
        summary.total,
        summary.new,
        summary.removed,
        summary.occupant_changed,
        summary.funding_changed,
        summary.occupant_and_funding_changed,
        summary.unchanged,
    );
}

/// Prints a comparison's header, summary, and every row that is not
/// unchanged.
pub fn print_comparison(comparison: &Comparison) {
    println!(
        "{} ({}) -> {} ({})",
        comparison.old_name,
        comparison.old_date_label,
        comparison.new_name,
        comparison.new_date_label
    );
    print_summary(&comparison.summary);

    let changed: Vec<&ComparisonRow> = comparison
        .rows
        .iter()
        .filter(|row| row.situation != Situation::Unchanged)
        .collect();
    if changed.is_empty() {
        println!("  No changes.\n");
        return;
    }

    println!(
        "\n{:<9} {:<28} {:<6} {:<12} {:<24} {:<24} {:<9} {:<9}",
        "CODE", "SITUATION", "GRADE", "PROVINCE", "OLD OCCUPANT", "NEW OCCUPANT", "OLD FUND", "NEW FUND"
    );
    println!("{}", "-".repeat(128));
    for row in changed {
        println!(
            "{:<9} {:<28} {:<6} {:<12} {:<24} {:<24} {:<9} {:<9}",
            row.code,
            row.situation.as_ref(),
            row.grade.as_deref().unwrap_or_default(),
            row.province.as_ref(),
            fit(row.old_occupant_display(), 24),
            fit(row.new_occupant_display(), 24),
            row.old_funding_display(),
            row.new_funding_display(),
        );
    }
    println!();
}

/// Prints a snapshot's summary and the given records.
pub fn print_snapshot(snapshot: &Snapshot, records: &[&PositionRecord]) {
    let summary = &snapshot.summary;
    println!("{} ({})", snapshot.source_name, snapshot.date_label);
    println!(
        "  total {} | funded {} | unfunded {} | occupied {} | vacant {}\n",
        summary.total, summary.funded, summary.unfunded, summary.occupied, summary.vacant
    );

    println!(
        "{:<9} {:<6} {:<12} {:<9} {:<9} {:<28} TITLE",
        "CODE", "GRADE", "PROVINCE", "FUNDING", "STATUS", "OCCUPANT"
    );
    println!("{}", "-".repeat(100));
    for record in records {
        println!(
            "{:<9} {:<6} {:<12} {:<9} {:<9} {:<28} {}",
            record.code,
            record.grade.as_deref().unwrap_or_default(),
            record.province.as_ref(),
            record.funding_status.as_ref(),
            record.occupation_status.as_ref(),
            fit(&record.occupant_name, 28),
            record.title.as_deref().unwrap_or_default(),
        );
    }
    println!();
}

/// Writes comparison rows as CSV.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_comparison_csv<W: Write>(
    writer: W,
    comparison: &Comparison,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COMPARISON_HEADER)?;
    for row in &comparison.rows {
        csv.write_record([
            row.code.as_str(),
            row.situation.as_ref(),
            row.title.as_deref().unwrap_or_default(),
            row.grade.as_deref().unwrap_or_default(),
            row.corps.as_deref().unwrap_or_default(),
            row.province.as_ref(),
            row.old_occupant_display(),
            row.new_occupant_display(),
            row.old_funding_display(),
            row.new_funding_display(),
            row.funding_status.as_ref(),
            row.occupation_status.as_ref(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes snapshot records as CSV.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_records_csv<W: Write>(
    writer: W,
    records: &[&PositionRecord],
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RECORD_HEADER)?;
    for record in records {
        csv.write_record([
            record.code.as_str(),
            record.title.as_deref().unwrap_or_default(),
            record.grade.as_deref().unwrap_or_default(),
            record.corps.as_deref().unwrap_or_default(),
            record.province.as_ref(),
            record.funding_status.as_ref(),
            record.occupant_name.as_str(),
            record.occupation_status.as_ref(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

fn file_stem(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    stem.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// File name for the `index`-th comparison, e.g.
/// `01_march_vs_april.csv`.
#[must_use]
pub fn comparison_file_name(index: usize, comparison: &Comparison) -> String {
    format!(
        "{:02}_{}_vs_{}.csv",
        index + 1,
        file_stem(&comparison.old_name),
        file_stem(&comparison.new_name)
    )
}

/// Writes one CSV file per comparison into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`ExportError`] if the directory or a file cannot be written.
pub fn export_comparisons(
    dir: &Path,
    comparisons: &[Comparison],
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(comparisons.len());
    for (index, comparison) in comparisons.iter().enumerate() {
        let path = dir.join(comparison_file_name(index, comparison));
        let file = std::fs::File::create(&path)?;
        write_comparison_csv(std::io::BufWriter::new(file), comparison)?;
        log::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(value)?)
}
