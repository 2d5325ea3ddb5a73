#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Snapshot set building.
//!
//! Turns a batch of uploaded documents into [`Snapshot`]s ordered by the
//! date printed in each document. Documents are processed one at a time;
//! a document that cannot be read or yields no positions is reported as
//! failed and left out, without affecting the others. The batch as a whole
//! only fails when too few documents remain to compare.

pub mod date;
pub mod progress;
pub mod session;
pub mod upload;

use roster_diff_extract::{ExtractionConfig, extract_records};
use roster_diff_pdf::{ExtractedDocument, PdfError, TextSource};
use roster_diff_roster_models::Snapshot;

use crate::date::infer_date;
use crate::progress::ProgressCallback;
use crate::upload::InputDocument;

/// Page numbers listed in per-document stats when text is missing.
pub const MAX_LISTED_EMPTY_PAGES: usize = 10;

/// Why a single document produced no snapshot.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Unreadable(#[from] PdfError),

    #[error("No position records could be extracted from {0}")]
    NoRecords(String),
}

/// Errors that stop a batch from being compared.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Only {usable} document(s) produced records, at least {required} are needed")]
    InsufficientDocuments { usable: usize, required: usize },
}

/// Per-document extraction statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub lines: usize,
    pub pages: usize,
    pub pages_without_text: usize,
    /// The first [`MAX_LISTED_EMPTY_PAGES`] page numbers without text.
    pub empty_pages_listed: Vec<usize>,
    pub positions_without_code: usize,
    pub duplicates_removed: usize,
    pub positions_released: usize,
}

/// Outcome of one document.
#[derive(Debug)]
pub enum DocumentStatus {
    Succeeded { records: usize },
    Failed { error: DocumentError },
}

impl DocumentStatus {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

#[derive(Debug)]
pub struct DocumentReport {
    pub name: String,
    pub status: DocumentStatus,
    pub stats: DocumentStats,
}

/// Everything a batch produced: snapshots in chronological order and one
/// report per input, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub snapshots: Vec<Snapshot>,
    pub reports: Vec<DocumentReport>,
}

impl BatchOutcome {
    /// Checks that enough snapshots exist to compare.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InsufficientDocuments`] when fewer than
    /// `min_documents` documents produced records.
    pub fn ensure_comparable(&self, min_documents: usize) -> Result<(), BatchError> {
        if self.snapshots.len() < min_documents {
            return Err(BatchError::InsufficientDocuments {
                usable: self.snapshots.len(),
                required: min_documents,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| !report.status.is_success())
            .count()
    }
}

/// Extracts, reconciles and dates the records of one document's text.
///
/// # Errors
///
/// Returns [`DocumentError::NoRecords`] when no position could be found.
pub fn build_snapshot(
    document: &ExtractedDocument,
    config: &ExtractionConfig,
) -> Result<(Snapshot, DocumentStats), DocumentError> {
    let lines: Vec<&str> = document.lines().collect();
    let empty_pages = document.pages_without_text();
    let extraction = extract_records(&lines, config);

    let stats = DocumentStats {
        lines: lines.len(),
        pages: document.pages.len(),
        pages_without_text: empty_pages.len(),
        empty_pages_listed: empty_pages
            .into_iter()
            .take(MAX_LISTED_EMPTY_PAGES)
            .collect(),
        positions_without_code: extraction.stats.positions_without_code,
        duplicates_removed: extraction.stats.duplicates_removed,
        positions_released: extraction.stats.positions_released,
    };

    log::debug!("{}: {} lines extracted", document.name, stats.lines);

    if extraction.records.is_empty() {
        log::error!("No records extracted from {}", document.name);
        return Err(DocumentError::NoRecords(document.name.clone()));
    }

    let date = infer_date(document.first_page_lines(), config.date_scan_lines);
    log::info!(
        "{}: {} positions, dated {}",
        document.name,
        extraction.records.len(),
        date.label
    );

    Ok((
        Snapshot::new(&document.name, date.date, date.label, extraction.records),
        stats,
    ))
}

/// Reads and processes one input document.
///
/// # Errors
///
/// Returns [`DocumentError`] when the bytes are unreadable or yield no
/// records.
pub fn process_document(
    input: &InputDocument,
    source: &dyn TextSource,
    config: &ExtractionConfig,
) -> Result<(Snapshot, DocumentStats), DocumentError> {
    let document = source.extract(&input.bytes, &input.name)?;
    build_snapshot(&document, config)
}

/// Processes every input in order and sorts the resulting snapshots by
/// date, undated first, ties kept in input order.
///
/// Progress advances once per document.
pub fn build_snapshots(
    inputs: &[InputDocument],
    source: &dyn TextSource,
    config: &ExtractionConfig,
    progress: &dyn ProgressCallback,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    progress.begin(inputs.len() as u64);

    for input in inputs {
        progress.document(&input.name);

        let report = match process_document(input, source, config) {
            Ok((snapshot, stats)) => {
                let records = snapshot.len();
                outcome.snapshots.push(snapshot);
                DocumentReport {
                    name: input.name.clone(),
                    status: DocumentStatus::Succeeded { records },
                    stats,
                }
            }
            Err(error) => {
                log::warn!("Skipping {}: {error}", input.name);
                DocumentReport {
                    name: input.name.clone(),
                    status: DocumentStatus::Failed { error },
                    stats: DocumentStats::default(),
                }
            }
        };
        outcome.reports.push(report);
        progress.advance();
    }

    outcome.snapshots.sort_by_key(|snapshot| snapshot.date);

    progress.finish(format!(
        "{} of {} documents processed",
        outcome.snapshots.len(),
        inputs.len()
    ));

    outcome
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use roster_diff_pdf::PlainTextSource;

    use super::*;
    use crate::progress::NullProgress;
    use crate::test_support::roster_text;

    fn input(name: &str, text: &str) -> InputDocument {
        InputDocument::new(name, text.as_bytes().to_vec())
    }

    fn run(inputs: &[InputDocument]) -> BatchOutcome {
        build_snapshots(
            inputs,
            &PlainTextSource,
            &ExtractionConfig::default(),
            &NullProgress,
        )
    }

    #[test]
    fn snapshots_sorted_by_date_undated_first() {
        let outcome = run(&[
            input("march.txt", &roster_text(Some("15/03/2024"), &["111111"])),
            input("undated_a.txt", &roster_text(None, &["222222"])),
            input("january.txt", &roster_text(Some("10/01/2024"), &["333333"])),
            input("undated_b.txt", &roster_text(None, &["444444"])),
        ]);

        let names: Vec<&str> = outcome
            .snapshots
            .iter()
            .map(|s| s.source_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["undated_a.txt", "undated_b.txt", "january.txt", "march.txt"]
        );
        assert_eq!(outcome.snapshots[2].date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(outcome.snapshots[0].date_label, "UNDATED");
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let outcome = run(&[
            input("b.txt", &roster_text(Some("01/01/2024"), &["111111"])),
            input("a.txt", &roster_text(Some("01/01/2024"), &["222222"])),
        ]);
        assert_eq!(outcome.snapshots[0].source_name, "b.txt");
        assert_eq!(outcome.snapshots[1].source_name, "a.txt");
    }

    #[test]
    fn failed_documents_are_isolated() {
        let outcome = run(&[
            input("good.txt", &roster_text(Some("01/01/2024"), &["111111", "222222"])),
            input("no_positions.txt", "JUST A HEADER\nFecha: 01/01/2024\n"),
            InputDocument::new("empty.txt", Vec::new()),
        ]);

        assert_eq!(outcome.snapshots.len(), 1);
        assert_eq!(outcome.failed(), 2);
        assert!(matches!(
            outcome.reports[0].status,
            DocumentStatus::Succeeded { records: 2 }
        ));
        assert!(matches!(
            outcome.reports[1].status,
            DocumentStatus::Failed {
                error: DocumentError::NoRecords(_)
            }
        ));
        assert!(matches!(
            outcome.reports[2].status,
            DocumentStatus::Failed {
                error: DocumentError::Unreadable(PdfError::Empty(_))
            }
        ));
    }

    #[test]
    fn fewer_than_two_snapshots_is_insufficient() {
        let outcome = run(&[
            input("good.txt", &roster_text(None, &["111111"])),
            input("bad.txt", "nothing here"),
        ]);

        assert!(matches!(
            outcome.ensure_comparable(2),
            Err(BatchError::InsufficientDocuments {
                usable: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn zero_usable_documents_is_insufficient() {
        let outcome = run(&[input("a.txt", "x"), input("b.txt", "y")]);
        assert!(outcome.snapshots.is_empty());
        assert!(outcome.ensure_comparable(2).is_err());
    }

    #[test]
    fn stats_report_pages_without_text() {
        let text = format!("{}\x0c   \x0c\x0cMORE", roster_text(None, &["111111"]));
        let outcome = run(&[input("gaps.txt", &text)]);

        let stats = &outcome.reports[0].stats;
        assert_eq!(stats.pages, 4);
        assert_eq!(stats.pages_without_text, 2);
        assert_eq!(stats.empty_pages_listed, vec![2, 3]);
        assert_eq!(stats.lines, 3);
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: std::sync::Mutex<Vec<String>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn begin(&self, documents: u64) {
            self.events.lock().unwrap().push(format!("begin {documents}"));
        }
        fn document(&self, name: &str) {
            self.events.lock().unwrap().push(format!("document {name}"));
        }
        fn advance(&self) {
            self.events.lock().unwrap().push("advance".to_string());
        }
        fn finish(&self, summary: String) {
            self.events.lock().unwrap().push(format!("finish {summary}"));
        }
        fn clear(&self) {
            self.events.lock().unwrap().push("clear".to_string());
        }
    }

    #[test]
    fn progress_follows_each_document() {
        let progress = RecordingProgress::default();
        build_snapshots(
            &[
                input("good.txt", &roster_text(None, &["111111"])),
                input("bad.txt", "nothing here"),
            ],
            &PlainTextSource,
            &ExtractionConfig::default(),
            &progress,
        );

        assert_eq!(
            *progress.events.lock().unwrap(),
            vec![
                "begin 2",
                "document good.txt",
                "advance",
                "document bad.txt",
                "advance",
                "finish 1 of 2 documents processed",
            ]
        );
    }
}
