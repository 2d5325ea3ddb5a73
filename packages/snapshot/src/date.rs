//! Document date inference.
//!
//! Roster reports print their issue date near the top of the first page on
//! a line labelled `Fecha`, as `dd/mm/yyyy`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use roster_diff_roster_models::UNDATED_LABEL;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}/\d{2}/\d{4})").expect("valid regex"));

const DATE_LABELS: &[&str] = &["Fecha", "fecha"];

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Date found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDate {
    /// Parsed date, `None` when missing or unparseable.
    pub date: Option<NaiveDate>,
    /// The date as printed, or [`UNDATED_LABEL`] when none was found.
    pub label: String,
}

impl DocumentDate {
    #[must_use]
    pub fn undated() -> Self {
        Self {
            date: None,
            label: UNDATED_LABEL.to_owned(),
        }
    }
}

/// Scans the first `scan_lines` lines for a labelled `dd/mm/yyyy` date.
///
/// The first labelled line carrying a date token decides. A token that is
/// not a real calendar date keeps its printed label but sorts as undated.
#[must_use]
pub fn infer_date<S: AsRef<str>>(first_page: &[S], scan_lines: usize) -> DocumentDate {
    first_page
        .iter()
        .take(scan_lines)
        .map(AsRef::as_ref)
        .filter(|line| DATE_LABELS.iter().any(|label| line.contains(label)))
        .find_map(|line| DATE_RE.captures(line))
        .map_or_else(DocumentDate::undated, |caps| {
            let label = caps[1].to_owned();
            let date = NaiveDate::parse_from_str(&label, DATE_FORMAT).ok();
            if date.is_none() {
                log::warn!("Unparseable document date '{label}'");
            }
            DocumentDate { date, label }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_labelled_date() {
        let lines = ["RELACIÓN DE PUESTOS", "Fecha de emisión: 15/03/2024 10:00"];
        let date = infer_date(&lines, 10);
        assert_eq!(date.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(date.label, "15/03/2024");
    }

    #[test]
    fn lowercase_label_is_accepted() {
        let date = infer_date(&["a fecha 01/12/2023"], 10);
        assert_eq!(date.date, NaiveDate::from_ymd_opt(2023, 12, 1));
    }

    #[test]
    fn unlabelled_dates_are_ignored() {
        let date = infer_date(&["Emitido 15/03/2024"], 10);
        assert_eq!(date, DocumentDate::undated());
    }

    #[test]
    fn only_leading_lines_are_scanned() {
        let mut lines = vec!["HEADER"; 10];
        lines.push("Fecha: 15/03/2024");
        assert_eq!(infer_date(&lines, 10), DocumentDate::undated());
        assert!(infer_date(&lines, 11).date.is_some());
    }

    #[test]
    fn labelled_line_without_date_does_not_stop_scan() {
        let date = infer_date(&["Fecha:", "Fecha: 02/01/2024"], 10);
        assert_eq!(date.date, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn invalid_calendar_date_keeps_label() {
        let date = infer_date(&["Fecha: 31/02/2024"], 10);
        assert_eq!(date.date, None);
        assert_eq!(date.label, "31/02/2024");
    }
}
