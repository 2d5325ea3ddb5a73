#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Position-record extraction from flattened roster text.
//!
//! The input is the ordered line sequence of one document as recovered by
//! a PDF text extractor; there is no column information. Records are found
//! by pattern matching:
//!
//! 1. [`classifier`] decides whether a line opens a position or a person.
//! 2. [`fields`] pulls individual values out of a line, each through an
//!    ordered chain of [`rules`].
//! 3. [`assembler`] walks the lines and builds one record per position,
//!    attaching the occupant found in a short lookahead window.
//! 4. [`reconcile`] releases permanent positions whose holder is serving a
//!    provisional assignment elsewhere.
//!
//! [`extract_records`] runs the whole pipeline for one document.

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod fields;
pub mod reconcile;
pub mod rules;

pub use config::{ConfigError, ExtractionConfig};

use roster_diff_roster_models::PositionRecord;

/// Counters for one document's extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub lines: usize,
    pub position_lines: usize,
    pub positions_without_code: usize,
    pub duplicates_removed: usize,
    pub positions_released: usize,
}

/// Final records of one document, unique by code and reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<PositionRecord>,
    pub stats: ExtractionStats,
}

/// Assembles and reconciles the records of one document.
///
/// Pure function of `lines`: the same input always yields the same
/// records. An empty `records` vector means nothing in the document looked
/// like a position; callers treat that as a failed document.
#[must_use]
pub fn extract_records<S: AsRef<str>>(lines: &[S], config: &ExtractionConfig) -> Extraction {
    let assembly = assembler::assemble(lines, config);
    let reconciliation = reconcile::reconcile(assembly.records);

    Extraction {
        stats: ExtractionStats {
            lines: assembly.stats.lines,
            position_lines: assembly.stats.position_lines,
            positions_without_code: assembly.stats.positions_without_code,
            duplicates_removed: assembly.stats.duplicates_removed,
            positions_released: reconciliation.released.len(),
        },
        records: reconciliation.records,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use roster_diff_roster_models::{OccupationStatus, TenureType};

    use super::*;

    const LINES: &[&str] = &[
        "RELACIÓN DE PUESTOS DE TRABAJO",
        "Fecha: 15/03/2024",
        "111111JEFE DE SERVICIO.... A1 P-A1 28 1 SEVILLA",
        "CENTRO DIRECTIVO",
        "12345678A1X123456PEREZ GARCIA, JUAN A2 PROVISIONAL",
        "222222JEFE DE SECCION.... A2 P-A2 26 1 SEVILLA",
        "12345678A1X123456PEREZ GARCIA, JUAN A2 DEFINITIVO",
        "333333ORDENANZA...... 1 0 CÁDIZ",
        "111111JEFE DE SERVICIO.... A1 P-A1 28 1 SEVILLA",
    ];

    #[test]
    fn full_pipeline_releases_permanent_position() {
        let extraction = extract_records(LINES, &ExtractionConfig::default());

        let codes: Vec<&str> = extraction.records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["111111", "222222", "333333"]);

        let provisional = &extraction.records[0];
        assert_eq!(provisional.occupant_name, "PEREZ GARCIA, JUAN");
        assert_eq!(provisional.occupation_status, OccupationStatus::Occupied);
        assert_eq!(provisional.tenure_type, Some(TenureType::Provisional));

        let permanent = &extraction.records[1];
        assert_eq!(permanent.occupant_name, "(PEREZ GARCIA, JUAN)");
        assert_eq!(permanent.occupation_status, OccupationStatus::Vacant);

        assert_eq!(extraction.stats.duplicates_removed, 1);
        assert_eq!(extraction.stats.positions_released, 1);
        assert_eq!(extraction.stats.lines, LINES.len());
    }

    #[test]
    fn codes_are_unique() {
        let extraction = extract_records(LINES, &ExtractionConfig::default());
        let unique: BTreeSet<&str> = extraction.records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(unique.len(), extraction.records.len());
    }

    #[test]
    fn extraction_is_idempotent() {
        let config = ExtractionConfig::default();
        assert_eq!(extract_records(LINES, &config), extract_records(LINES, &config));
    }

    #[test]
    fn empty_input_yields_no_records() {
        let lines: [&str; 0] = [];
        assert!(extract_records(&lines, &ExtractionConfig::default()).records.is_empty());
    }
}
