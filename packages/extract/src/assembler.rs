//! Record assembly: one pass over a document's lines, producing one
//! [`PositionRecord`] per position line.
//!
//! For every position line the assembler looks ahead a bounded number of
//! lines for the occupant. The lookahead stops at the first person line
//! (the occupant) or at the next position line (the position is vacant).
//! Every line visited during the lookahead also serves as context for the
//! province extractor.

use std::collections::BTreeSet;

use roster_diff_roster_models::{OccupationStatus, PositionRecord, VACANT_OCCUPANT};

use crate::ExtractionConfig;
use crate::classifier::{LineKind, classify};
use crate::fields::{
    OccupantFields, extract_code, extract_corps, extract_funding_status, extract_grade,
    extract_occupant, extract_province, extract_title,
};

/// Counters collected while assembling one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Lines scanned.
    pub lines: usize,
    /// Lines classified as position lines.
    pub position_lines: usize,
    /// Position lines dropped because no code could be read.
    pub positions_without_code: usize,
    /// Records dropped because an earlier record had the same code.
    pub duplicates_removed: usize,
}

/// Records assembled from one document, unique by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub records: Vec<PositionRecord>,
    pub stats: AssemblyStats,
}

/// Assembles position records from a document's ordered lines.
///
/// Duplicate codes (page-break artifacts repeat a position line) are
/// collapsed, keeping the first occurrence. An empty result means no
/// position could be recognised in the document.
#[must_use]
pub fn assemble<S: AsRef<str>>(lines: &[S], config: &ExtractionConfig) -> Assembly {
    let mut stats = AssemblyStats {
        lines: lines.len(),
        ..AssemblyStats::default()
    };
    let mut records = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if classify(line) != LineKind::Position {
            continue;
        }
        stats.position_lines += 1;

        let Some(code) = extract_code(line) else {
            stats.positions_without_code += 1;
            continue;
        };

        let mut context: Vec<&str> = Vec::with_capacity(config.lookahead_lines);
        let mut occupant = OccupantFields::default();

        for next in lines.iter().skip(i + 1).take(config.lookahead_lines) {
            let next = next.as_ref();
            context.push(next);
            match classify(next) {
                LineKind::Person => {
                    occupant = extract_occupant(next);
                    break;
                }
                LineKind::Position => break,
                LineKind::Other => {}
            }
        }

        records.push(build_record(code, line, &context, occupant));
    }

    let records = dedup_by_code(records, &mut stats);

    log::debug!(
        "Assembled {} records from {} lines ({} position lines, {} without code, {} duplicates)",
        records.len(),
        stats.lines,
        stats.position_lines,
        stats.positions_without_code,
        stats.duplicates_removed,
    );

    Assembly { records, stats }
}

fn build_record(
    code: String,
    line: &str,
    context: &[&str],
    occupant: OccupantFields,
) -> PositionRecord {
    let occupation_status = if occupant.name.is_some() {
        OccupationStatus::Occupied
    } else {
        OccupationStatus::Vacant
    };

    PositionRecord {
        code,
        title: extract_title(line),
        grade: extract_grade(line),
        corps: extract_corps(line),
        province: extract_province(line, context),
        funding_status: extract_funding_status(line),
        occupant_name: occupant
            .name
            .unwrap_or_else(|| VACANT_OCCUPANT.to_string()),
        occupation_status,
        national_id: occupant.national_id,
        tenure_type: occupant.tenure_type,
    }
}

fn dedup_by_code(records: Vec<PositionRecord>, stats: &mut AssemblyStats) -> Vec<PositionRecord> {
    let before = records.len();
    let mut seen = BTreeSet::new();
    let unique: Vec<PositionRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.code.clone()))
        .collect();
    stats.duplicates_removed = before - unique.len();
    unique
}
