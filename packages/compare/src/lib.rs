#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Version diff between roster snapshots.
//!
//! Two snapshots are joined on position code (full outer join) and every
//! code is classified into exactly one [`Situation`]. A list of
//! chronologically ordered snapshots is compared pairwise, each snapshot
//! against the next.

use std::collections::BTreeMap;

use roster_diff_compare_models::{
    Comparison, ComparisonFilter, ComparisonRow, ComparisonSummary, OverallSummary, Situation,
};
use roster_diff_roster_models::{PositionRecord, Snapshot};

/// Classifies a code present in both snapshots.
///
/// Funding changes count only when both sides carry a status; the
/// occupant is compared as a plain string, so a released position
/// (`(NAME)`) differs from the same name held outright.
fn classify_pair(old: &PositionRecord, new: &PositionRecord) -> Situation {
    let funding_changed = old.funding_status != new.funding_status;
    let occupant_changed = old.occupant_name != new.occupant_name;

    match (occupant_changed, funding_changed) {
        (true, true) => Situation::OccupantAndFundingChanged,
        (false, true) => Situation::FundingChanged,
        (true, false) => Situation::OccupantChanged,
        (false, false) => Situation::Unchanged,
    }
}

fn build_row(old: Option<&PositionRecord>, new: Option<&PositionRecord>) -> Option<ComparisonRow> {
    let situation = match (old, new) {
        (Some(old), Some(new)) => classify_pair(old, new),
        (Some(_), None) => Situation::Removed,
        (None, Some(_)) => Situation::New,
        (None, None) => return None,
    };
    let current = new.or(old)?;
    let merged = |field: fn(&PositionRecord) -> Option<&String>| {
        new.and_then(field).or_else(|| old.and_then(field)).cloned()
    };

    Some(ComparisonRow {
        code: current.code.clone(),
        situation,
        title: merged(|r| r.title.as_ref()),
        grade: merged(|r| r.grade.as_ref()),
        corps: merged(|r| r.corps.as_ref()),
        province: current.province,
        old_occupant: old.map(|r| r.occupant_name.clone()),
        new_occupant: new.map(|r| r.occupant_name.clone()),
        old_funding: old.map(|r| r.funding_status),
        new_funding: new.map(|r| r.funding_status),
        funding_status: current.funding_status,
        occupation_status: current.occupation_status,
    })
}

/// Outer-joins `old` and `new` on code. Exactly one row per code present
/// in either snapshot, ordered by code.
#[must_use]
pub fn compare(old: &Snapshot, new: &Snapshot) -> Vec<ComparisonRow> {
    let mut joined: BTreeMap<&str, (Option<&PositionRecord>, Option<&PositionRecord>)> =
        BTreeMap::new();
    for record in &old.records {
        joined.entry(record.code.as_str()).or_default().0 = Some(record);
    }
    for record in &new.records {
        joined.entry(record.code.as_str()).or_default().1 = Some(record);
    }

    joined
        .into_values()
        .filter_map(|(old, new)| build_row(old, new))
        .collect()
}

/// Compares two snapshots and summarizes the result.
#[must_use]
pub fn compare_snapshots(old: &Snapshot, new: &Snapshot) -> Comparison {
    let rows = compare(old, new);
    let summary = ComparisonSummary::from_rows(&rows);

    log::info!(
        "{} -> {}: {} new, {} removed, {} occupant, {} funding, {} both",
        old.source_name,
        new.source_name,
        summary.new,
        summary.removed,
        summary.occupant_changed,
        summary.funding_changed,
        summary.occupant_and_funding_changed,
    );

    Comparison {
        old_name: old.source_name.clone(),
        old_date_label: old.date_label.clone(),
        new_name: new.source_name.clone(),
        new_date_label: new.date_label.clone(),
        rows,
        summary,
    }
}

/// Compares each snapshot with the next. Empty when fewer than two
/// snapshots are given.
#[must_use]
pub fn compare_adjacent(snapshots: &[Snapshot]) -> Vec<Comparison> {
    snapshots
        .windows(2)
        .map(|pair| compare_snapshots(&pair[0], &pair[1]))
        .collect()
}

/// Applies `filter` to a comparison, recomputing the summary over the
/// remaining rows.
#[must_use]
pub fn filter_comparison(comparison: &Comparison, filter: &ComparisonFilter) -> Comparison {
    let rows: Vec<ComparisonRow> = comparison
        .rows
        .iter()
        .filter(|row| filter.matches_row(row))
        .cloned()
        .collect();
    let summary = ComparisonSummary::from_rows(&rows);

    Comparison {
        rows,
        summary,
        ..comparison.clone()
    }
}

/// Records of a snapshot that pass `filter`.
#[must_use]
pub fn filter_records<'a>(
    snapshot: &'a Snapshot,
    filter: &ComparisonFilter,
) -> Vec<&'a PositionRecord> {
    snapshot
        .records
        .iter()
        .filter(|record| filter.matches_record(record))
        .collect()
}

/// Position totals of the first and last snapshot.
#[must_use]
pub fn overall_summary(snapshots: &[Snapshot]) -> OverallSummary {
    let initial_total = snapshots.first().map_or(0, Snapshot::len);
    let final_total = snapshots.last().map_or(0, Snapshot::len);

    OverallSummary {
        initial_total,
        final_total,
        delta: i64::try_from(final_total).unwrap_or(i64::MAX)
            - i64::try_from(initial_total).unwrap_or(i64::MAX),
        versions: snapshots.len(),
    }
}
