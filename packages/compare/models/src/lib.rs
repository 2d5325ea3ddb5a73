#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types describing the difference between two roster snapshots.

use std::collections::BTreeSet;

use roster_diff_roster_models::{FundingStatus, OccupationStatus, PositionRecord, Province};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Placeholder shown for a value the other snapshot does not have.
pub const ABSENT: &str = "-";

/// How a position changed between two snapshots.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Situation {
    /// Only in the newer snapshot.
    New,
    /// Only in the older snapshot.
    Removed,
    OccupantChanged,
    FundingChanged,
    OccupantAndFundingChanged,
    Unchanged,
}

/// One position code across two adjacent snapshots.
///
/// Descriptive columns prefer the newer snapshot and fall back to the older
/// one for removed positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub code: String,
    pub situation: Situation,
    pub title: Option<String>,
    pub grade: Option<String>,
    pub corps: Option<String>,
    pub province: Province,
    pub old_occupant: Option<String>,
    pub new_occupant: Option<String>,
    pub old_funding: Option<FundingStatus>,
    pub new_funding: Option<FundingStatus>,
    pub funding_status: FundingStatus,
    pub occupation_status: OccupationStatus,
}

impl ComparisonRow {
    #[must_use]
    pub fn old_occupant_display(&self) -> &str {
        self.old_occupant.as_deref().unwrap_or(ABSENT)
    }

    #[must_use]
    pub fn new_occupant_display(&self) -> &str {
        self.new_occupant.as_deref().unwrap_or(ABSENT)
    }

    #[must_use]
    pub fn old_funding_display(&self) -> &str {
        self.old_funding.as_ref().map_or(ABSENT, AsRef::as_ref)
    }

    #[must_use]
    pub fn new_funding_display(&self) -> &str {
        self.new_funding.as_ref().map_or(ABSENT, AsRef::as_ref)
    }
}

/// Number of rows per [`Situation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub new: usize,
    pub removed: usize,
    pub occupant_changed: usize,
    pub funding_changed: usize,
    pub occupant_and_funding_changed: usize,
    pub unchanged: usize,
}

impl ComparisonSummary {
    #[must_use]
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ComparisonRow>) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total += 1;
            match row.situation {
                Situation::New => summary.new += 1,
                Situation::Removed => summary.removed += 1,
                Situation::OccupantChanged => summary.occupant_changed += 1,
                Situation::FundingChanged => summary.funding_changed += 1,
                Situation::OccupantAndFundingChanged => summary.occupant_and_funding_changed += 1,
                Situation::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }

    #[must_use]
    pub const fn count(&self, situation: Situation) -> usize {
        match situation {
            Situation::New => self.new,
            Situation::Removed => self.removed,
            Situation::OccupantChanged => self.occupant_changed,
            Situation::FundingChanged => self.funding_changed,
            Situation::OccupantAndFundingChanged => self.occupant_and_funding_changed,
            Situation::Unchanged => self.unchanged,
        }
    }
}

/// Rows of one adjacent pair, with the names and dates of both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub old_name: String,
    pub old_date_label: String,
    pub new_name: String,
    pub new_date_label: String,
    pub rows: Vec<ComparisonRow>,
    pub summary: ComparisonSummary,
}

/// Totals across the whole ordered snapshot list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallSummary {
    /// Positions in the earliest snapshot.
    pub initial_total: usize,
    /// Positions in the latest snapshot.
    pub final_total: usize,
    /// `final_total - initial_total`.
    pub delta: i64,
    pub versions: usize,
}

/// Selection criteria for rows and records. An empty set does not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonFilter {
    pub provinces: BTreeSet<Province>,
    pub grades: BTreeSet<String>,
    pub funding: BTreeSet<FundingStatus>,
    pub status: BTreeSet<OccupationStatus>,
    pub situations: BTreeSet<Situation>,
}

fn accepts<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

fn accepts_grade(set: &BTreeSet<String>, grade: Option<&String>) -> bool {
    set.is_empty() || grade.is_some_and(|g| set.contains(g))
}

impl ComparisonFilter {
    /// Whether any criterion is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !(self.provinces.is_empty()
            && self.grades.is_empty()
            && self.funding.is_empty()
            && self.status.is_empty()
            && self.situations.is_empty())
    }

    /// Tests a comparison row against every criterion.
    #[must_use]
    pub fn matches_row(&self, row: &ComparisonRow) -> bool {
        accepts(&self.provinces, &row.province)
            && accepts_grade(&self.grades, row.grade.as_ref())
            && accepts(&self.funding, &row.funding_status)
            && accepts(&self.status, &row.occupation_status)
            && accepts(&self.situations, &row.situation)
    }

    /// Tests a snapshot record. The situation criterion does not apply to
    /// records.
    #[must_use]
    pub fn matches_record(&self, record: &PositionRecord) -> bool {
        accepts(&self.provinces, &record.province)
            && accepts_grade(&self.grades, record.grade.as_ref())
            && accepts(&self.funding, &record.funding_status)
            && accepts(&self.status, &record.occupation_status)
    }
}
