#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Position records and snapshot types for staffing-roster documents.
//!
//! A roster document lists budgeted positions (each identified by a
//! numeric code) together with the person currently holding them. This
//! crate defines the record shape produced by the extraction engine and the
//! [`Snapshot`] that groups the records of one document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Occupant name used when no person line was found for a position.
pub const VACANT_OCCUPANT: &str = "VACANT";

/// Date label used for documents whose date could not be inferred.
pub const UNDATED_LABEL: &str = "UNDATED";

/// Whether budget is allocated to a position.
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
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FundingStatus {
    /// Budget is allocated.
    Funded,
    /// The position exists but has no budget allocated.
    Unfunded,
}

/// Whether a person is serving in a position.
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
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OccupationStatus {
    /// A person is serving in the position.
    Occupied,
    /// Nobody is serving in the position.
    Vacant,
}

/// How a person is assigned to a position.
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
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TenureType {
    /// Temporary assignment (`PROVISIONAL` in the source documents).
    Provisional,
    /// Home assignment (`DEFINITIVO` in the source documents).
    Permanent,
}

/// Province a position is attached to.
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
    AsRefStr,
)]
pub enum Province {
    #[strum(serialize = "ALMERÍA")]
    #[serde(rename = "ALMERÍA")]
    Almeria,
    #[strum(serialize = "CÁDIZ")]
    #[serde(rename = "CÁDIZ")]
    Cadiz,
    #[strum(serialize = "CÓRDOBA")]
    #[serde(rename = "CÓRDOBA")]
    Cordoba,
    #[strum(serialize = "GRANADA")]
    #[serde(rename = "GRANADA")]
    Granada,
    #[strum(serialize = "HUELVA")]
    #[serde(rename = "HUELVA")]
    Huelva,
    #[strum(serialize = "JAÉN")]
    #[serde(rename = "JAÉN")]
    Jaen,
    #[strum(serialize = "MÁLAGA")]
    #[serde(rename = "MÁLAGA")]
    Malaga,
    #[strum(serialize = "SEVILLA")]
    #[serde(rename = "SEVILLA")]
    Sevilla,
    #[strum(serialize = "MADRID")]
    #[serde(rename = "MADRID")]
    Madrid,
    /// Headquarters / central services (`SS.CC.`).
    #[strum(serialize = "SS.CC.")]
    #[serde(rename = "SS.CC.")]
    CentralServices,
    /// No province name was found near the position line.
    #[strum(serialize = "UNSPECIFIED")]
    #[serde(rename = "UNSPECIFIED")]
    Unspecified,
}

impl Province {
    /// Resolves a province name as it appears in a document.
    ///
    /// Matching is case-insensitive and folds accented vowels, so
    /// `"Almeria"`, `"ALMERÍA"` and `"almería"` all resolve to
    /// [`Self::Almeria`]. Both `"SS.CC."` (with or without dots) and
    /// `"SERVICIOS CENTRALES"` resolve to [`Self::CentralServices`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .flat_map(char::to_uppercase)
            .map(|c| match c {
                'Á' => 'A',
                'É' => 'E',
                'Í' => 'I',
                'Ó' => 'O',
                'Ú' => 'U',
                other => other,
            })
            .collect();

        match folded.as_str() {
            "ALMERIA" => Some(Self::Almeria),
            "CADIZ" => Some(Self::Cadiz),
            "CORDOBA" => Some(Self::Cordoba),
            "GRANADA" => Some(Self::Granada),
            "HUELVA" => Some(Self::Huelva),
            "JAEN" => Some(Self::Jaen),
            "MALAGA" => Some(Self::Malaga),
            "SEVILLA" => Some(Self::Sevilla),
            "MADRID" => Some(Self::Madrid),
            "SSCC" | "SERVICIOSCENTRALES" => Some(Self::CentralServices),
            _ => None,
        }
    }
}

/// One staffing position as recorded in one document.
///
/// `national_id` and `tenure_type` are only used to reconcile people who
/// hold a provisional and a permanent position at the same time; they are
/// not part of the serialized display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Position code (6 to 8 digits), unique within a snapshot.
    pub code: String,
    /// Free-text denomination of the position.
    pub title: Option<String>,
    /// Pay grade (e.g. `A1`, `A1-A2`, `IV`).
    pub grade: Option<String>,
    /// Corps / job-category classification.
    pub corps: Option<String>,
    /// Province the position belongs to.
    pub province: Province,
    /// Whether the position is funded.
    pub funding_status: FundingStatus,
    /// Holder's display name, [`VACANT_OCCUPANT`] when nobody was found.
    /// Positions released by reconciliation carry the name in parentheses.
    pub occupant_name: String,
    /// Whether a person is serving in the position.
    pub occupation_status: OccupationStatus,
    #[serde(default, skip_serializing)]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub tenure_type: Option<TenureType>,
}

impl PositionRecord {
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupation_status == OccupationStatus::Occupied
    }

    #[must_use]
    pub fn is_funded(&self) -> bool {
        self.funding_status == FundingStatus::Funded
    }
}

/// Aggregate counts over the records of one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Number of positions.
    pub total: usize,
    /// Positions with budget allocated.
    pub funded: usize,
    /// Positions without budget.
    pub unfunded: usize,
    /// Positions with a person serving in them.
    pub occupied: usize,
    /// Positions nobody is serving in.
    pub vacant: usize,
}

impl SnapshotSummary {
    /// Computes the summary counts for a set of records.
    #[must_use]
    pub fn from_records(records: &[PositionRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            if record.is_funded() {
                summary.funded += 1;
            } else {
                summary.unfunded += 1;
            }
            if record.is_occupied() {
                summary.occupied += 1;
            } else {
                summary.vacant += 1;
            }
        }

        summary
    }
}

/// The positions extracted from one document at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Display name of the source document.
    pub source_name: String,
    /// Date printed in the document, `None` when it could not be inferred.
    /// Undated snapshots sort before every dated one.
    pub date: Option<NaiveDate>,
    /// Date as printed in the document, or [`UNDATED_LABEL`].
    pub date_label: String,
    /// Position records in document order, unique by code.
    pub records: Vec<PositionRecord>,
    /// Counts over `records`.
    pub summary: SnapshotSummary,
}

impl Snapshot {
    /// Creates a snapshot and computes its summary counts.
    #[must_use]
    pub fn new(
        source_name: impl Into<String>,
        date: Option<NaiveDate>,
        date_label: impl Into<String>,
        records: Vec<PositionRecord>,
    ) -> Self {
        let summary = SnapshotSummary::from_records(&records);
        Self {
            source_name: source_name.into(),
            date,
            date_label: date_label.into(),
            records,
            summary,
        }
    }

    /// Looks up a record by position code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&PositionRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, funding: FundingStatus, status: OccupationStatus) -> PositionRecord {
        PositionRecord {
            code: code.to_string(),
            title: None,
            grade: None,
            corps: None,
            province: Province::Unspecified,
            funding_status: funding,
            occupant_name: VACANT_OCCUPANT.to_string(),
            occupation_status: status,
            national_id: None,
            tenure_type: None,
        }
    }

    #[test]
    fn province_from_name_folds_accents_and_case() {
        assert_eq!(Province::from_name("ALMERÍA"), Some(Province::Almeria));
        assert_eq!(Province::from_name("almeria"), Some(Province::Almeria));
        assert_eq!(Province::from_name("Jaén"), Some(Province::Jaen));
        assert_eq!(Province::from_name("cÓrdoba"), Some(Province::Cordoba));
    }

    #[test]
    fn province_from_name_resolves_central_services_variants() {
        assert_eq!(Province::from_name("SS.CC."), Some(Province::CentralServices));
        assert_eq!(Province::from_name("SSCC"), Some(Province::CentralServices));
        assert_eq!(
            Province::from_name("Servicios Centrales"),
            Some(Province::CentralServices)
        );
        assert_eq!(Province::from_name("TOLEDO"), None);
    }

    #[test]
    fn province_display_uses_document_spelling() {
        assert_eq!(Province::Malaga.to_string(), "MÁLAGA");
        assert_eq!(Province::CentralServices.to_string(), "SS.CC.");
        assert_eq!(Province::Unspecified.to_string(), "UNSPECIFIED");
    }

    #[test]
    fn status_enums_parse_case_insensitively() {
        assert_eq!("funded".parse::<FundingStatus>(), Ok(FundingStatus::Funded));
        assert_eq!(
            "UNFUNDED".parse::<FundingStatus>(),
            Ok(FundingStatus::Unfunded)
        );
        assert_eq!(
            "vacant".parse::<OccupationStatus>(),
            Ok(OccupationStatus::Vacant)
        );
    }

    #[test]
    fn summary_counts_funding_and_occupation() {
        let snapshot = Snapshot::new(
            "rpt.pdf",
            None,
            UNDATED_LABEL,
            vec![
                record("111111", FundingStatus::Funded, OccupationStatus::Occupied),
                record("222222", FundingStatus::Unfunded, OccupationStatus::Vacant),
                record("333333", FundingStatus::Funded, OccupationStatus::Vacant),
            ],
        );

        assert_eq!(
            snapshot.summary,
            SnapshotSummary {
                total: 3,
                funded: 2,
                unfunded: 1,
                occupied: 1,
                vacant: 2,
            }
        );
        assert_eq!(snapshot.get("222222").map(|r| r.is_funded()), Some(false));
        assert!(snapshot.get("999999").is_none());
    }
}
