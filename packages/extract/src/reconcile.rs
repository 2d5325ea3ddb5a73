//! Occupant reconciliation.
//!
//! A person can hold a provisional assignment while keeping a permanent
//! home position, and rosters list both entries as occupied. The person is
//! serving the provisional one, so the permanent position is released:
//! it becomes vacant and keeps the holder's name in parentheses as a
//! reference.

use std::collections::{BTreeMap, BTreeSet};

use roster_diff_roster_models::{OccupationStatus, PositionRecord, TenureType};

/// Reconciled records plus the codes of the released permanent positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub records: Vec<PositionRecord>,
    pub released: Vec<String>,
}

/// Person key: `national_id|occupant_name`. `None` for degenerate keys.
fn person_key(record: &PositionRecord) -> Option<(String, String)> {
    let national_id = record.national_id.as_deref().unwrap_or_default();
    let name = record.occupant_name.as_str();
    if national_id.is_empty() || name.is_empty() {
        return None;
    }
    Some((national_id.to_string(), name.to_string()))
}

/// Codes of permanent positions whose holder also occupies a provisional
/// one, grouped by person key.
fn released_codes(records: &[PositionRecord]) -> BTreeSet<String> {
    let mut groups: BTreeMap<(String, String), Vec<&PositionRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_occupied()) {
        if let Some(key) = person_key(record) {
            groups.entry(key).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter(|(_, members)| {
            members
                .iter()
                .any(|r| r.tenure_type == Some(TenureType::Provisional))
        })
        .flat_map(|((national_id, name), members)| {
            log::debug!("{name} ({national_id}) holds a provisional position");
            members
                .into_iter()
                .filter(|r| r.tenure_type == Some(TenureType::Permanent))
                .map(|r| r.code.clone())
        })
        .collect()
}

/// Releases permanent positions held by people who also occupy a
/// provisional position. Provisional records are left untouched, and so is
/// every record outside a duplicate group.
#[must_use]
pub fn reconcile(records: Vec<PositionRecord>) -> Reconciliation {
    let overrides = released_codes(&records);
    if overrides.is_empty() {
        return Reconciliation {
            records,
            released: Vec::new(),
        };
    }

    let mut released = Vec::with_capacity(overrides.len());
    let records = records
        .into_iter()
        .map(|record| {
            if record.is_occupied() && overrides.contains(&record.code) {
                released.push(record.code.clone());
                PositionRecord {
                    occupant_name: format!("({})", record.occupant_name),
                    occupation_status: OccupationStatus::Vacant,
                    ..record
                }
            } else {
                record
            }
        })
        .collect();

    log::info!("Released {} permanent positions", released.len());

    Reconciliation { records, released }
}
