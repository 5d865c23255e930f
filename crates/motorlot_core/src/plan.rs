use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::change::MigrationUnit;
use crate::{MotorlotError, MotorlotResult, Timestamp, Version};

/// A unit recorded as durably applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub version: Version,
    pub description: String,
    pub applied_at: Timestamp,
}

/// Registered unit with its application instant, if applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub version: Version,
    pub description: String,
    pub applied_at: Option<Timestamp>,
}

/// Rejects duplicate versions and malformed units. Runs before any storage access.
pub fn validate_units(units: &[MigrationUnit]) -> MotorlotResult<()> {
    let mut seen = HashSet::new();
    for unit in units {
        if !seen.insert(unit.version.as_str()) {
            return Err(MotorlotError::duplicate_version(unit.version.as_str()));
        }
        unit.validate()?;
    }
    Ok(())
}

/// Every ledger entry must name a registered unit.
pub fn check_ledger_known(ledger: &[LedgerEntry], units: &[MigrationUnit]) -> MotorlotResult<()> {
    let known: HashSet<&Version> = units.iter().map(|unit| &unit.version).collect();
    match ledger.iter().find(|entry| !known.contains(&entry.version)) {
        Some(entry) => Err(MotorlotError::unknown_version(entry.version.as_str())),
        None => Ok(()),
    }
}

/// Units without a ledger entry, ascending by version.
pub fn pending<'a>(
    ledger: &[LedgerEntry],
    units: &'a [MigrationUnit],
) -> MotorlotResult<Vec<&'a MigrationUnit>> {
    validate_units(units)?;
    check_ledger_known(ledger, units)?;
    let applied: HashSet<&Version> = ledger.iter().map(|entry| &entry.version).collect();
    let mut pending: Vec<&MigrationUnit> = units
        .iter()
        .filter(|unit| !applied.contains(&unit.version))
        .collect();
    pending.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(pending)
}

/// Pending units bounded above by `to` (inclusive). `to` must name a registered unit.
pub fn pending_until<'a>(
    ledger: &[LedgerEntry],
    units: &'a [MigrationUnit],
    to: Option<&Version>,
) -> MotorlotResult<Vec<&'a MigrationUnit>> {
    let pending = pending(ledger, units)?;
    let Some(to) = to else {
        return Ok(pending);
    };
    if !units.iter().any(|unit| &unit.version == to) {
        return Err(MotorlotError::invalid(format!(
            "target version '{to}' is not a registered migration"
        )));
    }
    Ok(pending
        .into_iter()
        .filter(|unit| &unit.version <= to)
        .collect())
}

/// The `steps` most recently applied entries, newest first. Ties on the applied instant
/// fall back to version order.
pub fn rollback_order(ledger: &[LedgerEntry], steps: usize) -> Vec<&LedgerEntry> {
    let mut entries: Vec<&LedgerEntry> = ledger.iter().collect();
    entries.sort_by(|a, b| {
        b.applied_at
            .cmp(&a.applied_at)
            .then_with(|| b.version.cmp(&a.version))
    });
    entries.truncate(steps);
    entries
}

pub fn status(ledger: &[LedgerEntry], units: &[MigrationUnit]) -> Vec<UnitStatus> {
    let applied: BTreeMap<&Version, Timestamp> = ledger
        .iter()
        .map(|entry| (&entry.version, entry.applied_at))
        .collect();
    let mut rows: Vec<UnitStatus> = units
        .iter()
        .map(|unit| UnitStatus {
            version: unit.version.clone(),
            description: unit.description.clone(),
            applied_at: applied.get(&unit.version).copied(),
        })
        .collect();
    rows.sort_by(|a, b| a.version.cmp(&b.version));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, TableSpec};

    fn units() -> Vec<MigrationUnit> {
        vec![
            MigrationUnit::add_column(
                "2020-03",
                "add category to cars",
                "Cars",
                ColumnSpec::integer("categoryId"),
            ),
            MigrationUnit::create_table("2019-01", "create cars", TableSpec::entity("Cars")),
        ]
    }

    fn entry(version: &str, applied_at: i64) -> LedgerEntry {
        LedgerEntry {
            version: Version::new(version),
            description: String::new(),
            applied_at: Timestamp::from_micros(applied_at),
        }
    }

    #[test]
    fn pending_is_sorted_ascending() {
        let units = units();
        let pending = pending(&[], &units).unwrap();
        let versions: Vec<&str> = pending.iter().map(|unit| unit.version.as_str()).collect();
        assert_eq!(versions, vec!["2019-01", "2020-03"]);
    }

    #[test]
    fn pending_skips_applied_units() {
        let units = units();
        let pending = pending(&[entry("2019-01", 10)], &units).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].version.as_str(), "2020-03");
    }

    #[test]
    fn duplicate_versions_are_rejected() {
        let mut units = units();
        units.push(MigrationUnit::rename_column(
            "2020-03",
            "fix typo",
            "Users",
            "subDistictId",
            "subdistrictId",
        ));
        let err = pending(&[], &units).unwrap_err();
        assert!(matches!(err, MotorlotError::DuplicateVersion { ref version } if version == "2020-03"));
    }

    #[test]
    fn unknown_ledger_entries_are_reported() {
        let err = pending(&[entry("2018-12", 1)], &units()).unwrap_err();
        assert!(matches!(err, MotorlotError::UnknownVersion { .. }));
    }

    #[test]
    fn pending_until_bounds_inclusive() {
        let units = units();
        let bounded = pending_until(&[], &units, Some(&Version::new("2019-01"))).unwrap();
        assert_eq!(bounded.len(), 1);
        assert!(pending_until(&[], &units, Some(&Version::new("2099-01"))).is_err());
    }

    #[test]
    fn rollback_follows_application_order() {
        // 2019-01 applied after 2020-03 (out-of-order apply), so it is rolled back first.
        let ledger = vec![entry("2020-03", 10), entry("2019-01", 20), entry("2021-01", 20)];
        let order: Vec<&str> = rollback_order(&ledger, 3)
            .iter()
            .map(|entry| entry.version.as_str())
            .collect();
        assert_eq!(order, vec!["2021-01", "2019-01", "2020-03"]);
        assert_eq!(rollback_order(&ledger, 1).len(), 1);
    }

    #[test]
    fn status_lists_every_unit() {
        let units = units();
        let rows = status(&[entry("2019-01", 42)], &units);
        assert_eq!(rows[0].applied_at, Some(Timestamp::from_micros(42)));
        assert_eq!(rows[1].applied_at, None);
    }
}
