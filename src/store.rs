//! In-memory employee list owned by the caller.
//!
//! Records are identified by their employee number, compared as text. The
//! filtered view is recomputed by [`EmployeeStore::apply_filter`] and reset by any
//! mutation.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::field::{Field, ACTIVE_STATUS};
use crate::record::{Record, RecordCollection};
use crate::storage::{KeyValueStore, Snapshot};
use crate::{IngestError, IngestResult};

/// Lowest employee number handed out is one above this.
pub const EMPLOYEE_ID_FLOOR: u64 = 60000;

/// Filter criteria. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Case-insensitive substring of the Arabic name, English name, or employee number.
    pub search: String,
    pub nationality: Option<String>,
    pub contract_status: Option<String>,
    pub job_title: Option<String>,
    pub work_schedule: Option<String>,
}

impl Filter {
    pub fn matches(&self, rec: &Record) -> bool {
        let exact = |want: &Option<String>, field: Field| {
            want.as_deref()
                .filter(|w| !w.is_empty())
                .map_or(true, |w| rec.field(field) == Some(w))
        };
        if !(exact(&self.nationality, Field::Nationality)
            && exact(&self.contract_status, Field::ContractStatus)
            && exact(&self.job_title, Field::JobTitle)
            && exact(&self.work_schedule, Field::WorkSchedule))
        {
            return false;
        }

        let term = self.search.to_lowercase();
        rec.field_or_empty(Field::ArabicName).to_lowercase().contains(&term)
            || rec.field_or_empty(Field::EnglishName).to_lowercase().contains(&term)
            || rec.field_or_empty(Field::EmployeeNumber).contains(&term)
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Rounded mean of the current salary; non-numeric salaries count as 0.
    pub average_salary: i64,
}

#[derive(Debug, Default)]
pub struct EmployeeStore {
    employees: RecordCollection,
    filtered: Option<Vec<usize>>,
}

impl EmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(employees: RecordCollection) -> Self {
        Self {
            employees,
            filtered: None,
        }
    }

    pub fn employees(&self) -> &[Record] {
        &self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.employees.iter().find(|e| e.employee_id() == Some(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Adds a new employee after required-field and uniqueness checks.
    pub fn add(&mut self, record: Record) -> IngestResult<()> {
        check_required(&record)?;
        let id = record.field_or_empty(Field::EmployeeNumber);
        if self.contains(id) {
            return Err(IngestError::DuplicateEmployee(id.to_string()));
        }
        debug!(id, "adding employee");
        self.employees.push(record);
        self.filtered = None;
        Ok(())
    }

    /// Replaces the employee with the same number. `Ok(false)` when none exists.
    pub fn update(&mut self, record: Record) -> IngestResult<bool> {
        check_required(&record)?;
        let id = record.employee_id();
        let Some(slot) = self.employees.iter_mut().find(|e| e.employee_id() == id) else {
            return Ok(false);
        };
        *slot = record;
        self.filtered = None;
        Ok(true)
    }

    /// Drops every employee with this number; returns how many were removed.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.employees.len();
        self.employees.retain(|e| e.employee_id() != Some(id));
        self.filtered = None;
        before - self.employees.len()
    }

    /// Swaps in a whole imported collection.
    pub fn replace_all(&mut self, employees: RecordCollection) {
        info!(rows = employees.len(), "replacing employee list");
        self.employees = employees;
        self.filtered = None;
    }

    pub fn clear(&mut self) {
        self.employees.clear();
        self.filtered = None;
    }

    /// One above the highest numeric employee number, never below the floor.
    ///
    /// Numbers that cannot be incremented (`u64::MAX`) are ignored.
    pub fn next_employee_id(&self) -> String {
        self.employees
            .iter()
            .filter_map(|e| e.employee_id()?.trim().parse::<u64>().ok()?.checked_add(1))
            .fold(EMPLOYEE_ID_FLOOR + 1, u64::max)
            .to_string()
    }

    /// Recomputes the filtered view.
    pub fn apply_filter(&mut self, filter: &Filter) -> usize {
        let hits: Vec<usize> = self
            .employees
            .iter()
            .enumerate()
            .filter(|(_, e)| filter.matches(e))
            .map(|(idx, _)| idx)
            .collect();
        let count = hits.len();
        self.filtered = Some(hits);
        count
    }

    /// Current filtered view; every employee when no filter has been applied
    /// since the last change.
    pub fn filtered(&self) -> Vec<&Record> {
        match &self.filtered {
            Some(hits) => hits.iter().filter_map(|&i| self.employees.get(i)).collect(),
            None => self.employees.iter().collect(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        let total = self.employees.len();
        let active = self
            .employees
            .iter()
            .filter(|e| e.field(Field::ContractStatus) == Some(ACTIVE_STATUS))
            .count();
        let average_salary = if total == 0 {
            0
        } else {
            let sum: f64 = self
                .employees
                .iter()
                .map(|e| e.field_or_empty(Field::CurrentSalary).trim().parse::<f64>().unwrap_or(0.0))
                .filter(|s| s.is_finite())
                .sum();
            (sum / total as f64).round() as i64
        };
        Statistics {
            total,
            active,
            inactive: total - active,
            average_salary,
        }
    }

    /// Sorted distinct non-empty values of a column.
    pub fn distinct_values(&self, field: Field) -> Vec<String> {
        self.employees
            .iter()
            .filter_map(|e| e.field(field))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Persists the list with a fresh `lastUpdate` timestamp.
    pub async fn save_to<S: KeyValueStore>(&self, kv: &S, key: &str) -> IngestResult<()> {
        let blob = serde_json::to_string(&Snapshot::now(self.employees.clone()))?;
        kv.set(key, blob).await?;
        debug!(key, rows = self.employees.len(), "saved employee snapshot");
        Ok(())
    }

    /// Restores the list. A missing or unreadable snapshot leaves the store empty.
    pub async fn load_from<S: KeyValueStore>(&mut self, kv: &S, key: &str) -> IngestResult<()> {
        let employees = match kv.get(key).await? {
            None => Vec::new(),
            Some(blob) => match serde_json::from_str::<Snapshot>(&blob) {
                Ok(snap) => snap.employees,
                Err(err) => {
                    warn!(key, error = %err, "discarding unreadable employee snapshot");
                    Vec::new()
                }
            },
        };
        info!(key, rows = employees.len(), "restored employee snapshot");
        self.employees = employees;
        self.filtered = None;
        Ok(())
    }

    /// Empties the store and deletes the persisted snapshot.
    pub async fn clear_from<S: KeyValueStore>(&mut self, kv: &S, key: &str) -> IngestResult<()> {
        self.clear();
        kv.remove(key).await
    }
}

fn check_required(record: &Record) -> IngestResult<()> {
    let missing = record.missing_required();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingFields(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn employee(id: &str, name: &str, status: &str, salary: &str) -> Record {
        let mut rec = Record::new();
        for f in Field::REQUIRED {
            rec.set(*f, "x");
        }
        rec.set(Field::EmployeeNumber, id);
        rec.set(Field::EnglishName, name);
        rec.set(Field::ContractStatus, status);
        rec.set(Field::CurrentSalary, salary);
        rec
    }

    #[test]
    fn add_rejects_duplicates_and_missing_fields() {
        let mut store = EmployeeStore::new();
        store.add(employee("60001", "A", ACTIVE_STATUS, "800")).unwrap();

        let err = store.add(employee("60001", "B", ACTIVE_STATUS, "1")).unwrap_err();
        assert!(matches!(err, IngestError::DuplicateEmployee(id) if id == "60001"));

        let mut partial = Record::new();
        partial.set(Field::EmployeeNumber, "60002");
        assert!(matches!(store.add(partial), Err(IngestError::MissingFields(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_and_remove_by_id() {
        let mut store = EmployeeStore::new();
        store.add(employee("60001", "A", ACTIVE_STATUS, "800")).unwrap();

        assert!(store.update(employee("60001", "Renamed", "منتهى", "900")).unwrap());
        assert_eq!(store.get("60001").unwrap().field(Field::EnglishName), Some("Renamed"));
        assert!(!store.update(employee("70000", "Ghost", "x", "1")).unwrap());

        assert_eq!(store.remove("60001"), 1);
        assert_eq!(store.remove("60001"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn next_id_uses_floor_and_max() {
        let mut store = EmployeeStore::new();
        assert_eq!(store.next_employee_id(), "60001");
        store.replace_all(vec![
            employee("60010", "a", "", "0"),
            employee("abc", "b", "", "0"),
            employee("61000", "c", "", "0"),
        ]);
        assert_eq!(store.next_employee_id(), "61001");
    }

    #[test]
    fn next_id_skips_numbers_at_the_top_of_the_range() {
        let store = EmployeeStore::from_records(vec![
            employee(&u64::MAX.to_string(), "a", "", "0"),
            employee("60005", "b", "", "0"),
            employee("99999999999999999999999", "c", "", "0"),
        ]);
        assert_eq!(store.next_employee_id(), "60006");
    }

    #[test]
    fn filter_by_fields_and_search_term() {
        let mut store = EmployeeStore::new();
        let mut a = employee("60001", "Hassan Falah", ACTIVE_STATUS, "800");
        a.set(Field::Nationality, "كويتي");
        let mut b = employee("60002", "Sara", ACTIVE_STATUS, "700");
        b.set(Field::Nationality, "مصري");
        store.replace_all(vec![a, b]);

        let filter = Filter {
            search: "HASSAN".into(),
            ..Default::default()
        };
        assert_eq!(store.apply_filter(&filter), 1);

        let filter = Filter {
            search: "6000".into(),
            nationality: Some("مصري".into()),
            ..Default::default()
        };
        assert_eq!(store.apply_filter(&filter), 1);
        assert_eq!(store.filtered()[0].employee_id(), Some("60002"));

        let filter = Filter {
            nationality: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(store.apply_filter(&filter), 2);

        store.remove("60002");
        assert_eq!(store.filtered().len(), 1);
    }

    #[test]
    fn statistics_and_distinct_values() {
        let store = EmployeeStore::from_records(vec![
            employee("1", "a", ACTIVE_STATUS, "800"),
            employee("2", "b", "منتهى", "701"),
            employee("3", "c", ACTIVE_STATUS, "n/a"),
        ]);
        let stats = store.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.average_salary, 500);
        assert_eq!(
            store.distinct_values(Field::ContractStatus),
            vec!["منتهى".to_string(), ACTIVE_STATUS.to_string()]
        );
        assert_eq!(EmployeeStore::new().statistics().average_salary, 0);
    }

    #[tokio::test]
    async fn snapshot_round_trip_and_corrupt_blob() -> anyhow::Result<()> {
        let kv = MemoryStore::new();
        let store = EmployeeStore::from_records(vec![employee("60001", "A", ACTIVE_STATUS, "1")]);
        store.save_to(&kv, "hrSystemData").await?;

        let mut restored = EmployeeStore::new();
        restored.load_from(&kv, "hrSystemData").await?;
        assert_eq!(restored.employees(), store.employees());

        kv.set("hrSystemData", "not json".into()).await?;
        restored.load_from(&kv, "hrSystemData").await?;
        assert!(restored.is_empty());

        let mut store = store;
        store.clear_from(&kv, "hrSystemData").await?;
        assert!(store.is_empty());
        assert_eq!(kv.get("hrSystemData").await?, None);
        Ok(())
    }
}
