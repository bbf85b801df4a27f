//! Environment variable records and collections.
//!
//! Includes:
//! - `EnvVar`: a single name/value pair, serialised as a `Name,Value` CSV row.
//! - `EnvVarSet`: the ordered mapping read from the registry.
//! - `BatchReport`: outcome counters for CSV-driven add/delete runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single persisted environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered name -> value mapping.
///
/// Iteration follows insertion order, which for registry reads is the
/// enumeration order. Inserting a name that already exists replaces the value
/// in place, so the last write wins without moving the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarSet {
    vars: Vec<EnvVar>,
}

impl EnvVarSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a variable, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|v| v.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
            None => {
                self.vars.push(EnvVar { name, value });
                None
            },
        }
    }

    /// Removes a variable by name, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<EnvVar> {
        let index = self.vars.iter().position(|v| v.name == name)?;
        Some(self.vars.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnvVar> {
        self.vars.iter()
    }
}

impl FromIterator<EnvVar> for EnvVarSet {
    fn from_iter<I: IntoIterator<Item = EnvVar>>(iter: I) -> Self {
        let mut set = EnvVarSet::new();
        for var in iter {
            set.insert(var.name, var.value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a EnvVarSet {
    type Item = &'a EnvVar;
    type IntoIter = std::slice::Iter<'a, EnvVar>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

/// Outcome counters for one CSV-driven batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Rows skipped because they did not have exactly two fields.
    pub skipped: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    pub fn record(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} row(s): {} succeeded, {} failed, {} skipped.",
            self.total(),
            self.succeeded,
            self.failed,
            self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_value_in_place() {
        let mut set = EnvVarSet::new();
        assert_eq!(set.insert("A", "1"), None);
        assert_eq!(set.insert("B", "2"), None);
        assert_eq!(set.insert("A", "3"), Some("1".to_string()));

        let names: Vec<&str> = set.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(set.get("A"), Some("3"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_missing_name_leaves_set_unchanged() {
        let mut set: EnvVarSet = vec![EnvVar::new("PATH", "C:\\bin")].into_iter().collect();
        let before = set.clone();
        assert!(set.remove("NOPE").is_none());
        assert_eq!(set, before);

        assert_eq!(set.remove("PATH"), Some(EnvVar::new("PATH", "C:\\bin")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_iter_last_write_wins() {
        let set: EnvVarSet = vec![
            EnvVar::new("X", "old"),
            EnvVar::new("Y", "y"),
            EnvVar::new("X", "new"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("X"), Some("new"));
        assert!(set.contains("Y"));
    }

    #[test]
    fn test_batch_report_summary() {
        let mut report = BatchReport::default();
        report.record(true);
        report.record(true);
        report.record(false);
        report.skipped += 1;
        assert_eq!(report.total(), 4);
        assert_eq!(
            report.to_string(),
            "Processed 4 row(s): 2 succeeded, 1 failed, 1 skipped."
        );
    }
}
