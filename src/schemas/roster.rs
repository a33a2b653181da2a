use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::core::config::ConfigError;

const BUILTIN_ROSTER: &[(&str, &str)] = &[
    ("John Doe", "101"),
    ("Jane Smith", "102"),
    ("Bob Johnson", "103"),
    ("Emily Davis", "104"),
    ("Michael White", "105"),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RosterEntry {
    pub(crate) name: String,
    pub(crate) roll_number: String,
}

/// Canonical student names and their roll numbers. Both are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub(crate) fn builtin() -> Self {
        Self {
            entries: BUILTIN_ROSTER
                .iter()
                .map(|(name, roll_number)| RosterEntry {
                    name: name.to_string(),
                    roll_number: roll_number.to_string(),
                })
                .collect(),
        }
    }

    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_entries(super::read_json_file(path)?),
            None => Ok(Self::builtin()),
        }
    }

    pub(crate) fn from_entries(entries: Vec<RosterEntry>) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        let mut roll_numbers = HashSet::new();
        let mut normalized = Vec::with_capacity(entries.len());

        for entry in entries {
            let name = entry.name.trim().to_string();
            let roll_number = entry.roll_number.trim().to_string();

            if name.is_empty() || roll_number.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "ROSTER_PATH",
                    value: format!("incomplete entry '{name}' / '{roll_number}'"),
                });
            }
            if !names.insert(name.clone()) {
                return Err(ConfigError::DuplicateEntry { kind: "student name", value: name });
            }
            if !roll_numbers.insert(roll_number.clone()) {
                return Err(ConfigError::DuplicateEntry { kind: "roll number", value: roll_number });
            }

            normalized.push(RosterEntry { name, roll_number });
        }

        Ok(Self { entries: normalized })
    }

    pub(crate) fn roll_number_for(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.roll_number.as_str())
    }

    pub(crate) fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }
}
