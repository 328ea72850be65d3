//! Name tables: layers, linetypes, application ids, plot styles, materials.
//!
//! Entries are addressed by name, case-insensitively, and remember the
//! spelling they were added with. A table only maps names to handles; the
//! records themselves live in the entity database.

use crate::attributes::validation::{validate_table_name, NameValidationError};
use crate::error::{DxfError, Result};
use crate::store::Handle;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub handle: Option<Handle>,
}

#[derive(Debug, Clone)]
pub struct NameTable {
    kind: &'static str,
    validate: fn(&str) -> std::result::Result<(), NameValidationError>,
    entries: BTreeMap<String, TableEntry>,
}

/// Lookup key of a table name, names compare case-insensitively.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

pub fn same_name(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

impl NameTable {
    pub fn new(kind: &'static str) -> Self {
        Self::with_validator(kind, validate_table_name)
    }

    /// Table with its own name rules, e.g. the layer table accepting `*ADSK_`.
    pub fn with_validator(
        kind: &'static str,
        validate: fn(&str) -> std::result::Result<(), NameValidationError>,
    ) -> Self {
        Self {
            kind,
            validate,
            entries: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.contains_key(&name_key(name))
    }

    pub fn get(&self, name: &str) -> Option<&TableEntry> {
        self.entries.get(&name_key(name))
    }

    pub fn handle_of(&self, name: &str) -> Option<&str> {
        self.get(name)?.handle.as_deref()
    }

    /// Reverse lookup, linear in the table size.
    pub fn name_of(&self, handle: &str) -> Option<&str> {
        self.entries
            .values()
            .find(|entry| {
                entry
                    .handle
                    .as_deref()
                    .is_some_and(|h| h.eq_ignore_ascii_case(handle))
            })
            .map(|entry| entry.name.as_str())
    }

    /// Adds a new entry; the name must be valid and not yet taken.
    pub fn add(&mut self, name: &str, handle: Option<Handle>) -> Result<&TableEntry> {
        (self.validate)(name)
            .map_err(|e| DxfError::InvalidIdentifier(format!("{} '{}': {}", self.kind, name, e)))?;
        if self.has_entry(name) {
            return Err(DxfError::InvalidIdentifier(format!(
                "{} '{}' already exists",
                self.kind, name
            )));
        }
        let entry = self.entries.entry(name_key(name)).or_insert(TableEntry {
            name: name.to_string(),
            handle,
        });
        Ok(entry)
    }

    /// Adds `name` unless present. Returns `true` if it was added.
    pub fn ensure(&mut self, name: &str, handle: Option<Handle>) -> bool {
        if self.has_entry(name) {
            return false;
        }
        self.entries.insert(
            name_key(name),
            TableEntry {
                name: name.to_string(),
                handle,
            },
        );
        true
    }

    /// Moves the entry stored under `old` to `new` in one step.
    ///
    /// `new` may differ from `old` in case only. The table is unchanged when
    /// an error is returned.
    pub fn replace(&mut self, old: &str, new: &str) -> Result<()> {
        let old_key = name_key(old);
        let new_key = name_key(new);
        if !self.entries.contains_key(&old_key) {
            return Err(DxfError::TableEntryNotFound(format!("{} '{}'", self.kind, old)));
        }
        if old_key != new_key && self.entries.contains_key(&new_key) {
            return Err(DxfError::InvalidIdentifier(format!(
                "{} '{}' already exists",
                self.kind, new
            )));
        }
        if let Some(mut entry) = self.entries.remove(&old_key) {
            entry.name = new.to_string();
            self.entries.insert(new_key, entry);
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<TableEntry> {
        self.entries.remove(&name_key(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
