//! Employee identity resolution.
//!
//! Names printed on documents are resolved against a read-only snapshot of
//! the employee table: canonical names first, then aliases. Nothing here is
//! approximate; a name either resolves exactly (ignoring case and spacing)
//! or not at all.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::employee::{EmployeeDirectory, EmployeeIdentity, EmployeeKey};

/// Index entry for one spelling.
#[derive(Debug, Clone)]
enum Indexed {
    Unique(EmployeeKey),
    /// Two different keys share the spelling.
    Collision,
}

/// Indexed employee table for one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct EmployeeLookup {
    identities: HashMap<EmployeeKey, EmployeeIdentity>,
    exact_names: HashMap<String, Indexed>,
    folded_names: HashMap<String, Indexed>,
    exact_aliases: HashMap<String, Indexed>,
    folded_aliases: HashMap<String, Indexed>,
}

impl EmployeeLookup {
    /// Index a directory snapshot.
    ///
    /// Aliases pointing at keys without a canonical entry are dropped.
    pub fn new(directory: &EmployeeDirectory) -> Self {
        let mut lookup = Self::default();

        for identity in &directory.employees {
            let name = normalize(&identity.display_name);
            insert(&mut lookup.exact_names, name.clone(), &identity.key);
            insert(&mut lookup.folded_names, name.to_lowercase(), &identity.key);
            lookup.identities.insert(identity.key.clone(), identity.clone());
        }

        for (alias, key) in &directory.aliases {
            if !lookup.identities.contains_key(key) {
                warn!("Alias {:?} points at unknown employee {}, ignoring", alias, key);
                continue;
            }
            let alias = normalize(alias);
            insert(&mut lookup.folded_aliases, alias.to_lowercase(), key);
            insert(&mut lookup.exact_aliases, alias, key);
        }

        debug!(
            "Employee lookup: {} employees, {} aliases",
            lookup.identities.len(),
            lookup.exact_aliases.len()
        );
        lookup
    }

    /// Number of canonical employees.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Identity for a key.
    pub fn get(&self, key: &EmployeeKey) -> Option<&EmployeeIdentity> {
        self.identities.get(key)
    }

    /// Resolve a printed name; see [`resolve`].
    pub fn resolve(&self, display_name: &str) -> Option<EmployeeIdentity> {
        let name = normalize(display_name);
        if name.is_empty() {
            return None;
        }
        let folded = name.to_lowercase();

        let key = unique(self.exact_names.get(&name))
            .or_else(|| unique(self.folded_names.get(&folded)))
            .or_else(|| unique(self.exact_aliases.get(&name)))
            .or_else(|| unique(self.folded_aliases.get(&folded)))?;

        self.identities.get(key).cloned()
    }
}

impl From<&EmployeeDirectory> for EmployeeLookup {
    fn from(directory: &EmployeeDirectory) -> Self {
        Self::new(directory)
    }
}

/// Resolve `display_name` to an employee identity.
///
/// Tries, in order: exact canonical name, case-insensitive canonical name,
/// exact alias, case-insensitive alias. A spelling shared by two employees
/// settles nothing and the next step is tried. Returns `None` when no step
/// applies.
pub fn resolve(display_name: &str, lookup: &EmployeeLookup) -> Option<EmployeeIdentity> {
    lookup.resolve(display_name)
}

fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn insert(index: &mut HashMap<String, Indexed>, spelling: String, key: &EmployeeKey) {
    match index.get(&spelling) {
        None => {
            index.insert(spelling, Indexed::Unique(key.clone()));
        }
        Some(Indexed::Unique(existing)) if existing == key => {}
        Some(_) => {
            warn!("Spelling {:?} is shared by several employees", spelling);
            index.insert(spelling, Indexed::Collision);
        }
    }
}

fn unique(entry: Option<&Indexed>) -> Option<&EmployeeKey> {
    match entry {
        Some(Indexed::Unique(key)) => Some(key),
        _ => None,
    }
}
