//! Employee identity reference data.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Opaque stable identifier of an employee.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeKey(pub String);

impl EmployeeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical employee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeIdentity {
    /// Stable key.
    pub key: EmployeeKey,
    /// Canonical display name.
    #[serde(rename = "name")]
    pub display_name: String,
}

impl EmployeeIdentity {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: EmployeeKey::new(key),
            display_name: display_name.into(),
        }
    }
}

/// Snapshot of the employee table as supplied by the persistence layer.
///
/// ```json
/// {
///   "employees": [{ "key": "E123", "name": "John Smith" }],
///   "aliases": { "J SMITH": "E123" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeDirectory {
    /// Canonical identities.
    pub employees: Vec<EmployeeIdentity>,
    /// Alias display name -> employee key. Aliases are unique.
    pub aliases: BTreeMap<String, EmployeeKey>,
}

impl EmployeeDirectory {
    /// Load a directory snapshot from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_employee(mut self, key: &str, name: &str) -> Self {
        self.employees.push(EmployeeIdentity::new(key, name));
        self
    }

    pub fn with_alias(mut self, alias: &str, key: &str) -> Self {
        self.aliases.insert(alias.to_string(), EmployeeKey::new(key));
        self
    }
}
