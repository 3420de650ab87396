use std::collections::BTreeMap;

use crate::error::{DocumentManagerError, Result};

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_SYSTEM_LOCALIZED: &str = "system_localized";
pub const ROLE_CONTENT: &str = "content";
pub const ROLE_CONTENT_LOCALIZED: &str = "content_localized";

/// Maps symbolic roles (e.g. `system_localized`) to the storage namespace prefixes properties
/// of that role are written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    roles: BTreeMap<String, String>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        NamespaceRegistry::new(default_namespaces())
    }
}

pub fn default_namespaces() -> BTreeMap<String, String> {
    [
        (ROLE_SYSTEM, "sulu"),
        (ROLE_SYSTEM_LOCALIZED, "i18n"),
        (ROLE_CONTENT, ""),
        (ROLE_CONTENT_LOCALIZED, "i18n"),
    ]
    .into_iter()
    .map(|(role, prefix)| (role.to_string(), prefix.to_string()))
    .collect()
}

impl NamespaceRegistry {
    pub fn new(roles: BTreeMap<String, String>) -> Self {
        NamespaceRegistry { roles }
    }

    /// The prefix for `role`. An empty prefix means properties of that role are not namespaced.
    pub fn prefix(&self, role: &str) -> Result<&str> {
        self.roles.get(role).map(String::as_str).ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "Trying to use namespace for unknown role \"{role}\", known roles: \"{}\"",
                self.roles.keys().cloned().collect::<Vec<_>>().join("\", \"")
            ))
        })
    }

    pub fn roles(&self) -> &BTreeMap<String, String> {
        &self.roles
    }
}
