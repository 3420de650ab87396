//! Encodes document field names into namespaced storage property names.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{
    error::{DocumentManagerError, Result},
    paths::{
        namespace::{ROLE_CONTENT, ROLE_CONTENT_LOCALIZED, ROLE_SYSTEM, ROLE_SYSTEM_LOCALIZED},
        NamespaceRegistry,
    },
};

/// How a mapped field is stored on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    System,
    SystemLocalized,
    Content,
    #[default]
    ContentLocalized,
}

impl Encoding {
    pub fn role(&self) -> &'static str {
        match self {
            Encoding::System => ROLE_SYSTEM,
            Encoding::SystemLocalized => ROLE_SYSTEM_LOCALIZED,
            Encoding::Content => ROLE_CONTENT,
            Encoding::ContentLocalized => ROLE_CONTENT_LOCALIZED,
        }
    }

    pub fn is_localized(&self) -> bool {
        matches!(self, Encoding::SystemLocalized | Encoding::ContentLocalized)
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.role())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyEncoder {
    namespaces: NamespaceRegistry,
}

impl PropertyEncoder {
    pub fn new(namespaces: NamespaceRegistry) -> Self {
        PropertyEncoder { namespaces }
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    pub fn encode(&self, encoding: Encoding, name: &str, locale: Option<&str>) -> Result<String> {
        match encoding {
            Encoding::System => self.system_name(name),
            Encoding::SystemLocalized => self.localized_system_name(name, locale),
            Encoding::Content => self.content_name(name),
            Encoding::ContentLocalized => self.localized_content_name(name, locale),
        }
    }

    pub fn system_name(&self, name: &str) -> Result<String> {
        self.format_name(ROLE_SYSTEM, name)
    }

    pub fn content_name(&self, name: &str) -> Result<String> {
        self.format_name(ROLE_CONTENT, name)
    }

    pub fn localized_system_name(&self, name: &str, locale: Option<&str>) -> Result<String> {
        self.format_localized_name(ROLE_SYSTEM_LOCALIZED, name, locale)
    }

    pub fn localized_content_name(&self, name: &str, locale: Option<&str>) -> Result<String> {
        self.format_localized_name(ROLE_CONTENT_LOCALIZED, name, locale)
    }

    /// The property-name prefix every localized property of `role` in `locale` starts with.
    pub fn localized_prefix(&self, role: &str, locale: &str) -> Result<String> {
        let prefix = self.namespaces.prefix(role)?;
        Ok(if prefix.is_empty() {
            format!("{locale}-")
        } else {
            format!("{prefix}:{locale}-")
        })
    }

    fn format_name(&self, role: &str, name: &str) -> Result<String> {
        let prefix = self.namespaces.prefix(role)?;
        Ok(if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}:{name}")
        })
    }

    fn format_localized_name(&self, role: &str, name: &str, locale: Option<&str>) -> Result<String> {
        let locale = locale.ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "Cannot encode localized property \"{name}\" for role \"{role}\" without a locale"
            ))
        })?;
        Ok(format!("{}{name}", self.localized_prefix(role, locale)?))
    }
}
