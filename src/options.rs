use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    error::{DocumentManagerError, Result},
    storage::PropertyValue,
};

/// Per-operation options. The typed fields are understood by the core subscribers; `extra`
/// carries options declared by other listeners through the `ConfigureOptions` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Alias or class the found document must have.
    #[serde(rename = "type")]
    pub type_filter: Option<String>,
    /// Absolute path (parent + node name) to persist a new document at.
    pub path: Option<String>,
    pub parent_path: Option<String>,
    pub node_name: Option<String>,
    /// Create missing ancestors of `parent_path`.
    pub auto_create: bool,
    pub auto_rename: bool,
    /// Hydrate even when the document is already loaded in the requested locale.
    pub rehydrate: bool,
    /// Fall back to another locale's content when the requested one does not exist.
    pub load_ghost_content: bool,
    pub extra: BTreeMap<String, PropertyValue>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            type_filter: None,
            path: None,
            parent_path: None,
            node_name: None,
            auto_create: false,
            auto_rename: true,
            rehydrate: false,
            load_ghost_content: true,
            extra: BTreeMap::new(),
        }
    }
}

impl Options {
    pub fn with_type<S: Into<String>>(mut self, alias_or_class: S) -> Self {
        self.type_filter = Some(alias_or_class.into());
        self
    }

    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_parent_path<S: Into<String>>(mut self, parent_path: S) -> Self {
        self.parent_path = Some(parent_path.into());
        self
    }

    pub fn with_node_name<S: Into<String>>(mut self, node_name: S) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    pub fn with_auto_rename(mut self, auto_rename: bool) -> Self {
        self.auto_rename = auto_rename;
        self
    }

    pub fn with_rehydrate(mut self, rehydrate: bool) -> Self {
        self.rehydrate = rehydrate;
        self
    }

    pub fn with_ghost_content(mut self, load_ghost_content: bool) -> Self {
        self.load_ghost_content = load_ghost_content;
        self
    }

    pub fn with_extra<K: Into<String>, V: Into<PropertyValue>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn extra(&self, key: &str) -> Option<&PropertyValue> {
        self.extra.get(key)
    }
}

/// Collects the extra options listeners declare for one event kind and validates/fills them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsResolver {
    defined: BTreeMap<String, Option<PropertyValue>>,
}

impl OptionsResolver {
    pub fn new() -> Self {
        OptionsResolver::default()
    }

    /// Declare `key` with a default applied when the caller omits it.
    pub fn set_default<K: Into<String>, V: Into<PropertyValue>>(&mut self, key: K, value: V) -> &mut Self {
        self.defined.insert(key.into(), Some(value.into()));
        self
    }

    /// Declare `key` without a default.
    pub fn set_defined<K: Into<String>>(&mut self, key: K) -> &mut Self {
        self.defined.entry(key.into()).or_insert(None);
        self
    }

    pub fn is_defined(&self, key: &str) -> bool {
        self.defined.contains_key(key)
    }

    pub fn defined(&self) -> Vec<String> {
        self.defined.keys().cloned().collect()
    }

    pub fn resolve(&self, mut options: Options) -> Result<Options> {
        if let Some(unknown) = options.extra.keys().find(|key| !self.is_defined(key)) {
            return Err(DocumentManagerError::InvalidOption {
                option: unknown.clone(),
                known: self.defined(),
            });
        }
        for (key, default) in self.defined.iter() {
            if let Some(default) = default {
                options
                    .extra
                    .entry(key.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_expectations() {
        let options = Options::default();
        assert!(options.auto_rename);
        assert!(options.load_ghost_content);
        assert!(!options.rehydrate);
    }

    #[test]
    fn deserializes_type_key() {
        let options: Options = toml::from_str("type = \"page\"\nauto_rename = false").unwrap();
        assert_eq!(options.type_filter.as_deref(), Some("page"));
        assert!(!options.auto_rename);
        assert!(options.load_ghost_content);
    }

    #[test]
    fn resolver_fills_defaults_and_rejects_unknown() {
        let mut resolver = OptionsResolver::new();
        resolver.set_default("webspace", "sulu_io").set_defined("segment");

        let resolved = resolver.resolve(Options::default()).unwrap();
        assert_eq!(resolved.extra("webspace"), Some(&PropertyValue::from("sulu_io")));
        assert_eq!(resolved.extra("segment"), None);

        let explicit = resolver
            .resolve(Options::default().with_extra("webspace", "other"))
            .unwrap();
        assert_eq!(explicit.extra("webspace"), Some(&PropertyValue::from("other")));

        let err = resolver
            .resolve(Options::default().with_extra("nope", true))
            .unwrap_err();
        assert_eq!(
            err,
            DocumentManagerError::InvalidOption {
                option: "nope".to_string(),
                known: vec!["segment".to_string(), "webspace".to_string()],
            }
        );
    }
}
