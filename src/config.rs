use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{read_to_string, write},
    path::Path,
};

use crate::{
    error::{DocumentManagerError, Result},
    metadata::DocumentMapping,
    paths::{default_namespaces, default_path_segments},
};

/// Everything a document manager is configured with. Every key is optional in TOML; missing
/// tables fall back to the defaults.
///
/// ```toml
/// default_locale = "en"
///
/// [namespaces]
/// system = "sulu"
///
/// [[mapping]]
/// alias = "page"
/// class = "PageDocument"
/// phpcr_type = "sulu:page"
/// behaviors = ["uuid", "path", "auto_name"]
///
/// [mapping.fields.title]
/// encoding = "content_localized"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentManagerConfig {
    /// Locale ghost content is loaded in when a document has no translation for the requested
    /// one. Without it the first available translation is used.
    pub default_locale: Option<String>,
    pub namespaces: BTreeMap<String, String>,
    pub path_segments: BTreeMap<String, String>,
    pub mapping: Vec<DocumentMapping>,
}

impl Default for DocumentManagerConfig {
    fn default() -> Self {
        DocumentManagerConfig {
            default_locale: None,
            namespaces: default_namespaces(),
            path_segments: default_path_segments(),
            mapping: Vec::new(),
        }
    }
}

impl DocumentManagerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: DocumentManagerConfig = toml::from_str(content)?;
        // Partial tables only override the roles/segments they name.
        for (key, value) in default_namespaces() {
            config.namespaces.entry(key).or_insert(value);
        }
        for (key, value) in default_path_segments() {
            config.path_segments.entry(key).or_insert(value);
        }
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!("Reading document manager config from {:?}", path.as_ref());
        if !path.as_ref().exists() {
            return Err(DocumentManagerError::Config(format!(
                "config file {:?} does not exist",
                path.as_ref()
            )));
        }
        Self::from_toml_str(&read_to_string(path)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        tracing::debug!("Writing document manager config to {:?}", path.as_ref());
        write(path, toml::to_string(self)?)?;
        Ok(())
    }

    pub fn with_default_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn with_mapping(mut self, mapping: DocumentMapping) -> Self {
        self.mapping.push(mapping);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encoder::Encoding, metadata::Behavior};
    use tempfile::tempdir;

    const CONFIG: &str = r#"
        default_locale = "en"

        [namespaces]
        system = "sys"

        [path_segments]
        snippet = "fragments"

        [[mapping]]
        alias = "page"
        class = "PageDocument"
        phpcr_type = "sulu:page"
        behaviors = ["uuid", "path", "auto_name"]

        [mapping.fields.title]
        encoding = "content_localized"

        [[mapping]]
        alias = "snippet"
        class = "SnippetDocument"
        phpcr_type = "sulu:snippet"
    "#;

    #[test]
    fn partial_tables_keep_defaults() {
        let config = DocumentManagerConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.default_locale.as_deref(), Some("en"));
        assert_eq!(config.namespaces["system"], "sys");
        assert_eq!(config.namespaces["content_localized"], "i18n");
        assert_eq!(config.path_segments["snippet"], "fragments");
        assert_eq!(config.path_segments["base"], "cmf");
        assert_eq!(config.mapping.len(), 2);
        assert_eq!(
            config.mapping[0].behaviors,
            vec![Behavior::Uuid, Behavior::Path, Behavior::AutoName]
        );
        assert_eq!(
            config.mapping[0].fields["title"].encoding,
            Encoding::ContentLocalized
        );
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(
            DocumentManagerConfig::from_toml_str("").unwrap(),
            DocumentManagerConfig::default()
        );
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("document_manager.toml");
        let config = DocumentManagerConfig::from_toml_str(CONFIG).unwrap();
        config.save(&path).unwrap();
        assert_eq!(DocumentManagerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let err = DocumentManagerConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, DocumentManagerError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = DocumentManagerConfig::from_toml_str("mapping = 3").unwrap_err();
        assert!(matches!(err, DocumentManagerError::Config(_)));
    }
}
