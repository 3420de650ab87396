use std::{fmt, io};

use thiserror::Error;

use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, DocumentManagerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentManagerError {
    #[error("{subject} is not managed. There are {managed} managed objects")]
    NotManaged { subject: String, managed: usize },
    #[error(
        "Metadata for {axis} \"{key}\" not found, known keys: \"{}\"",
        .known.join("\", \"")
    )]
    MetadataNotFound {
        axis: &'static str,
        key: String,
        known: Vec<String>,
    },
    #[error("Node with name \"{0}\" already exists")]
    NodeNameAlreadyExists(String),
    #[error("Document manager error: {0}")]
    Structural(String),
    #[error("Document \"{identifier}\" not found: {source}")]
    DocumentNotFound {
        identifier: String,
        source: StorageError,
    },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid document mapping: {0}")]
    Mapping(String),
    #[error(
        "Unknown option \"{option}\", known options: \"{}\"",
        .known.join("\", \"")
    )]
    InvalidOption { option: String, known: Vec<String> },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("The document manager owning this document has been dropped")]
    Detached,
}

impl DocumentManagerError {
    pub fn not_managed<S: fmt::Display>(subject: S, managed: usize) -> Self {
        DocumentManagerError::NotManaged {
            subject: subject.to_string(),
            managed,
        }
    }

    pub fn structural<S: Into<String>>(message: S) -> Self {
        DocumentManagerError::Structural(message.into())
    }
}

impl From<toml::de::Error> for DocumentManagerError {
    fn from(src: toml::de::Error) -> DocumentManagerError {
        DocumentManagerError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for DocumentManagerError {
    fn from(src: toml::ser::Error) -> DocumentManagerError {
        DocumentManagerError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<serde_json::Error> for DocumentManagerError {
    fn from(src: serde_json::Error) -> DocumentManagerError {
        DocumentManagerError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<uuid::Error> for DocumentManagerError {
    fn from(src: uuid::Error) -> DocumentManagerError {
        DocumentManagerError::Serialization(format!("UUID conversion failed: {src}"))
    }
}

impl From<io::Error> for DocumentManagerError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => DocumentManagerError::Config(format!("{x}")),
            _ => DocumentManagerError::Config(format!("IOError: {}", x.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_not_found_lists_known_keys() {
        let err = DocumentManagerError::MetadataNotFound {
            axis: "alias",
            key: "article".to_string(),
            known: vec!["page".to_string(), "snippet".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Metadata for alias \"article\" not found, known keys: \"page\", \"snippet\""
        );
    }

    #[test]
    fn not_managed_reports_count() {
        let err = DocumentManagerError::not_managed("Document \"page\"", 3);
        assert!(err.to_string().contains("There are 3 managed objects"));
    }
}
