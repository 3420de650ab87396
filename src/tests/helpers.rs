//! Shared test utilities for manager-level unit tests

use std::sync::Arc;

use crate::{
    config::DocumentManagerConfig,
    document::Document,
    encoder::Encoding,
    manager::DocumentManager,
    metadata::{Behavior, DocumentMapping, FieldMapping},
    options::Options,
    storage::{memory::MemorySession, PropertyValue},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Two document classes: auto-named pages with every behavior, and plain articles that need
/// an explicit node name.
pub fn test_config() -> DocumentManagerConfig {
    DocumentManagerConfig::default()
        .with_default_locale("en")
        .with_mapping(
            DocumentMapping::new("page", "PageDocument", "sulu:page")
                .with_behaviors([
                    Behavior::Uuid,
                    Behavior::NodeName,
                    Behavior::Path,
                    Behavior::Locale,
                    Behavior::Parent,
                    Behavior::Children,
                    Behavior::AutoName,
                ])
                .with_field("title", FieldMapping::default())
                .with_field(
                    "template",
                    FieldMapping {
                        encoding: Encoding::System,
                        default: Some(PropertyValue::from("default")),
                        ..FieldMapping::default()
                    },
                ),
        )
        .with_mapping(
            DocumentMapping::new("article", "ArticleDocument", "sulu:article")
                .with_behaviors([Behavior::Uuid, Behavior::Parent])
                .with_field("title", FieldMapping::default())
                .with_field(
                    "related",
                    FieldMapping {
                        encoding: Encoding::Content,
                        ..FieldMapping::default()
                    },
                ),
        )
}

pub fn create_test_manager() -> (Arc<MemorySession>, DocumentManager) {
    init_logging();
    let session = Arc::new(MemorySession::new());
    let manager = DocumentManager::new(session.clone(), test_config()).unwrap();
    (session, manager)
}

/// Persist a page titled `title` below `parent_path` (created if missing) in `locale`.
pub fn create_page(
    manager: &DocumentManager,
    title: &str,
    parent_path: &str,
    locale: &str,
) -> Document {
    let page = manager.create("page").unwrap();
    page.set("title", title).unwrap();
    manager
        .persist(
            &page,
            locale,
            Options::default()
                .with_parent_path(parent_path)
                .with_auto_create(true),
        )
        .unwrap();
    page
}
