//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::sync::Arc;

use document_manager::{
    config::DocumentManagerConfig,
    document::Document,
    encoder::Encoding,
    manager::{DocumentManager, DocumentManagerBuilder},
    metadata::{Behavior, DocumentMapping, FieldMapping},
    options::Options,
    storage::MemorySession,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Mapping table used across the integration tests:
///
/// - `page`: auto-named from its title, with every structural behavior
/// - `article`: placed by explicit options only
/// - `snapshot`: carries a version history
#[allow(dead_code)]
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
                        ..FieldMapping::default()
                    },
                )
                .with_field(
                    "draft_note",
                    FieldMapping {
                        mapped: false,
                        ..FieldMapping::default()
                    },
                ),
        )
        .with_mapping(
            DocumentMapping::new("article", "ArticleDocument", "sulu:article")
                .with_behaviors([Behavior::Uuid, Behavior::Path, Behavior::Parent])
                .with_field("title", FieldMapping::default()),
        )
        .with_mapping(
            DocumentMapping::new("snapshot", "SnapshotDocument", "sulu:snapshot")
                .with_behaviors([Behavior::Uuid, Behavior::Versionable])
                .with_field("title", FieldMapping::default()),
        )
}

/// A builder over a fresh in-memory session with the core subscribers installed.
#[allow(dead_code)]
pub fn test_builder() -> (Arc<MemorySession>, DocumentManagerBuilder) {
    init_logging();
    let session = Arc::new(MemorySession::new());
    let builder = DocumentManager::builder(session.clone())
        .config(test_config())
        .with_core_subscribers();
    (session, builder)
}

#[allow(dead_code)]
pub fn test_manager() -> (Arc<MemorySession>, DocumentManager) {
    let (session, builder) = test_builder();
    (session, builder.build().unwrap())
}

/// Persist a new page titled `title` below `parent_path`, creating missing ancestors.
#[allow(dead_code)]
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

/// Persist a new page titled `title` as a child of `parent`.
#[allow(dead_code)]
pub fn create_child_page(manager: &DocumentManager, title: &str, parent: &Document) -> Document {
    let page = manager.create("page").unwrap();
    page.set("title", title).unwrap();
    page.set_parent(Some(parent.clone())).unwrap();
    manager.persist(&page, "en", Options::default()).unwrap();
    page
}

/// Names of the children of the node at `path`, in sibling order.
#[allow(dead_code)]
pub fn child_names(manager: &DocumentManager, path: &str) -> Vec<String> {
    manager
        .context()
        .node_manager()
        .find(path)
        .unwrap()
        .children()
        .unwrap()
        .iter()
        .map(|child| child.name().unwrap())
        .collect()
}
