//! # document-manager
//!
//! An event-driven object-to-node mapper over hierarchical node storage.
//!
//! ## Overview
//!
//! Documents are typed values whose fields are stored as properties on nodes of a tree-shaped
//! content repository. The [`manager::DocumentManager`] does not persist anything itself: each
//! operation (find, persist, remove, move, ...) is turned into an event and dispatched through
//! fixed chains of listeners, the **subscribers**, which do the work in order.
//!
//! ### Key Features
//!
//! - **Identity map**: within one unit of work a node is represented by exactly one document
//!   instance, tracked by the [`registry::DocumentRegistry`]
//! - **Lazy proxies**: related documents (parents, children, referrers) are placeholders that
//!   hydrate on first access
//! - **Locale hydration**: localized properties are encoded per locale, with fallback to
//!   another locale's content (ghost content) when the requested one is missing
//! - **Behaviors**: document classes opt into uuid, path, node name, parent, children, auto
//!   naming and version mapping through their [`metadata::Metadata`]
//!
//! ## Architecture
//!
//! - **[`storage`]**: the [`storage::Session`] contract and the in-memory implementation
//! - **[`node`]**: node lookup, structural helpers and conflict-free naming
//! - **[`metadata`]**: document class mappings and lookups by alias, class and node type
//! - **[`event`]**: event types and the [`event::EventDispatcher`]
//! - **[`subscriber`]**: the core listeners implementing the document lifecycle
//! - **[`registry`]**: the identity map
//! - **[`proxy`]**: lazy documents and document collections
//! - **[`inspector`]**: read-only questions about managed documents
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use document_manager::{
//!     config::DocumentManagerConfig,
//!     manager::DocumentManager,
//!     metadata::{Behavior, DocumentMapping},
//!     options::Options,
//!     storage::memory::MemorySession,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DocumentManagerConfig::default().with_mapping(
//!         DocumentMapping::new("page", "Page", "sulu:page")
//!             .with_behaviors([Behavior::AutoName, Behavior::Parent])
//!             .with_field("title", Default::default()),
//!     );
//!     let manager = DocumentManager::new(Arc::new(MemorySession::new()), config)?;
//!
//!     let page = manager.create("page")?;
//!     page.set("title", "Hello World")?;
//!     let options = Options::default().with_parent_path("/cmf").with_auto_create(true);
//!     manager.persist(&page, "en", options)?;
//!     manager.flush()?;
//!
//!     let path = manager.inspector().get_path(&page)?;
//!     assert_eq!(manager.find(&path, "en", Options::default())?, page);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod document;
pub mod encoder;
pub mod error;
pub mod event;
pub mod inspector;
pub mod manager;
pub mod metadata;
pub mod node;
pub mod options;
pub mod paths;
pub mod proxy;
pub mod query;
pub mod registry;
pub mod storage;
pub mod subscriber;
#[cfg(test)]
mod tests;
pub mod version;

pub use error::*;
