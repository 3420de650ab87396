//! The narrow contract of the hierarchical node store the document manager sits on.
//!
//! The document manager never owns node data. It talks to a [`Session`], which addresses
//! nodes by their immutable identifier and keeps writes pending until [`Session::save`].
//! [`Node`] is a cheap handle pairing a session with one identifier; all structural reads go
//! through the session so a handle stays valid across moves and reorders.
//!
//! [`memory::MemorySession`] is the in-process reference engine used by the test-suite and
//! by embedders that do not need durable storage.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemorySession;

/// Identifier of a stored node. Stable for the node's whole life, including moves.
pub type NodeId = Uuid;

/// Property carrying the node type tags ("mixins") used to resolve document metadata.
pub const MIXIN_TYPES_PROPERTY: &str = "jcr:mixinTypes";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Item already exists: {0}")]
    ItemExists(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("The workspace is read-only, pending changes could not be saved")]
    ReadOnly,
}

/// A typed node property value. Document fields use the same representation so that mapping
/// between the two never has to guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Reference(NodeId),
    Multiple(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<NodeId> {
        match self {
            PropertyValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_multiple(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Multiple(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// True if this value, or any value nested within it, references `target`.
    pub fn references(&self, target: &NodeId) -> bool {
        match self {
            PropertyValue::Reference(id) => id == target,
            PropertyValue::Multiple(values) => values.iter().any(|v| v.references(target)),
            _ => false,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Long(l) => write!(f, "{l}"),
            PropertyValue::Double(d) => write!(f, "{d}"),
            PropertyValue::Boolean(b) => write!(f, "{b}"),
            PropertyValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            PropertyValue::Reference(id) => write!(f, "{id}"),
            PropertyValue::Multiple(values) => {
                let parts = values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(l: i64) -> Self {
        PropertyValue::Long(l)
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Double(d)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(d: DateTime<Utc>) -> Self {
        PropertyValue::Date(d)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(values: Vec<PropertyValue>) -> Self {
        PropertyValue::Multiple(values)
    }
}

/// Session-scoped access to a hierarchical, identifier-addressable, property-bearing store.
///
/// Paths are absolute and slash-delimited; the root node has the path `/` and an empty name.
/// Sibling order is significant and preserved by every implementation.
pub trait Session: Send + Sync {
    fn root_identifier(&self) -> NodeId;

    fn identifier_for_path(&self, path: &str) -> Result<NodeId, StorageError>;

    fn exists(&self, id: &NodeId) -> bool;

    fn path(&self, id: &NodeId) -> Result<String, StorageError>;

    fn name(&self, id: &NodeId) -> Result<String, StorageError>;

    fn parent(&self, id: &NodeId) -> Result<Option<NodeId>, StorageError>;

    /// Children of `id`, in sibling order.
    fn children(&self, id: &NodeId) -> Result<Vec<NodeId>, StorageError>;

    fn add_node(&self, parent: &NodeId, name: &str) -> Result<NodeId, StorageError>;

    fn property(&self, id: &NodeId, name: &str) -> Result<Option<PropertyValue>, StorageError>;

    fn property_names(&self, id: &NodeId) -> Result<Vec<String>, StorageError>;

    /// Sets a property; `None` removes it.
    fn set_property(
        &self,
        id: &NodeId,
        name: &str,
        value: Option<PropertyValue>,
    ) -> Result<(), StorageError>;

    /// Nodes holding a reference property that points at `id`.
    fn referrers(&self, id: &NodeId) -> Result<Vec<NodeId>, StorageError>;

    /// Moves the node at `src_path` so that it ends up at `dest_path` (new parent + new name).
    fn move_node(&self, src_path: &str, dest_path: &str) -> Result<(), StorageError>;

    /// Copies the subtree at `src_path` to `dest_path`. Copied nodes get new identifiers.
    fn copy_node(&self, src_path: &str, dest_path: &str) -> Result<(), StorageError>;

    /// Places child `src_name` of `parent` immediately before `dest_name`, or last if `None`.
    fn order_before(
        &self,
        parent: &NodeId,
        src_name: &str,
        dest_name: Option<&str>,
    ) -> Result<(), StorageError>;

    fn remove_node(&self, id: &NodeId) -> Result<(), StorageError>;

    fn save(&self) -> Result<(), StorageError>;

    /// Drops pending changes unless `keep_changes` is set.
    fn refresh(&self, keep_changes: bool) -> Result<(), StorageError>;
}

/// Handle on one stored node.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    session: Arc<dyn Session>,
}

impl Node {
    pub fn new(session: Arc<dyn Session>, id: NodeId) -> Self {
        Node { id, session }
    }

    pub fn identifier(&self) -> NodeId {
        self.id
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn path(&self) -> Result<String, StorageError> {
        self.session.path(&self.id)
    }

    pub fn name(&self) -> Result<String, StorageError> {
        self.session.name(&self.id)
    }

    /// Number of ancestors between this node and the root; the root itself has depth 0.
    pub fn depth(&self) -> Result<usize, StorageError> {
        let path = self.path()?;
        Ok(path.split('/').filter(|segment| !segment.is_empty()).count())
    }

    pub fn parent(&self) -> Result<Option<Node>, StorageError> {
        Ok(self
            .session
            .parent(&self.id)?
            .map(|id| Node::new(self.session.clone(), id)))
    }

    pub fn children(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self
            .session
            .children(&self.id)?
            .into_iter()
            .map(|id| Node::new(self.session.clone(), id))
            .collect())
    }

    pub fn has_nodes(&self) -> Result<bool, StorageError> {
        Ok(!self.session.children(&self.id)?.is_empty())
    }

    pub fn has_node(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.child(name)?.is_some())
    }

    pub fn node(&self, name: &str) -> Result<Node, StorageError> {
        self.child(name)?
            .ok_or_else(|| StorageError::ItemNotFound(format!("{}/{}", self.path_or_id(), name)))
    }

    fn child(&self, name: &str) -> Result<Option<Node>, StorageError> {
        for child in self.session.children(&self.id)? {
            if self.session.name(&child)? == name {
                return Ok(Some(Node::new(self.session.clone(), child)));
            }
        }
        Ok(None)
    }

    pub fn add_node(&self, name: &str) -> Result<Node, StorageError> {
        let id = self.session.add_node(&self.id, name)?;
        Ok(Node::new(self.session.clone(), id))
    }

    pub fn property(&self, name: &str) -> Result<Option<PropertyValue>, StorageError> {
        self.session.property(&self.id, name)
    }

    pub fn property_names(&self) -> Result<Vec<String>, StorageError> {
        self.session.property_names(&self.id)
    }

    pub fn set_property<V: Into<PropertyValue>>(
        &self,
        name: &str,
        value: V,
    ) -> Result<(), StorageError> {
        self.session
            .set_property(&self.id, name, Some(value.into()))
    }

    pub fn remove_property(&self, name: &str) -> Result<(), StorageError> {
        self.session.set_property(&self.id, name, None)
    }

    /// The node's type tags, in the order they were added.
    pub fn mixin_types(&self) -> Result<Vec<String>, StorageError> {
        Ok(match self.property(MIXIN_TYPES_PROPERTY)? {
            Some(PropertyValue::Multiple(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(PropertyValue::String(single)) => vec![single],
            _ => Vec::new(),
        })
    }

    pub fn add_mixin(&self, mixin: &str) -> Result<(), StorageError> {
        let mut mixins = self.mixin_types()?;
        if mixins.iter().any(|m| m == mixin) {
            return Ok(());
        }
        mixins.push(mixin.to_string());
        self.set_property(
            MIXIN_TYPES_PROPERTY,
            PropertyValue::Multiple(mixins.into_iter().map(PropertyValue::String).collect()),
        )
    }

    pub fn referrers(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self
            .session
            .referrers(&self.id)?
            .into_iter()
            .map(|id| Node::new(self.session.clone(), id))
            .collect())
    }

    pub fn order_before(&self, src_name: &str, dest_name: Option<&str>) -> Result<(), StorageError> {
        self.session.order_before(&self.id, src_name, dest_name)
    }

    pub fn remove(&self) -> Result<(), StorageError> {
        self.session.remove_node(&self.id)
    }

    fn path_or_id(&self) -> String {
        self.path().unwrap_or_else(|_| self.id.to_string())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("path", &self.path().ok())
            .finish()
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_or_id())
    }
}
