//! The identity map.
//!
//! [`DocumentRegistry`] associates each managed [`Document`] with exactly one stored [`Node`]
//! and vice versa, and records the locale each document was loaded in. The two directions
//! live in one [`BiMap`] so they cannot drift apart; per-document data (node handle, locales)
//! hangs off the document side.
//!
//! The registry is not transactional. Nothing here is undone when a later storage commit
//! fails: documents registered during a failed flush stay registered until the caller
//! deregisters them or clears the registry.

use std::{
    collections::{hash_map::Entry, HashMap},
    hash::Hash,
};

use crate::{
    document::Document,
    error::{DocumentManagerError, Result},
    storage::{Node, NodeId},
};

/// Bidirectional one-to-one map. Inserting a pair evicts any pair sharing either side.
#[derive(Debug, Clone)]
pub struct BiMap<L, R> {
    left_to_right: HashMap<L, R>,
    right_to_left: HashMap<R, L>,
}

impl<L, R> Default for BiMap<L, R> {
    fn default() -> Self {
        BiMap {
            left_to_right: HashMap::new(),
            right_to_left: HashMap::new(),
        }
    }
}

impl<L: Eq + Hash + Clone, R: Eq + Hash + Clone> BiMap<L, R> {
    /// Insert `left <-> right`, returning the pairs that were evicted to keep the map
    /// one-to-one.
    pub fn insert(&mut self, left: L, right: R) -> Vec<(L, R)> {
        let mut evicted = Vec::new();
        if let Some(old_right) = self.left_to_right.remove(&left) {
            self.right_to_left.remove(&old_right);
            if old_right != right {
                evicted.push((left.clone(), old_right));
            }
        }
        if let Some(old_left) = self.right_to_left.remove(&right) {
            self.left_to_right.remove(&old_left);
            evicted.push((old_left, right.clone()));
        }
        self.left_to_right.insert(left.clone(), right.clone());
        self.right_to_left.insert(right, left);
        evicted
    }

    pub fn get_by_left(&self, left: &L) -> Option<&R> {
        self.left_to_right.get(left)
    }

    pub fn get_by_right(&self, right: &R) -> Option<&L> {
        self.right_to_left.get(right)
    }

    pub fn contains_left(&self, left: &L) -> bool {
        self.left_to_right.contains_key(left)
    }

    pub fn contains_right(&self, right: &R) -> bool {
        self.right_to_left.contains_key(right)
    }

    pub fn remove_by_left(&mut self, left: &L) -> Option<R> {
        let right = self.left_to_right.remove(left)?;
        self.right_to_left.remove(&right);
        Some(right)
    }

    pub fn remove_by_right(&mut self, right: &R) -> Option<L> {
        let left = self.right_to_left.remove(right)?;
        self.left_to_right.remove(&left);
        Some(left)
    }

    pub fn len(&self) -> usize {
        self.left_to_right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    pub fn clear(&mut self) {
        self.left_to_right.clear();
        self.right_to_left.clear();
    }

    /// Both directions hold exactly the same pairs.
    pub fn is_consistent(&self) -> bool {
        self.left_to_right.len() == self.right_to_left.len()
            && self
                .left_to_right
                .iter()
                .all(|(left, right)| self.right_to_left.get(right) == Some(left))
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    document: Document,
    node: Node,
    locale: String,
    original_locale: Option<String>,
}

#[derive(Debug, Default)]
pub struct DocumentRegistry {
    index: BiMap<usize, NodeId>,
    entries: HashMap<usize, RegistryEntry>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        DocumentRegistry::default()
    }

    /// Associate `document` with `node` in `locale`, replacing whatever the document was
    /// associated with before. A different document currently holding `node` is evicted
    /// entirely; one stored node maps to one live document.
    pub fn register_document(&mut self, document: &Document, node: &Node, locale: &str) {
        let key = document.key();
        for (evicted_key, evicted_node) in self.index.insert(key, node.identifier()) {
            if evicted_key != key {
                if let Some(evicted) = self.entries.remove(&evicted_key) {
                    tracing::debug!(
                        "[DocumentRegistry] {} evicted from node {evicted_node} by {document}",
                        evicted.document
                    );
                }
            }
        }
        tracing::trace!("[DocumentRegistry] registering {document} for {node} in \"{locale}\"");
        self.entries.insert(
            key,
            RegistryEntry {
                document: document.clone(),
                node: node.clone(),
                locale: locale.to_string(),
                original_locale: None,
            },
        );
    }

    /// Record the locale a document now holds and, separately, the locale it was requested in.
    pub fn update_locale(
        &mut self,
        document: &Document,
        locale: &str,
        original_locale: Option<&str>,
    ) -> Result<()> {
        let managed = self.entries.len();
        let entry = self
            .entries
            .get_mut(&document.key())
            .ok_or_else(|| DocumentManagerError::not_managed(document, managed))?;
        entry.locale = locale.to_string();
        entry.original_locale = original_locale.map(str::to_string);
        Ok(())
    }

    pub fn has_document(&self, document: &Document) -> bool {
        self.entries.contains_key(&document.key())
    }

    pub fn has_node(&self, node: &Node) -> bool {
        self.index.contains_right(&node.identifier())
    }

    fn entry(&self, document: &Document) -> Result<&RegistryEntry> {
        self.entries
            .get(&document.key())
            .ok_or_else(|| DocumentManagerError::not_managed(document, self.entries.len()))
    }

    pub fn get_node_for_document(&self, document: &Document) -> Result<Node> {
        Ok(self.entry(document)?.node.clone())
    }

    pub fn get_document_for_node(&self, node: &Node) -> Result<Document> {
        self.get_document_for_node_id(&node.identifier())
    }

    pub fn get_document_for_node_id(&self, id: &NodeId) -> Result<Document> {
        self.index
            .get_by_right(id)
            .and_then(|key| self.entries.get(key))
            .map(|entry| entry.document.clone())
            .ok_or_else(|| {
                DocumentManagerError::not_managed(format!("Node \"{id}\""), self.entries.len())
            })
    }

    /// Locale the document's content was loaded in. May be a fallback locale.
    pub fn get_locale_for_document(&self, document: &Document) -> Result<String> {
        Ok(self.entry(document)?.locale.clone())
    }

    /// Locale the document was requested in; the loaded locale unless a fallback was used.
    pub fn get_original_locale_for_document(&self, document: &Document) -> Result<String> {
        let entry = self.entry(document)?;
        Ok(entry
            .original_locale
            .clone()
            .unwrap_or_else(|| entry.locale.clone()))
    }

    pub fn deregister_document(&mut self, document: &Document) -> Result<()> {
        let key = document.key();
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                tracing::trace!(
                    "[DocumentRegistry] deregistering {document} from {}",
                    entry.get().node
                );
                entry.remove();
                self.index.remove_by_left(&key);
                Ok(())
            }
            Entry::Vacant(_) => Err(DocumentManagerError::not_managed(
                document,
                self.entries.len(),
            )),
        }
    }

    pub fn clear(&mut self) {
        tracing::debug!("[DocumentRegistry] clearing {} documents", self.entries.len());
        self.index.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.entries
            .values()
            .map(|entry| entry.document.clone())
            .collect()
    }

    /// The index and the per-document entries describe the same set of documents, in both
    /// directions.
    pub fn is_consistent(&self) -> bool {
        self.index.is_consistent()
            && self.index.len() == self.entries.len()
            && self.entries.iter().all(|(key, entry)| {
                entry.document.key() == *key
                    && self.index.get_by_left(key) == Some(&entry.node.identifier())
            })
    }
}
