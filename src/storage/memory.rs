use parking_lot::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicBool, Ordering},
};
use uuid::Uuid;

use super::{NodeId, PropertyValue, Session, StorageError};
use crate::paths::{node_name, parent_path};

#[derive(Debug, Clone)]
struct MemoryNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: BTreeMap<String, PropertyValue>,
}

impl MemoryNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        MemoryNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Tree {
    root: NodeId,
    nodes: HashMap<NodeId, MemoryNode>,
}

impl Tree {
    fn new() -> Self {
        let root = Uuid::new_v4();
        let mut nodes = HashMap::new();
        nodes.insert(root, MemoryNode::new("", None));
        Tree { root, nodes }
    }

    fn get(&self, id: &NodeId) -> Result<&MemoryNode, StorageError> {
        self.nodes
            .get(id)
            .ok_or_else(|| StorageError::ItemNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &NodeId) -> Result<&mut MemoryNode, StorageError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| StorageError::ItemNotFound(id.to_string()))
    }

    fn path(&self, id: &NodeId) -> Result<String, StorageError> {
        let mut names = Vec::new();
        let mut cursor = self.get(id)?;
        while let Some(parent) = cursor.parent {
            names.push(cursor.name.as_str());
            cursor = self.get(&parent)?;
        }
        names.reverse();
        Ok(format!("/{}", names.join("/")))
    }

    fn child_named(&self, parent: &NodeId, name: &str) -> Result<Option<NodeId>, StorageError> {
        Ok(self
            .get(parent)?
            .children
            .iter()
            .find(|child| self.nodes.get(child).is_some_and(|n| n.name == name))
            .copied())
    }

    fn resolve(&self, path: &str) -> Result<NodeId, StorageError> {
        if !path.starts_with('/') {
            return Err(StorageError::InvalidPath(format!(
                "\"{path}\" is not an absolute path"
            )));
        }
        let mut cursor = self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            cursor = self
                .child_named(&cursor, segment)?
                .ok_or_else(|| StorageError::ItemNotFound(path.to_string()))?;
        }
        Ok(cursor)
    }

    fn is_descendant_or_self(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        let mut cursor = Some(*id);
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Pre-order listing of `id` and everything below it.
    fn subtree(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = vec![*id];
        let mut idx = 0;
        while idx < out.len() {
            if let Some(node) = self.nodes.get(&out[idx]) {
                out.extend(node.children.iter().copied());
            }
            idx += 1;
        }
        out
    }

    fn detach(&mut self, id: &NodeId) -> Result<(), StorageError> {
        if let Some(parent) = self.get(id)?.parent {
            self.get_mut(&parent)?.children.retain(|child| child != id);
        }
        Ok(())
    }

    /// Resolves the parent of `dest_path` and checks that the final segment is free.
    fn destination(&self, dest_path: &str) -> Result<(NodeId, String), StorageError> {
        let name = node_name(dest_path).to_string();
        validate_name(&name)?;
        let parent = self.resolve(&parent_path(dest_path))?;
        if self.child_named(&parent, &name)?.is_some() {
            return Err(StorageError::ItemExists(dest_path.to_string()));
        }
        Ok((parent, name))
    }

    fn copy_subtree(&mut self, src: &NodeId, parent: NodeId, name: &str) -> Result<NodeId, StorageError> {
        let source = self.get(src)?.clone();
        let id = Uuid::new_v4();
        let mut copy = MemoryNode::new(name, Some(parent));
        copy.properties = source.properties.clone();
        self.nodes.insert(id, copy);
        self.get_mut(&parent)?.children.push(id);
        for child in source.children.iter() {
            let child_name = self.get(child)?.name.clone();
            self.copy_subtree(child, id, &child_name)?;
        }
        Ok(id)
    }
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains('/') {
        return Err(StorageError::InvalidPath(format!(
            "\"{name}\" is not a valid node name"
        )));
    }
    Ok(())
}

struct MemoryState {
    pending: Tree,
    saved: Tree,
}

/// In-memory [`Session`]. Writes land in a pending tree; [`Session::save`] commits it and
/// [`Session::refresh`] without `keep_changes` restores the last committed tree.
pub struct MemorySession {
    state: RwLock<MemoryState>,
    read_only: AtomicBool,
}

impl Default for MemorySession {
    fn default() -> Self {
        MemorySession::new()
    }
}

impl MemorySession {
    pub fn new() -> Self {
        let tree = Tree::new();
        MemorySession {
            state: RwLock::new(MemoryState {
                pending: tree.clone(),
                saved: tree,
            }),
            read_only: AtomicBool::new(false),
        }
    }

    /// While read-only, [`Session::save`] fails and pending changes are kept.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn has_pending_changes(&self) -> bool {
        let state = self.state.read();
        let (pending, saved) = (&state.pending, &state.saved);
        pending.nodes.len() != saved.nodes.len()
            || pending.nodes.iter().any(|(id, node)| match saved.nodes.get(id) {
                Some(other) => {
                    other.name != node.name
                        || other.parent != node.parent
                        || other.children != node.children
                        || other.properties != node.properties
                }
                None => true,
            })
    }
}

impl Session for MemorySession {
    fn root_identifier(&self) -> NodeId {
        self.state.read().pending.root
    }

    fn identifier_for_path(&self, path: &str) -> Result<NodeId, StorageError> {
        self.state.read().pending.resolve(path)
    }

    fn exists(&self, id: &NodeId) -> bool {
        self.state.read().pending.nodes.contains_key(id)
    }

    fn path(&self, id: &NodeId) -> Result<String, StorageError> {
        self.state.read().pending.path(id)
    }

    fn name(&self, id: &NodeId) -> Result<String, StorageError> {
        Ok(self.state.read().pending.get(id)?.name.clone())
    }

    fn parent(&self, id: &NodeId) -> Result<Option<NodeId>, StorageError> {
        Ok(self.state.read().pending.get(id)?.parent)
    }

    fn children(&self, id: &NodeId) -> Result<Vec<NodeId>, StorageError> {
        Ok(self.state.read().pending.get(id)?.children.clone())
    }

    fn add_node(&self, parent: &NodeId, name: &str) -> Result<NodeId, StorageError> {
        validate_name(name)?;
        let mut state = self.state.write();
        let tree = &mut state.pending;
        if tree.child_named(parent, name)?.is_some() {
            let parent_path = tree.path(parent)?;
            return Err(StorageError::ItemExists(crate::paths::join(
                &parent_path,
                name,
            )));
        }
        let id = Uuid::new_v4();
        tree.nodes.insert(id, MemoryNode::new(name, Some(*parent)));
        tree.get_mut(parent)?.children.push(id);
        tracing::trace!("[MemorySession] added node {id} named \"{name}\" under {parent}");
        Ok(id)
    }

    fn property(&self, id: &NodeId, name: &str) -> Result<Option<PropertyValue>, StorageError> {
        Ok(self.state.read().pending.get(id)?.properties.get(name).cloned())
    }

    fn property_names(&self, id: &NodeId) -> Result<Vec<String>, StorageError> {
        Ok(self
            .state
            .read()
            .pending
            .get(id)?
            .properties
            .keys()
            .cloned()
            .collect())
    }

    fn set_property(
        &self,
        id: &NodeId,
        name: &str,
        value: Option<PropertyValue>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let node = state.pending.get_mut(id)?;
        match value {
            Some(value) => {
                node.properties.insert(name.to_string(), value);
            }
            None => {
                node.properties.remove(name);
            }
        }
        Ok(())
    }

    fn referrers(&self, id: &NodeId) -> Result<Vec<NodeId>, StorageError> {
        let state = self.state.read();
        let tree = &state.pending;
        tree.get(id)?;
        let mut referrers = tree
            .nodes
            .iter()
            .filter(|(_, node)| node.properties.values().any(|v| v.references(id)))
            .map(|(referrer, _)| -> Result<(String, NodeId), StorageError> {
                Ok((tree.path(referrer)?, *referrer))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        referrers.sort();
        Ok(referrers.into_iter().map(|(_, referrer)| referrer).collect())
    }

    fn move_node(&self, src_path: &str, dest_path: &str) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let tree = &mut state.pending;
        let src = tree.resolve(src_path)?;
        if src == tree.root {
            return Err(StorageError::InvalidPath("the root node cannot be moved".into()));
        }
        let (parent, name) = tree.destination(dest_path)?;
        if tree.is_descendant_or_self(&parent, &src) {
            return Err(StorageError::InvalidPath(format!(
                "cannot move \"{src_path}\" below itself to \"{dest_path}\""
            )));
        }
        tree.detach(&src)?;
        let node = tree.get_mut(&src)?;
        node.name = name;
        node.parent = Some(parent);
        tree.get_mut(&parent)?.children.push(src);
        Ok(())
    }

    fn copy_node(&self, src_path: &str, dest_path: &str) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let tree = &mut state.pending;
        let src = tree.resolve(src_path)?;
        let (parent, name) = tree.destination(dest_path)?;
        if tree.is_descendant_or_self(&parent, &src) {
            return Err(StorageError::InvalidPath(format!(
                "cannot copy \"{src_path}\" below itself to \"{dest_path}\""
            )));
        }
        tree.copy_subtree(&src, parent, &name)?;
        Ok(())
    }

    fn order_before(
        &self,
        parent: &NodeId,
        src_name: &str,
        dest_name: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let tree = &mut state.pending;
        let src = tree
            .child_named(parent, src_name)?
            .ok_or_else(|| StorageError::ItemNotFound(src_name.to_string()))?;
        let dest = match dest_name {
            Some(dest_name) => Some(
                tree.child_named(parent, dest_name)?
                    .ok_or_else(|| StorageError::ItemNotFound(dest_name.to_string()))?,
            ),
            None => None,
        };
        let children = &mut tree.get_mut(parent)?.children;
        children.retain(|child| *child != src);
        match dest.and_then(|dest| children.iter().position(|child| *child == dest)) {
            Some(idx) => children.insert(idx, src),
            None => children.push(src),
        }
        Ok(())
    }

    fn remove_node(&self, id: &NodeId) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let tree = &mut state.pending;
        if *id == tree.root {
            return Err(StorageError::InvalidPath("the root node cannot be removed".into()));
        }
        tree.detach(id)?;
        for removed in tree.subtree(id) {
            tree.nodes.remove(&removed);
        }
        Ok(())
    }

    fn save(&self) -> Result<(), StorageError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::ReadOnly);
        }
        let mut state = self.state.write();
        state.saved = state.pending.clone();
        Ok(())
    }

    fn refresh(&self, keep_changes: bool) -> Result<(), StorageError> {
        if !keep_changes {
            let mut state = self.state.write();
            state.pending = state.saved.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(paths: &[&str]) -> MemorySession {
        let session = MemorySession::new();
        for path in paths {
            let parent = session.identifier_for_path(&parent_path(path)).unwrap();
            session.add_node(&parent, node_name(path)).unwrap();
        }
        session
    }

    fn child_names(session: &MemorySession, path: &str) -> Vec<String> {
        let id = session.identifier_for_path(path).unwrap();
        session
            .children(&id)
            .unwrap()
            .iter()
            .map(|child| session.name(child).unwrap())
            .collect()
    }

    #[test]
    fn resolves_paths_and_identifiers() {
        let session = session_with(&["/cmf", "/cmf/contents"]);
        let id = session.identifier_for_path("/cmf/contents").unwrap();
        assert_eq!(session.path(&id).unwrap(), "/cmf/contents");
        assert_eq!(session.path(&session.root_identifier()).unwrap(), "/");
        assert!(matches!(
            session.identifier_for_path("/cmf/missing"),
            Err(StorageError::ItemNotFound(_))
        ));
        assert!(matches!(
            session.identifier_for_path("cmf"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn rejects_duplicate_children() {
        let session = session_with(&["/a"]);
        let root = session.root_identifier();
        assert_eq!(
            session.add_node(&root, "a"),
            Err(StorageError::ItemExists("/a".to_string()))
        );
    }

    #[test]
    fn move_keeps_identifier() {
        let session = session_with(&["/a", "/a/x", "/b"]);
        let x = session.identifier_for_path("/a/x").unwrap();
        session.move_node("/a/x", "/b/y").unwrap();
        assert_eq!(session.path(&x).unwrap(), "/b/y");
        assert!(child_names(&session, "/a").is_empty());
        assert!(session.move_node("/b", "/b/y/z").is_err());
    }

    #[test]
    fn copy_assigns_new_identifiers() {
        let session = session_with(&["/a", "/a/x", "/b"]);
        let x = session.identifier_for_path("/a/x").unwrap();
        session.set_property(&x, "title", Some("X".into())).unwrap();
        session.copy_node("/a", "/b/a").unwrap();
        let copied = session.identifier_for_path("/b/a/x").unwrap();
        assert_ne!(copied, x);
        assert_eq!(
            session.property(&copied, "title").unwrap(),
            Some(PropertyValue::from("X"))
        );
    }

    #[test]
    fn order_before_reorders_siblings() {
        let session = session_with(&["/p", "/p/a", "/p/b", "/p/c"]);
        let parent = session.identifier_for_path("/p").unwrap();
        session.order_before(&parent, "c", Some("a")).unwrap();
        assert_eq!(child_names(&session, "/p"), vec!["c", "a", "b"]);
        session.order_before(&parent, "c", None).unwrap();
        assert_eq!(child_names(&session, "/p"), vec!["a", "b", "c"]);
    }

    #[test]
    fn refresh_discards_pending_changes() {
        let session = session_with(&["/a"]);
        session.save().unwrap();
        let root = session.root_identifier();
        session.add_node(&root, "b").unwrap();
        assert!(session.has_pending_changes());
        session.refresh(false).unwrap();
        assert!(!session.has_pending_changes());
        assert_eq!(child_names(&session, "/"), vec!["a"]);
    }

    #[test]
    fn read_only_save_fails_and_keeps_changes() {
        let session = session_with(&["/a"]);
        session.set_read_only(true);
        assert_eq!(session.save(), Err(StorageError::ReadOnly));
        assert!(session.has_pending_changes());
    }

    #[test]
    fn referrers_scan_reference_properties() {
        let session = session_with(&["/target", "/a", "/b"]);
        let target = session.identifier_for_path("/target").unwrap();
        let a = session.identifier_for_path("/a").unwrap();
        let b = session.identifier_for_path("/b").unwrap();
        session
            .set_property(&a, "link", Some(PropertyValue::Reference(target)))
            .unwrap();
        session
            .set_property(
                &b,
                "links",
                Some(PropertyValue::Multiple(vec![PropertyValue::Reference(target)])),
            )
            .unwrap();
        assert_eq!(session.referrers(&target).unwrap(), vec![a, b]);
    }
}
