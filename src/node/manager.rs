use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{DocumentManagerError, Result},
    paths::{is_uuid, join, node_name, normalize, parent_path},
    storage::{Node, NodeId, Session, StorageError},
};

/// Thin adapter over the storage session that speaks in domain errors.
#[derive(Clone)]
pub struct NodeManager {
    session: Arc<dyn Session>,
}

impl NodeManager {
    pub fn new(session: Arc<dyn Session>) -> Self {
        NodeManager { session }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn root(&self) -> Node {
        Node::new(self.session.clone(), self.session.root_identifier())
    }

    /// Find a node by UUID or absolute path.
    pub fn find(&self, identifier: &str) -> Result<Node> {
        self.resolve(identifier)
            .map(|id| Node::new(self.session.clone(), id))
            .map_err(|source| DocumentManagerError::DocumentNotFound {
                identifier: identifier.to_string(),
                source,
            })
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.resolve(identifier).is_ok()
    }

    pub fn remove(&self, identifier: &str) -> Result<()> {
        let node = self.find(identifier)?;
        tracing::debug!("[NodeManager] removing {node}");
        node.remove()?;
        Ok(())
    }

    /// Move the node `src_id` below `parent_id`, naming it `name`.
    pub fn move_node(&self, src_id: &str, parent_id: &str, name: &str) -> Result<()> {
        let src_path = self.find(src_id)?.path()?;
        let parent_path = self.find(parent_id)?.path()?;
        self.session.move_node(&src_path, &join(&parent_path, name))?;
        Ok(())
    }

    /// Copy the node `src_id` below `parent_id` as `name`, returning the new path.
    pub fn copy(&self, src_id: &str, parent_id: &str, name: &str) -> Result<String> {
        let src_path = self.find(src_id)?.path()?;
        let parent_path = self.find(parent_id)?.path()?;
        let dest_path = join(&parent_path, name);
        self.session.copy_node(&src_path, &dest_path)?;
        Ok(dest_path)
    }

    pub fn save(&self) -> Result<()> {
        tracing::debug!("[NodeManager] saving session");
        Ok(self.session.save()?)
    }

    /// Discard pending changes.
    pub fn clear(&self) -> Result<()> {
        tracing::debug!("[NodeManager] clearing session");
        Ok(self.session.refresh(false)?)
    }

    /// Remove every node below the root.
    pub fn purge_workspace(&self) -> Result<()> {
        for child in self.root().children()? {
            child.remove()?;
        }
        Ok(())
    }

    /// Create every missing node along `path`, returning the deepest one.
    pub fn create_path(&self, path: &str) -> Result<Node> {
        let path = normalize(path);
        if let Ok(id) = self.session.identifier_for_path(&path) {
            return Ok(Node::new(self.session.clone(), id));
        }
        let parent = self.create_path(&parent_path(&path))?;
        tracing::debug!("[NodeManager] creating missing path segment {path}");
        Ok(parent.add_node(node_name(&path))?)
    }

    fn resolve(&self, identifier: &str) -> std::result::Result<NodeId, StorageError> {
        if is_uuid(identifier) {
            let id = Uuid::parse_str(identifier)
                .map_err(|_| StorageError::ItemNotFound(identifier.to_string()))?;
            if self.session.exists(&id) {
                Ok(id)
            } else {
                Err(StorageError::ItemNotFound(identifier.to_string()))
            }
        } else {
            self.session.identifier_for_path(identifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySession;

    fn manager() -> NodeManager {
        NodeManager::new(Arc::new(MemorySession::new()))
    }

    #[test]
    fn finds_by_uuid_and_path() {
        let manager = manager();
        let node = manager.create_path("/cmf/contents").unwrap();
        let by_uuid = manager.find(&node.identifier().to_string()).unwrap();
        let by_path = manager.find("/cmf/contents").unwrap();
        assert_eq!(by_uuid, node);
        assert_eq!(by_path, node);
        assert!(manager.has("/cmf"));
    }

    #[test]
    fn missing_node_is_document_not_found() {
        let manager = manager();
        let missing = Uuid::new_v4().to_string();
        for identifier in [missing.as_str(), "/nowhere"] {
            match manager.find(identifier) {
                Err(DocumentManagerError::DocumentNotFound {
                    identifier: reported,
                    source: StorageError::ItemNotFound(_),
                }) => assert_eq!(reported, identifier),
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn move_copy_and_remove() {
        let manager = manager();
        let node = manager.create_path("/a/x").unwrap();
        manager.create_path("/b").unwrap();
        manager.move_node("/a/x", "/b", "y").unwrap();
        assert_eq!(node.path().unwrap(), "/b/y");

        let copied = manager.copy(&node.identifier().to_string(), "/a", "z").unwrap();
        assert_eq!(copied, "/a/z");
        assert_ne!(manager.find("/a/z").unwrap(), node);

        manager.remove("/a/z").unwrap();
        assert!(!manager.has("/a/z"));
    }

    #[test]
    fn clear_and_purge() {
        let manager = manager();
        manager.create_path("/kept").unwrap();
        manager.save().unwrap();
        manager.create_path("/dropped").unwrap();
        manager.clear().unwrap();
        assert!(manager.has("/kept"));
        assert!(!manager.has("/dropped"));

        manager.purge_workspace().unwrap();
        assert!(!manager.root().has_nodes().unwrap());
    }
}
