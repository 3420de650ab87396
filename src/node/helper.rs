use uuid::Uuid;

use crate::{
    error::{DocumentManagerError, Result},
    paths::{is_uuid, join, node_name, parent_path},
    storage::Node,
};

/// Structural operations on session-level nodes, independent of any document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeHelper;

impl NodeHelper {
    pub fn new() -> Self {
        NodeHelper
    }

    /// Move `node` below the node identified by `parent` (UUID or path). The node keeps its
    /// name unless `destination_name` is given.
    pub fn move_node(
        &self,
        node: &Node,
        parent: &str,
        destination_name: Option<&str>,
    ) -> Result<()> {
        let (src_path, dest_path) = self.destination(node, parent, destination_name)?;
        tracing::debug!("[NodeHelper] moving {src_path} to {dest_path}");
        node.session().move_node(&src_path, &dest_path)?;
        Ok(())
    }

    /// Copy `node` below `parent`, returning the path of the copy.
    pub fn copy(&self, node: &Node, parent: &str, destination_name: Option<&str>) -> Result<String> {
        let (src_path, dest_path) = self.destination(node, parent, destination_name)?;
        tracing::debug!("[NodeHelper] copying {src_path} to {dest_path}");
        node.session().copy_node(&src_path, &dest_path)?;
        Ok(dest_path)
    }

    /// Place `node` directly before its sibling `destination`, or last when `destination` is
    /// `None`. Placing a node before itself leaves the order unchanged.
    pub fn reorder(&self, node: &Node, destination: Option<&str>) -> Result<()> {
        let parent = node.parent()?.ok_or_else(|| {
            DocumentManagerError::structural("Cannot reorder the root node".to_string())
        })?;
        let name = node.name()?;
        let Some(destination) = destination else {
            parent.order_before(&name, None)?;
            return Ok(());
        };

        let sibling_path = self.normalize_path(node, destination)?;
        if sibling_path == node.path()? {
            return Ok(());
        }
        let parent_path_str = parent.path()?;
        if parent_path(&sibling_path) != parent_path_str {
            return Err(DocumentManagerError::structural(format!(
                "Cannot reorder documents which are not siblings. Trying to reorder \"{}\" to \"{}\".",
                node.path()?,
                sibling_path
            )));
        }
        parent.order_before(&name, Some(node_name(&sibling_path)))?;
        Ok(())
    }

    fn destination(
        &self,
        node: &Node,
        parent: &str,
        destination_name: Option<&str>,
    ) -> Result<(String, String)> {
        let parent_path = self.normalize_path(node, parent)?;
        let name = match destination_name {
            Some(name) => name.to_string(),
            None => node.name()?,
        };
        Ok((node.path()?, join(&parent_path, &name)))
    }

    /// Resolve a UUID-shaped identifier to its path; paths pass through unchanged.
    fn normalize_path(&self, node: &Node, identifier: &str) -> Result<String> {
        if !is_uuid(identifier) {
            return Ok(identifier.to_string());
        }
        let id = Uuid::parse_str(identifier)?;
        Ok(node.session().path(&id)?)
    }
}
