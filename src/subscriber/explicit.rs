use crate::{
    context::ManagerContext,
    error::{DocumentManagerError, Result},
    event::{Listener, PersistEvent},
    paths::{node_name, parent_path},
    storage::Node,
};

use super::create_node;

/// Places a persisted document where the `path`, `parent_path` and `node_name` options say.
/// `path` is shorthand for both of the others. Both path options may use `%segment%`
/// placeholders from the configured path segments. With `auto_create`, missing ancestors of
/// the parent path are created.
#[derive(Debug, Default)]
pub struct ExplicitSubscriber;

impl ExplicitSubscriber {
    fn expand(context: &ManagerContext, path: &str) -> Result<String> {
        context
            .path_builder()
            .build(&path.split('/').collect::<Vec<_>>())
    }

    /// Parent for a bare `node_name`: the node of a new document's parent document, or the
    /// current parent of an existing node. Not recorded on the event, so the parent listener
    /// still moves an existing node below a changed parent document.
    fn implicit_parent(context: &ManagerContext, event: &PersistEvent) -> Result<Option<Node>> {
        if let Some(node) = &event.node {
            return Ok(node.parent()?);
        }
        let Some(parent) = event.document.parent()? else {
            return Ok(None);
        };
        let registry = context.registry();
        if !registry.has_document(&parent) {
            return Ok(None);
        }
        Ok(Some(registry.get_node_for_document(&parent)?))
    }

    fn resolve_parent(context: &ManagerContext, path: &str, auto_create: bool) -> Result<Node> {
        if auto_create {
            context.node_manager().create_path(path)
        } else {
            context.node_manager().find(path)
        }
    }
}

impl Listener<PersistEvent> for ExplicitSubscriber {
    fn handle(&self, event: &mut PersistEvent, context: &ManagerContext) -> Result<()> {
        let options = &event.options;
        let (parent, name) = match options.path.as_deref() {
            Some(path) => {
                let path = Self::expand(context, path)?;
                (Some(parent_path(&path)), Some(node_name(&path).to_string()))
            }
            None => (
                options
                    .parent_path
                    .as_deref()
                    .map(|path| Self::expand(context, path))
                    .transpose()?,
                options.node_name.clone(),
            ),
        };
        if parent.is_none() && name.is_none() {
            return Ok(());
        }
        if let Some(parent) = parent {
            event.parent_node = Some(Self::resolve_parent(context, &parent, options.auto_create)?);
        }
        let parent = match event.parent_node.clone() {
            Some(parent) => Some(parent),
            None => Self::implicit_parent(context, event)?,
        };
        let Some(parent) = parent else {
            return Err(DocumentManagerError::structural(format!(
                "The \"node_name\" option needs a parent node for {}; set the \"parent_path\" option or a parent document",
                event.document
            )));
        };
        let auto_rename = event.options.auto_rename;

        match event.node.clone() {
            None => {
                let Some(name) = name else {
                    // leave naming to later listeners
                    return Ok(());
                };
                let name = context
                    .name_resolver()
                    .resolve_name(&parent, &name, None, auto_rename)?;
                event.node = Some(create_node(context, &parent, &name, &event.document)?);
            }
            Some(node) => {
                let current_name = node.name()?;
                let name = name.unwrap_or_else(|| current_name.clone());
                if node.parent()?.as_ref() == Some(&parent) && name == current_name {
                    return Ok(());
                }
                let name = context
                    .name_resolver()
                    .resolve_name(&parent, &name, Some(&node), auto_rename)?;
                context
                    .node_helper()
                    .move_node(&node, &parent.path()?, Some(&name))?;
            }
        }
        Ok(())
    }
}
