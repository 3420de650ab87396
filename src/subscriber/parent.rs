use crate::{
    context::ManagerContext,
    error::Result,
    event::{HydrateEvent, Listener, PersistEvent},
    metadata::Behavior,
};

/// Relates documents to the document of their node's parent.
///
/// Hydrating a document with the `parent` behavior gives it a placeholder for its parent.
/// Persisting a document that has a parent document places its node below the parent's
/// node, moving it there if it lives elsewhere. An explicitly resolved parent node takes
/// precedence.
#[derive(Debug, Default)]
pub struct ParentSubscriber;

impl Listener<HydrateEvent> for ParentSubscriber {
    fn handle(&self, event: &mut HydrateEvent, context: &ManagerContext) -> Result<()> {
        let document = event.get_document()?;
        let metadata = context
            .metadata_factory()
            .get_metadata_for_class(document.class())?;
        if !metadata.has_behavior(Behavior::Parent) {
            return Ok(());
        }
        let parent = match event.node.parent()? {
            Some(parent_node) => Some(context.proxy_factory().create_proxy_for_node(
                &document,
                &parent_node,
                &event.options,
            )?),
            None => None,
        };
        document.set_parent(parent)
    }
}

impl Listener<PersistEvent> for ParentSubscriber {
    fn handle(&self, event: &mut PersistEvent, context: &ManagerContext) -> Result<()> {
        if event.parent_node.is_some() {
            return Ok(());
        }
        let Some(parent) = event.document.parent()? else {
            return Ok(());
        };
        let parent_node = context.registry().get_node_for_document(&parent)?;

        if let Some(node) = event.node.clone() {
            if node.parent()?.as_ref() != Some(&parent_node) {
                let name = context.name_resolver().resolve_name(
                    &parent_node,
                    &node.name()?,
                    Some(&node),
                    event.options.auto_rename,
                )?;
                tracing::debug!("[Parent] {} changed parent to {parent_node}", event.document);
                context
                    .node_helper()
                    .move_node(&node, &parent_node.path()?, Some(&name))?;
            }
        }
        event.parent_node = Some(parent_node);
        Ok(())
    }
}
