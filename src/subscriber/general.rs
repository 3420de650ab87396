use crate::{
    context::ManagerContext,
    error::Result,
    event::{
        ClearEvent, CopyEvent, FlushEvent, Listener, MoveEvent, RefreshEvent, RemoveEvent,
        ReorderEvent,
    },
    metadata::Behavior,
    options::Options,
    storage::{Node, NodeId},
};

use super::mapping::MappingSubscriber;

/// Structural operations and unit-of-work boundaries, carried out on the registered node of
/// the event's document.
#[derive(Debug, Default)]
pub struct GeneralSubscriber;

impl GeneralSubscriber {
    fn descendants(node: &Node, into: &mut Vec<NodeId>) -> Result<()> {
        for child in node.children()? {
            into.push(child.identifier());
            Self::descendants(&child, into)?;
        }
        Ok(())
    }
}

impl Listener<MoveEvent> for GeneralSubscriber {
    fn handle(&self, event: &mut MoveEvent, context: &ManagerContext) -> Result<()> {
        let node = context.registry().get_node_for_document(&event.document)?;
        context.node_helper().move_node(
            &node,
            &event.destination_id,
            event.destination_name.as_deref(),
        )?;

        if !event.document.is_initialized() {
            return Ok(());
        }
        MappingSubscriber::sync_structure(context, &event.document)?;
        let metadata = context
            .metadata_factory()
            .get_metadata_for_class(event.document.class())?;
        if metadata.has_behavior(Behavior::Parent) {
            let parent = match node.parent()? {
                Some(parent_node) => Some(context.proxy_factory().create_proxy_for_node(
                    &event.document,
                    &parent_node,
                    &Options::default(),
                )?),
                None => None,
            };
            event.document.set_parent(parent)?;
        }
        Ok(())
    }
}

impl Listener<CopyEvent> for GeneralSubscriber {
    fn handle(&self, event: &mut CopyEvent, context: &ManagerContext) -> Result<()> {
        let node = context.registry().get_node_for_document(&event.document)?;
        let copied_path = context.node_helper().copy(
            &node,
            &event.destination_id,
            event.destination_name.as_deref(),
        )?;
        event.copied_path = Some(copied_path);
        Ok(())
    }
}

impl Listener<ReorderEvent> for GeneralSubscriber {
    fn handle(&self, event: &mut ReorderEvent, context: &ManagerContext) -> Result<()> {
        let node = context.registry().get_node_for_document(&event.document)?;
        context
            .node_helper()
            .reorder(&node, event.destination_id.as_deref())
    }
}

/// Removes the node with its subtree. Documents of removed descendants leave the identity
/// map here; the document itself is deregistered by the registrator.
impl Listener<RemoveEvent> for GeneralSubscriber {
    fn handle(&self, event: &mut RemoveEvent, context: &ManagerContext) -> Result<()> {
        let node = context.registry().get_node_for_document(&event.document)?;
        let mut descendants = Vec::new();
        Self::descendants(&node, &mut descendants)?;
        context
            .node_manager()
            .remove(&node.identifier().to_string())?;

        let mut registry = context.registry();
        for id in descendants {
            if let Ok(document) = registry.get_document_for_node_id(&id) {
                registry.deregister_document(&document)?;
            }
        }
        Ok(())
    }
}

/// Reloads the document from its node in the locale it was requested in, dropping unsaved
/// changes to its fields.
impl Listener<RefreshEvent> for GeneralSubscriber {
    fn handle(&self, event: &mut RefreshEvent, context: &ManagerContext) -> Result<()> {
        let (node, locale) = {
            let registry = context.registry();
            (
                registry.get_node_for_document(&event.document)?,
                registry.get_original_locale_for_document(&event.document)?,
            )
        };
        context.hydrate(
            Some(&event.document),
            &node,
            &locale,
            &Options::default().with_rehydrate(true),
        )?;
        Ok(())
    }
}

impl Listener<FlushEvent> for GeneralSubscriber {
    fn handle(&self, _event: &mut FlushEvent, context: &ManagerContext) -> Result<()> {
        context.node_manager().save()
    }
}

impl Listener<ClearEvent> for GeneralSubscriber {
    fn handle(&self, _event: &mut ClearEvent, context: &ManagerContext) -> Result<()> {
        context.node_manager().clear()
    }
}
