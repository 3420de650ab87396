use crate::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    event::{CopyEvent, Listener, MoveEvent, PersistEvent},
    metadata::Behavior,
    paths::slugify,
};

use super::create_node;

pub const TITLE_FIELD: &str = "title";

/// Names the nodes of documents with the `auto_name` behavior after their slugified title.
///
/// A new document gets a node below the parent node established by earlier listeners. An
/// existing node is renamed when the title changed, but only when persisting in the default
/// locale (or any locale when none is configured), so translated titles do not fight over
/// the name. Explicit `path`/`node_name` options win over the title.
///
/// Moves and copies of such documents get a destination name that is free below the
/// destination, so a page copied next to itself lands at `name-1`.
#[derive(Debug, Default)]
pub struct AutoNameSubscriber;

impl AutoNameSubscriber {
    fn destination_name(
        context: &ManagerContext,
        document: &Document,
        destination_id: &str,
    ) -> Result<Option<String>> {
        let metadata = context
            .metadata_factory()
            .get_metadata_for_class(document.class())?;
        if !metadata.has_behavior(Behavior::AutoName) {
            return Ok(None);
        }
        let node = context.registry().get_node_for_document(document)?;
        let destination = context.node_manager().find(destination_id)?;
        let name = context
            .name_resolver()
            .resolve_name(&destination, &node.name()?, None, true)?;
        Ok(Some(name))
    }
}

impl Listener<MoveEvent> for AutoNameSubscriber {
    fn handle(&self, event: &mut MoveEvent, context: &ManagerContext) -> Result<()> {
        if event.destination_name.is_none() {
            event.destination_name =
                Self::destination_name(context, &event.document, &event.destination_id)?;
        }
        Ok(())
    }
}

impl Listener<CopyEvent> for AutoNameSubscriber {
    fn handle(&self, event: &mut CopyEvent, context: &ManagerContext) -> Result<()> {
        if event.destination_name.is_none() {
            event.destination_name =
                Self::destination_name(context, &event.document, &event.destination_id)?;
        }
        Ok(())
    }
}

impl Listener<PersistEvent> for AutoNameSubscriber {
    fn handle(&self, event: &mut PersistEvent, context: &ManagerContext) -> Result<()> {
        let metadata = context
            .metadata_factory()
            .get_metadata_for_class(event.document.class())?;
        if !metadata.has_behavior(Behavior::AutoName)
            || event.options.node_name.is_some()
            || event.options.path.is_some()
        {
            return Ok(());
        }
        let title = event.document.get_string(TITLE_FIELD)?.ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "{} has no title, which the auto name behavior requires",
                event.document
            ))
        })?;
        let name = slugify(&title);
        if name.is_empty() {
            return Err(DocumentManagerError::structural(format!(
                "{} has a title without any characters usable in a node name, which the auto name behavior requires",
                event.document
            )));
        }
        let auto_rename = event.options.auto_rename;

        let Some(node) = event.node.clone() else {
            let parent = event.parent_node.clone().ok_or_else(|| {
                DocumentManagerError::structural(format!(
                    "No parent node has been established for {}; set a parent document or the \"parent_path\" option",
                    event.document
                ))
            })?;
            let name = context
                .name_resolver()
                .resolve_name(&parent, &name, None, auto_rename)?;
            event.node = Some(create_node(context, &parent, &name, &event.document)?);
            return Ok(());
        };

        if context
            .default_locale()
            .is_some_and(|default| default != event.locale)
        {
            return Ok(());
        }
        let Some(parent) = node.parent()? else {
            return Ok(());
        };
        let resolved = context
            .name_resolver()
            .resolve_name(&parent, &name, Some(&node), auto_rename)?;
        if resolved != node.name()? {
            tracing::debug!("[AutoName] renaming {node} to \"{resolved}\"");
            context
                .node_helper()
                .move_node(&node, &parent.path()?, Some(&resolved))?;
        }
        Ok(())
    }
}
