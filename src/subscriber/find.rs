use crate::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    event::{FindEvent, Listener},
    storage::StorageError,
};

/// Resolves the identifier of a find to a node and hydrates it. The `type` option restricts
/// the result to one alias or class.
#[derive(Debug, Default)]
pub struct FindSubscriber;

impl FindSubscriber {
    fn check_type(
        context: &ManagerContext,
        document: &Document,
        alias_or_class: &str,
        identifier: &str,
    ) -> Result<()> {
        let factory = context.metadata_factory();
        let metadata = if factory.has_alias(alias_or_class) {
            factory.get_metadata_for_alias(alias_or_class)?
        } else if factory.has_metadata_for_class(alias_or_class) {
            factory.get_metadata_for_class(alias_or_class)?
        } else {
            return Err(DocumentManagerError::MetadataNotFound {
                axis: "alias or class",
                key: alias_or_class.to_string(),
                known: factory.aliases(),
            });
        };
        if metadata.class() != document.class() {
            return Err(DocumentManagerError::DocumentNotFound {
                identifier: identifier.to_string(),
                source: StorageError::ItemNotFound(format!(
                    "requested a document of type \"{}\" but got \"{}\"",
                    metadata.class(),
                    document.class()
                )),
            });
        }
        Ok(())
    }
}

impl Listener<FindEvent> for FindSubscriber {
    fn handle(&self, event: &mut FindEvent, context: &ManagerContext) -> Result<()> {
        let node = context.node_manager().find(&event.identifier)?;
        tracing::debug!("[Find] \"{}\" resolved to {node}", event.identifier);
        let document = context.hydrate(None, &node, &event.locale, &event.options)?;
        if let Some(alias_or_class) = event.options.type_filter.as_deref() {
            Self::check_type(context, &document, alias_or_class, &event.identifier)?;
        }
        event.set_document(document);
        Ok(())
    }
}
