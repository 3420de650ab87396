use crate::{
    context::ManagerContext,
    document::{Document, DocumentData},
    error::Result,
    event::{ClearEvent, CreateEvent, Event, HydrateEvent, Listener, PersistEvent, RemoveEvent},
    metadata::Metadata,
};

/// First listener of the hydrate and persist chains: connects the event with what the
/// identity map already knows.
///
/// On hydrate, a node that already has a live document yields that document. When it was
/// requested in the same locale and no rehydration is asked for, nothing else needs to run
/// and the chain stops here.
#[derive(Debug, Default)]
pub struct RegistryLookupSubscriber;

impl Listener<HydrateEvent> for RegistryLookupSubscriber {
    fn handle(&self, event: &mut HydrateEvent, context: &ManagerContext) -> Result<()> {
        if event.has_document() {
            return Ok(());
        }
        let registered = {
            let registry = context.registry();
            if registry.has_node(&event.node) {
                let document = registry.get_document_for_node(&event.node)?;
                let original_locale = registry.get_original_locale_for_document(&document)?;
                Some((document, original_locale))
            } else {
                None
            }
        };
        let Some((document, original_locale)) = registered else {
            return Ok(());
        };

        event.set_document(document.clone());
        if !event.options.rehydrate && original_locale == event.original_locale {
            tracing::trace!("[RegistryLookup] {document} already loaded in \"{original_locale}\"");
            event.stop_propagation();
        } else {
            tracing::debug!(
                "[RegistryLookup] rehydrating {document} from \"{original_locale}\" to \"{}\"",
                event.original_locale
            );
            document.supersede_pending();
        }
        Ok(())
    }
}

impl Listener<PersistEvent> for RegistryLookupSubscriber {
    fn handle(&self, event: &mut PersistEvent, context: &ManagerContext) -> Result<()> {
        let registry = context.registry();
        if registry.has_document(&event.document) {
            event.node = Some(registry.get_node_for_document(&event.document)?);
        }
        Ok(())
    }
}

/// Creates document instances: unmanaged ones for `create`, and ones matching the node's
/// storage type for hydration when no document is known yet.
#[derive(Debug, Default)]
pub struct InstantiatorSubscriber;

impl InstantiatorSubscriber {
    fn instantiate(metadata: &Metadata) -> Document {
        let mut data = DocumentData::default();
        for (field, mapping) in metadata.field_mappings() {
            if let Some(default) = &mapping.default {
                data.set(field.clone(), default.clone());
            }
        }
        Document::with_data(metadata.class(), data)
    }
}

impl Listener<CreateEvent> for InstantiatorSubscriber {
    fn handle(&self, event: &mut CreateEvent, context: &ManagerContext) -> Result<()> {
        let metadata = context
            .metadata_factory()
            .get_metadata_for_alias(&event.alias)?;
        event.set_document(Self::instantiate(&metadata));
        Ok(())
    }
}

impl Listener<HydrateEvent> for InstantiatorSubscriber {
    fn handle(&self, event: &mut HydrateEvent, context: &ManagerContext) -> Result<()> {
        if event.has_document() {
            return Ok(());
        }
        let metadata = context
            .metadata_factory()
            .get_metadata_for_phpcr_node(&event.node)?;
        event.set_document(Self::instantiate(&metadata));
        Ok(())
    }
}

/// Keeps the identity map in step with the outcome of hydrate, persist, remove and clear.
#[derive(Debug, Default)]
pub struct RegistratorSubscriber;

impl Listener<HydrateEvent> for RegistratorSubscriber {
    fn handle(&self, event: &mut HydrateEvent, context: &ManagerContext) -> Result<()> {
        let document = event.get_document()?;
        let mut registry = context.registry();
        let current = registry.get_node_for_document(&document).ok();
        if current.as_ref() != Some(&event.node) {
            registry.register_document(&document, &event.node, &event.locale);
        }
        registry.update_locale(&document, &event.locale, Some(&event.original_locale))
    }
}

impl Listener<PersistEvent> for RegistratorSubscriber {
    fn handle(&self, event: &mut PersistEvent, context: &ManagerContext) -> Result<()> {
        let node = event.get_node()?;
        let mut registry = context.registry();
        let current = registry.get_node_for_document(&event.document).ok();
        if current.as_ref() != Some(&node) {
            registry.register_document(&event.document, &node, &event.locale);
        }
        registry.update_locale(&event.document, &event.locale, Some(&event.locale))
    }
}

impl Listener<RemoveEvent> for RegistratorSubscriber {
    fn handle(&self, event: &mut RemoveEvent, context: &ManagerContext) -> Result<()> {
        context.registry().deregister_document(&event.document)
    }
}

impl Listener<ClearEvent> for RegistratorSubscriber {
    fn handle(&self, _event: &mut ClearEvent, context: &ManagerContext) -> Result<()> {
        context.registry().clear();
        Ok(())
    }
}
