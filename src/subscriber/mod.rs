//! The core listeners that give the event vocabulary its default meaning.
//!
//! [`register_core_subscribers`] installs them in a fixed order per event kind. Listeners
//! added after them see events the core has already handled: hydrated documents are
//! registered and filled, persisted documents have their node.

mod autoname;
mod explicit;
mod find;
mod general;
mod locale;
mod mapping;
mod parent;
mod registrator;

use std::sync::Arc;

pub use autoname::AutoNameSubscriber;
pub use explicit::ExplicitSubscriber;
pub use find::FindSubscriber;
pub use general::GeneralSubscriber;
pub use locale::{available_locales, LocaleSubscriber, LOCALE_MARKER};
pub use mapping::{MappingSubscriber, VERSIONS_PROPERTY};
pub use parent::ParentSubscriber;
pub use registrator::{InstantiatorSubscriber, RegistratorSubscriber, RegistryLookupSubscriber};

use crate::{
    context::ManagerContext,
    document::Document,
    error::Result,
    event::{
        ClearEvent, CopyEvent, CreateEvent, EventDispatcher, FindEvent, FlushEvent, HydrateEvent,
        MoveEvent, PersistEvent, RefreshEvent, RemoveEvent, RemoveLocaleEvent, ReorderEvent,
    },
    storage::Node,
};

pub fn register_core_subscribers(dispatcher: &mut EventDispatcher) {
    let lookup = Arc::new(RegistryLookupSubscriber);
    let instantiator = Arc::new(InstantiatorSubscriber);
    let registrator = Arc::new(RegistratorSubscriber);
    let find = Arc::new(FindSubscriber);
    let explicit = Arc::new(ExplicitSubscriber);
    let parent = Arc::new(ParentSubscriber);
    let autoname = Arc::new(AutoNameSubscriber);
    let locale = Arc::new(LocaleSubscriber);
    let mapping = Arc::new(MappingSubscriber);
    let general = Arc::new(GeneralSubscriber);

    dispatcher.add_listener::<HydrateEvent>(lookup.clone());
    dispatcher.add_listener::<HydrateEvent>(instantiator.clone());
    dispatcher.add_listener::<HydrateEvent>(locale);
    dispatcher.add_listener::<HydrateEvent>(registrator.clone());
    dispatcher.add_listener::<HydrateEvent>(parent.clone());
    dispatcher.add_listener::<HydrateEvent>(mapping.clone());

    dispatcher.add_listener::<CreateEvent>(instantiator);
    dispatcher.add_listener::<FindEvent>(find);

    dispatcher.add_listener::<PersistEvent>(lookup);
    dispatcher.add_listener::<PersistEvent>(explicit);
    dispatcher.add_listener::<PersistEvent>(parent);
    dispatcher.add_listener::<PersistEvent>(autoname.clone());
    dispatcher.add_listener::<PersistEvent>(mapping.clone());
    dispatcher.add_listener::<PersistEvent>(registrator.clone());

    dispatcher.add_listener::<RemoveEvent>(general.clone());
    dispatcher.add_listener::<RemoveEvent>(registrator.clone());
    dispatcher.add_listener::<RemoveLocaleEvent>(mapping);

    dispatcher.add_listener::<MoveEvent>(autoname.clone());
    dispatcher.add_listener::<MoveEvent>(general.clone());
    dispatcher.add_listener::<CopyEvent>(autoname);
    dispatcher.add_listener::<CopyEvent>(general.clone());
    dispatcher.add_listener::<ReorderEvent>(general.clone());
    dispatcher.add_listener::<RefreshEvent>(general.clone());
    dispatcher.add_listener::<FlushEvent>(general.clone());
    dispatcher.add_listener::<ClearEvent>(general);
    dispatcher.add_listener::<ClearEvent>(registrator);
}

/// Add a child `name` below `parent` for `document`, tagged with the storage type of the
/// document's class.
pub(crate) fn create_node(
    context: &ManagerContext,
    parent: &Node,
    name: &str,
    document: &Document,
) -> Result<Node> {
    let node = parent.add_node(name)?;
    let metadata = context
        .metadata_factory()
        .get_metadata_for_class(document.class())?;
    if let Some(phpcr_type) = metadata.phpcr_type() {
        node.add_mixin(phpcr_type)?;
    }
    tracing::debug!("[Subscriber] created {node} for {document}");
    Ok(node)
}
