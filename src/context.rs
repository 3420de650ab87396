//! Shared state of one document manager: the collaborators every listener needs plus the
//! identity map of the current unit of work.

use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};

use crate::{
    config::DocumentManagerConfig,
    document::Document,
    encoder::PropertyEncoder,
    error::Result,
    event::{Event, EventDispatcher, HydrateEvent},
    inspector::DocumentInspector,
    metadata::MetadataFactory,
    node::{NameResolver, NodeHelper, NodeManager},
    options::Options,
    paths::{NamespaceRegistry, PathBuilder, PathSegmentRegistry},
    proxy::ProxyFactory,
    registry::DocumentRegistry,
    storage::{Node, Session},
};

/// Listeners receive the context with every event. Lazy documents and collections keep a
/// weak reference to it, so they stop working (with `Detached`) once the manager is gone.
///
/// The registry lock is never held while an event is dispatched; listeners take it for the
/// duration of one registry call at a time.
pub struct ManagerContext {
    this: Weak<ManagerContext>,
    registry: Mutex<DocumentRegistry>,
    node_manager: NodeManager,
    node_helper: NodeHelper,
    name_resolver: NameResolver,
    metadata_factory: MetadataFactory,
    encoder: PropertyEncoder,
    path_builder: PathBuilder,
    dispatcher: EventDispatcher,
    default_locale: Option<String>,
}

impl ManagerContext {
    pub fn new(
        session: Arc<dyn Session>,
        config: &DocumentManagerConfig,
        dispatcher: EventDispatcher,
    ) -> Result<Arc<Self>> {
        let metadata_factory = MetadataFactory::new(config.mapping.iter().cloned())?;
        let encoder = PropertyEncoder::new(NamespaceRegistry::new(config.namespaces.clone()));
        let path_builder =
            PathBuilder::new(PathSegmentRegistry::new(config.path_segments.clone()));
        Ok(Arc::new_cyclic(|this| ManagerContext {
            this: this.clone(),
            registry: Mutex::new(DocumentRegistry::new()),
            node_manager: NodeManager::new(session),
            node_helper: NodeHelper::new(),
            name_resolver: NameResolver::new(),
            metadata_factory,
            encoder,
            path_builder,
            dispatcher,
            default_locale: config.default_locale.clone(),
        }))
    }

    pub fn weak(&self) -> Weak<ManagerContext> {
        self.this.clone()
    }

    /// Lock the identity map. Release the guard before dispatching events or touching
    /// documents that may still need to load.
    pub fn registry(&self) -> MutexGuard<'_, DocumentRegistry> {
        self.registry.lock()
    }

    pub fn node_manager(&self) -> &NodeManager {
        &self.node_manager
    }

    pub fn node_helper(&self) -> &NodeHelper {
        &self.node_helper
    }

    pub fn name_resolver(&self) -> &NameResolver {
        &self.name_resolver
    }

    pub fn metadata_factory(&self) -> &MetadataFactory {
        &self.metadata_factory
    }

    pub fn encoder(&self) -> &PropertyEncoder {
        &self.encoder
    }

    pub fn path_builder(&self) -> &PathBuilder {
        &self.path_builder
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    pub fn proxy_factory(&self) -> ProxyFactory<'_> {
        ProxyFactory::new(self)
    }

    pub fn inspector(&self) -> DocumentInspector<'_> {
        DocumentInspector::new(self)
    }

    pub fn dispatch<E: Event>(&self, event: &mut E) -> Result<()> {
        self.dispatcher.dispatch(event, self)
    }

    /// Dispatch a hydrate event for `node` in `locale` and return the document the listeners
    /// settled on. A given `document` is hydrated in place; any lazy load it still had
    /// pending is dropped in favour of this one.
    pub fn hydrate(
        &self,
        document: Option<&Document>,
        node: &Node,
        locale: &str,
        options: &Options,
    ) -> Result<Document> {
        let mut event = HydrateEvent::new(node.clone(), locale, options.clone());
        if let Some(document) = document {
            document.supersede_pending();
            event.set_document(document.clone());
        }
        self.dispatch(&mut event)?;
        event.get_document()
    }
}

impl std::fmt::Debug for ManagerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerContext")
            .field("managed", &self.registry.try_lock().map(|registry| registry.len()))
            .field("dispatcher", &self.dispatcher)
            .field("default_locale", &self.default_locale)
            .finish()
    }
}
