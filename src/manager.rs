//! The public facade.
//!
//! Every operation builds its event, resolves the caller's options against what the
//! listeners declared, dispatches, and returns what the listeners left on the event. The
//! facade holds no persistence logic of its own; with no listeners installed it does nothing.

use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

use crate::{
    config::DocumentManagerConfig,
    context::ManagerContext,
    document::Document,
    error::Result,
    event::{
        ClearEvent, ConfigureOptionsEvent, CopyEvent, CreateEvent, Event, EventDispatcher,
        FindEvent, FlushEvent, Listener, MoveEvent, PersistEvent, QueryCreateBuilderEvent,
        QueryCreateEvent, RefreshEvent, RemoveEvent, RemoveLocaleEvent, ReorderEvent,
    },
    inspector::DocumentInspector,
    options::{Options, OptionsResolver},
    query::{Query, QueryBuilder},
    storage::Session,
    subscriber::register_core_subscribers,
};

pub struct DocumentManager {
    context: Arc<ManagerContext>,
    resolvers: Mutex<HashMap<&'static str, OptionsResolver>>,
}

impl DocumentManager {
    /// A manager with the core subscribers over `session`.
    pub fn new(session: Arc<dyn Session>, config: DocumentManagerConfig) -> Result<Self> {
        DocumentManagerBuilder::new(session)
            .config(config)
            .with_core_subscribers()
            .build()
    }

    pub fn builder(session: Arc<dyn Session>) -> DocumentManagerBuilder {
        DocumentManagerBuilder::new(session)
    }

    pub fn context(&self) -> &Arc<ManagerContext> {
        &self.context
    }

    pub fn inspector(&self) -> DocumentInspector<'_> {
        self.context.inspector()
    }

    /// Validate `options` for events of kind `E`. The first call per kind asks the listeners
    /// which extra options they accept.
    fn resolve_options<E: Event>(&self, options: Options) -> Result<Options> {
        let cached = self.resolvers.lock().get(E::NAME).cloned();
        let resolver = match cached {
            Some(resolver) => resolver,
            None => {
                let mut event = ConfigureOptionsEvent::new(E::NAME);
                self.context.dispatch(&mut event)?;
                self.resolvers
                    .lock()
                    .insert(E::NAME, event.resolver.clone());
                event.resolver
            }
        };
        resolver.resolve(options)
    }

    /// Find the document for a UUID or path, loaded in `locale`.
    pub fn find(&self, identifier: &str, locale: &str, options: Options) -> Result<Document> {
        let options = self.resolve_options::<FindEvent>(options)?;
        tracing::debug!("[DocumentManager] find \"{identifier}\" in \"{locale}\"");
        let mut event = FindEvent::new(identifier, locale, options);
        self.context.dispatch(&mut event)?;
        event.get_document()
    }

    /// A new, unmanaged document of the class mapped to `alias`.
    pub fn create(&self, alias: &str) -> Result<Document> {
        let options = self.resolve_options::<CreateEvent>(Options::default())?;
        let mut event = CreateEvent::new(alias, options);
        self.context.dispatch(&mut event)?;
        event.get_document()
    }

    pub fn persist(&self, document: &Document, locale: &str, options: Options) -> Result<()> {
        let options = self.resolve_options::<PersistEvent>(options)?;
        tracing::debug!("[DocumentManager] persist {document} in \"{locale}\"");
        let mut event = PersistEvent::new(document.clone(), locale, options);
        self.context.dispatch(&mut event)
    }

    pub fn remove(&self, document: &Document) -> Result<()> {
        let options = self.resolve_options::<RemoveEvent>(Options::default())?;
        tracing::debug!("[DocumentManager] remove {document}");
        let mut event = RemoveEvent::new(document.clone(), options);
        self.context.dispatch(&mut event)
    }

    pub fn remove_locale(&self, document: &Document, locale: &str) -> Result<()> {
        let options = self.resolve_options::<RemoveLocaleEvent>(Options::default())?;
        let mut event = RemoveLocaleEvent::new(document.clone(), locale, options);
        self.context.dispatch(&mut event)
    }

    /// Move `document` below the node identified by `destination_id` (UUID or path).
    pub fn move_document(&self, document: &Document, destination_id: &str) -> Result<()> {
        tracing::debug!("[DocumentManager] move {document} to \"{destination_id}\"");
        let mut event = MoveEvent::new(document.clone(), destination_id);
        self.context.dispatch(&mut event)
    }

    /// Copy `document` below `destination_id`, returning the path of the copy.
    pub fn copy(&self, document: &Document, destination_id: &str) -> Result<String> {
        tracing::debug!("[DocumentManager] copy {document} to \"{destination_id}\"");
        let mut event = CopyEvent::new(document.clone(), destination_id);
        self.context.dispatch(&mut event)?;
        event.get_copied_path()
    }

    /// Place `document` before the sibling `destination_id`, or last when `None`.
    pub fn reorder(&self, document: &Document, destination_id: Option<&str>) -> Result<()> {
        let mut event = ReorderEvent::new(document.clone(), destination_id.map(str::to_string));
        self.context.dispatch(&mut event)
    }

    pub fn refresh(&self, document: &Document) -> Result<()> {
        let mut event = RefreshEvent::new(document.clone());
        self.context.dispatch(&mut event)
    }

    /// Commit pending node changes. Registrations made since the last flush are kept whether
    /// or not the commit succeeds.
    pub fn flush(&self) -> Result<()> {
        tracing::debug!("[DocumentManager] flush");
        self.context.dispatch(&mut FlushEvent::new())
    }

    /// End the unit of work: forget every managed document and discard pending changes.
    pub fn clear(&self) -> Result<()> {
        tracing::debug!("[DocumentManager] clear");
        self.context.dispatch(&mut ClearEvent::new())
    }

    pub fn create_query(
        &self,
        statement: &str,
        locale: Option<&str>,
        options: Options,
    ) -> Result<Query> {
        let options = self.resolve_options::<QueryCreateEvent>(options)?;
        let mut event = QueryCreateEvent::new(statement, locale.map(str::to_string), options);
        self.context.dispatch(&mut event)?;
        event.get_query()
    }

    pub fn create_query_builder(&self) -> Result<Box<dyn QueryBuilder>> {
        let mut event = QueryCreateBuilderEvent::new();
        self.context.dispatch(&mut event)?;
        event.take_builder()
    }
}

impl std::fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentManager")
            .field("context", &self.context)
            .finish()
    }
}

/// Assembles the fixed listener chains of a manager. Listeners run in the order they are
/// added, per event kind; add the core subscribers first to have custom listeners see their
/// results.
pub struct DocumentManagerBuilder {
    session: Arc<dyn Session>,
    config: DocumentManagerConfig,
    dispatcher: EventDispatcher,
}

impl DocumentManagerBuilder {
    pub fn new(session: Arc<dyn Session>) -> Self {
        DocumentManagerBuilder {
            session,
            config: DocumentManagerConfig::default(),
            dispatcher: EventDispatcher::new(),
        }
    }

    pub fn config(mut self, config: DocumentManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_core_subscribers(mut self) -> Self {
        register_core_subscribers(&mut self.dispatcher);
        self
    }

    pub fn listener<E: Event>(mut self, listener: impl Listener<E> + 'static) -> Self {
        self.dispatcher.add_listener::<E>(Arc::new(listener));
        self
    }

    pub fn shared_listener<E: Event>(mut self, listener: Arc<dyn Listener<E>>) -> Self {
        self.dispatcher.add_listener::<E>(listener);
        self
    }

    pub fn build(self) -> Result<DocumentManager> {
        let context = ManagerContext::new(self.session, &self.config, self.dispatcher)?;
        tracing::debug!(
            "[DocumentManager] built with {} mapped aliases",
            context.metadata_factory().aliases().len()
        );
        Ok(DocumentManager {
            context,
            resolvers: Mutex::new(HashMap::new()),
        })
    }
}
