//! The lifecycle event vocabulary and the typed listener chains that carry it.
//!
//! Every public manager operation is an event object handed down a chain of [`Listener`]s.
//! Listeners mutate the event in place (attach a document, a node, a query...) and the caller
//! reads the outcome back off the event once the chain has run. Each event kind has its own
//! chain; a listener for several kinds implements [`Listener`] once per kind.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use crate::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    options::{Options, OptionsResolver},
    query::{Query, QueryBuilder},
    storage::Node,
};

pub trait Event: 'static {
    /// Name used in logs and as the options-resolver key.
    const NAME: &'static str;

    fn is_propagation_stopped(&self) -> bool;

    /// Skip the remaining listeners of the chain.
    fn stop_propagation(&mut self);
}

pub trait Listener<E: Event>: Send + Sync {
    fn handle(&self, event: &mut E, context: &ManagerContext) -> Result<()>;
}

impl<E, F> Listener<E> for F
where
    E: Event,
    F: Fn(&mut E, &ManagerContext) -> Result<()> + Send + Sync,
{
    fn handle(&self, event: &mut E, context: &ManagerContext) -> Result<()> {
        self(event, context)
    }
}

type Chain<E> = Vec<Arc<dyn Listener<E>>>;

/// One ordered listener chain per event kind, fixed once the manager is built.
#[derive(Default)]
pub struct EventDispatcher {
    chains: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher::default()
    }

    /// Append `listener` to the chain for `E`.
    pub fn add_listener<E: Event>(&mut self, listener: Arc<dyn Listener<E>>) {
        let chain = self
            .chains
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Chain::<E>::new()));
        if let Some(chain) = chain.downcast_mut::<Chain<E>>() {
            chain.push(listener);
        }
    }

    fn chain<E: Event>(&self) -> Option<&Chain<E>> {
        self.chains
            .get(&TypeId::of::<E>())
            .and_then(|chain| chain.downcast_ref::<Chain<E>>())
    }

    pub fn listener_count<E: Event>(&self) -> usize {
        self.chain::<E>().map_or(0, Vec::len)
    }

    /// Run the chain for `E` in registration order until it ends, a listener fails or the
    /// event stops propagation.
    pub fn dispatch<E: Event>(&self, event: &mut E, context: &ManagerContext) -> Result<()> {
        let Some(chain) = self.chain::<E>() else {
            tracing::trace!("[EventDispatcher] no listeners for {}", E::NAME);
            return Ok(());
        };
        tracing::trace!("[EventDispatcher] dispatching {} to {} listeners", E::NAME, chain.len());
        for (idx, listener) in chain.iter().enumerate() {
            if event.is_propagation_stopped() {
                tracing::trace!("[EventDispatcher] {} stopped after listener {idx}", E::NAME);
                break;
            }
            listener.handle(event, context)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("chains", &self.chains.len())
            .finish()
    }
}

macro_rules! impl_event {
    ($event:ty, $name:literal) => {
        impl Event for $event {
            const NAME: &'static str = $name;

            fn is_propagation_stopped(&self) -> bool {
                self.stopped
            }

            fn stop_propagation(&mut self) {
                self.stopped = true;
            }
        }
    };
}

/// Accessors for events whose outcome is a document a listener attaches.
macro_rules! document_slot {
    ($event:ty) => {
        impl $event {
            pub fn has_document(&self) -> bool {
                self.document.is_some()
            }

            /// The attached document; fails when no listener attached one.
            pub fn get_document(&self) -> Result<Document> {
                self.document.clone().ok_or_else(|| {
                    DocumentManagerError::structural(format!(
                        "No document has been set on the {} event",
                        <$event as Event>::NAME
                    ))
                })
            }

            pub fn set_document(&mut self, document: Document) {
                self.document = Some(document);
            }
        }
    };
}

#[derive(Debug)]
pub struct FindEvent {
    pub identifier: String,
    pub locale: String,
    pub options: Options,
    document: Option<Document>,
    stopped: bool,
}

impl FindEvent {
    pub fn new<I: Into<String>, L: Into<String>>(identifier: I, locale: L, options: Options) -> Self {
        FindEvent {
            identifier: identifier.into(),
            locale: locale.into(),
            options,
            document: None,
            stopped: false,
        }
    }
}

impl_event!(FindEvent, "find");
document_slot!(FindEvent);

#[derive(Debug)]
pub struct CreateEvent {
    pub alias: String,
    pub options: Options,
    document: Option<Document>,
    stopped: bool,
}

impl CreateEvent {
    pub fn new<A: Into<String>>(alias: A, options: Options) -> Self {
        CreateEvent {
            alias: alias.into(),
            options,
            document: None,
            stopped: false,
        }
    }
}

impl_event!(CreateEvent, "create");
document_slot!(CreateEvent);

/// Fill a document with the state of `node` in `locale`.
///
/// `original_locale` is the locale the caller asked for. Listeners may switch `locale` to a
/// fallback when the node holds no content in the requested one.
#[derive(Debug)]
pub struct HydrateEvent {
    pub node: Node,
    pub locale: String,
    pub original_locale: String,
    pub options: Options,
    document: Option<Document>,
    stopped: bool,
}

impl HydrateEvent {
    pub fn new<L: Into<String>>(node: Node, locale: L, options: Options) -> Self {
        let locale = locale.into();
        HydrateEvent {
            node,
            original_locale: locale.clone(),
            locale,
            options,
            document: None,
            stopped: false,
        }
    }
}

impl_event!(HydrateEvent, "hydrate");
document_slot!(HydrateEvent);

/// Write a document to its node. `node` starts as the registered node, if any; listeners
/// that create or resolve the node set it.
#[derive(Debug)]
pub struct PersistEvent {
    pub document: Document,
    pub locale: String,
    pub options: Options,
    pub node: Option<Node>,
    pub parent_node: Option<Node>,
    stopped: bool,
}

impl PersistEvent {
    pub fn new<L: Into<String>>(document: Document, locale: L, options: Options) -> Self {
        PersistEvent {
            document,
            locale: locale.into(),
            options,
            node: None,
            parent_node: None,
            stopped: false,
        }
    }

    pub fn get_node(&self) -> Result<Node> {
        self.node.clone().ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "No node has been set on the persist event for {}",
                self.document
            ))
        })
    }
}

impl_event!(PersistEvent, "persist");

#[derive(Debug)]
pub struct RemoveEvent {
    pub document: Document,
    pub options: Options,
    stopped: bool,
}

impl RemoveEvent {
    pub fn new(document: Document, options: Options) -> Self {
        RemoveEvent {
            document,
            options,
            stopped: false,
        }
    }
}

impl_event!(RemoveEvent, "remove");

#[derive(Debug)]
pub struct RemoveLocaleEvent {
    pub document: Document,
    pub locale: String,
    pub options: Options,
    stopped: bool,
}

impl RemoveLocaleEvent {
    pub fn new<L: Into<String>>(document: Document, locale: L, options: Options) -> Self {
        RemoveLocaleEvent {
            document,
            locale: locale.into(),
            options,
            stopped: false,
        }
    }
}

impl_event!(RemoveLocaleEvent, "remove_locale");

#[derive(Debug)]
pub struct MoveEvent {
    pub document: Document,
    /// UUID or path of the new parent.
    pub destination_id: String,
    pub destination_name: Option<String>,
    stopped: bool,
}

impl MoveEvent {
    pub fn new<D: Into<String>>(document: Document, destination_id: D) -> Self {
        MoveEvent {
            document,
            destination_id: destination_id.into(),
            destination_name: None,
            stopped: false,
        }
    }
}

impl_event!(MoveEvent, "move");

#[derive(Debug)]
pub struct CopyEvent {
    pub document: Document,
    pub destination_id: String,
    pub destination_name: Option<String>,
    pub copied_path: Option<String>,
    stopped: bool,
}

impl CopyEvent {
    pub fn new<D: Into<String>>(document: Document, destination_id: D) -> Self {
        CopyEvent {
            document,
            destination_id: destination_id.into(),
            destination_name: None,
            copied_path: None,
            stopped: false,
        }
    }

    pub fn get_copied_path(&self) -> Result<String> {
        self.copied_path.clone().ok_or_else(|| {
            DocumentManagerError::structural(format!("{} has not been copied", self.document))
        })
    }
}

impl_event!(CopyEvent, "copy");

#[derive(Debug)]
pub struct ReorderEvent {
    pub document: Document,
    /// Sibling to place the document before; `None` moves it last.
    pub destination_id: Option<String>,
    stopped: bool,
}

impl ReorderEvent {
    pub fn new(document: Document, destination_id: Option<String>) -> Self {
        ReorderEvent {
            document,
            destination_id,
            stopped: false,
        }
    }
}

impl_event!(ReorderEvent, "reorder");

#[derive(Debug)]
pub struct RefreshEvent {
    pub document: Document,
    stopped: bool,
}

impl RefreshEvent {
    pub fn new(document: Document) -> Self {
        RefreshEvent {
            document,
            stopped: false,
        }
    }
}

impl_event!(RefreshEvent, "refresh");

#[derive(Debug, Default)]
pub struct FlushEvent {
    stopped: bool,
}

impl FlushEvent {
    pub fn new() -> Self {
        FlushEvent::default()
    }
}

impl_event!(FlushEvent, "flush");

#[derive(Debug, Default)]
pub struct ClearEvent {
    stopped: bool,
}

impl ClearEvent {
    pub fn new() -> Self {
        ClearEvent::default()
    }
}

impl_event!(ClearEvent, "clear");

/// Lets listeners declare the extra options they accept for the event named `event_name`.
#[derive(Debug)]
pub struct ConfigureOptionsEvent {
    pub event_name: &'static str,
    pub resolver: OptionsResolver,
    stopped: bool,
}

impl ConfigureOptionsEvent {
    pub fn new(event_name: &'static str) -> Self {
        ConfigureOptionsEvent {
            event_name,
            resolver: OptionsResolver::new(),
            stopped: false,
        }
    }
}

impl_event!(ConfigureOptionsEvent, "configure_options");

#[derive(Debug)]
pub struct QueryCreateEvent {
    pub statement: String,
    pub locale: Option<String>,
    pub options: Options,
    pub query: Option<Query>,
    stopped: bool,
}

impl QueryCreateEvent {
    pub fn new<S: Into<String>>(statement: S, locale: Option<String>, options: Options) -> Self {
        QueryCreateEvent {
            statement: statement.into(),
            locale,
            options,
            query: None,
            stopped: false,
        }
    }

    pub fn get_query(&self) -> Result<Query> {
        self.query.clone().ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "No query has been set for statement \"{}\"",
                self.statement
            ))
        })
    }
}

impl_event!(QueryCreateEvent, "query_create");

#[derive(Default)]
pub struct QueryCreateBuilderEvent {
    pub builder: Option<Box<dyn QueryBuilder>>,
    stopped: bool,
}

impl QueryCreateBuilderEvent {
    pub fn new() -> Self {
        QueryCreateBuilderEvent::default()
    }

    pub fn take_builder(&mut self) -> Result<Box<dyn QueryBuilder>> {
        self.builder.take().ok_or_else(|| {
            DocumentManagerError::structural("No query builder has been set".to_string())
        })
    }
}

impl std::fmt::Debug for QueryCreateBuilderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCreateBuilderEvent")
            .field("has_builder", &self.builder.is_some())
            .finish()
    }
}

impl_event!(QueryCreateBuilderEvent, "query_create_builder");

#[derive(Debug)]
pub struct QueryExecuteEvent {
    pub query: Query,
    pub result: Option<Vec<Document>>,
    stopped: bool,
}

impl QueryExecuteEvent {
    pub fn new(query: Query) -> Self {
        QueryExecuteEvent {
            query,
            result: None,
            stopped: false,
        }
    }

    pub fn take_result(&mut self) -> Result<Vec<Document>> {
        self.result.take().ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "No result has been set for query \"{}\"",
                self.query.statement()
            ))
        })
    }
}

impl_event!(QueryExecuteEvent, "query_execute");
