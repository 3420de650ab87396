//! Documents and their lazy-loading state.
//!
//! A [`Document`] is a cheap, cloneable handle; clones share state and identity. Identity is
//! reference identity: two handles are the same document when they point at the same
//! allocation, whatever their field values say.
//!
//! A document is either loaded, holding its [`DocumentData`], or an unloaded placeholder that
//! only remembers the node and locale it stands for. Every data accessor funnels through
//! [`Document::initialize`], which turns a placeholder into a loaded document by dispatching a
//! hydrate event to the manager that created it.

use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    sync::{Arc, Weak},
};

use crate::{
    context::ManagerContext,
    error::{DocumentManagerError, Result},
    options::Options,
    proxy::DocumentCollection,
    storage::{Node, PropertyValue},
    version::Version,
};

pub use crate::metadata::UNKNOWN_DOCUMENT_CLASS;

/// Loaded state of a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentData {
    pub fields: BTreeMap<String, PropertyValue>,
    pub parent: Option<Document>,
    pub children: Option<DocumentCollection>,
    pub versions: Vec<Version>,
}

impl DocumentData {
    pub fn get(&self, field: &str) -> Option<&PropertyValue> {
        self.fields.get(field)
    }

    pub fn set<K: Into<String>, V: Into<PropertyValue>>(&mut self, field: K, value: V) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<PropertyValue> {
        self.fields.remove(field)
    }
}

enum DocumentState {
    Unloaded {
        node: Node,
        locale: String,
        options: Options,
        context: Weak<ManagerContext>,
    },
    Loaded(DocumentData),
}

struct DocumentInner {
    class: String,
    state: Mutex<DocumentState>,
}

#[derive(Clone)]
pub struct Document(Arc<DocumentInner>);

impl Document {
    /// A new, loaded, unmanaged document of `class`.
    pub fn new<S: Into<String>>(class: S) -> Self {
        Self::with_data(class, DocumentData::default())
    }

    pub fn with_data<S: Into<String>>(class: S, data: DocumentData) -> Self {
        Document(Arc::new(DocumentInner {
            class: class.into(),
            state: Mutex::new(DocumentState::Loaded(data)),
        }))
    }

    /// A placeholder for `node` that hydrates in `locale` through `context` on first access.
    pub(crate) fn proxy<S: Into<String>>(
        class: S,
        node: Node,
        locale: &str,
        options: Options,
        context: Weak<ManagerContext>,
    ) -> Self {
        Document(Arc::new(DocumentInner {
            class: class.into(),
            state: Mutex::new(DocumentState::Unloaded {
                node,
                locale: locale.to_string(),
                options,
                context,
            }),
        }))
    }

    pub fn class(&self) -> &str {
        &self.0.class
    }

    /// Identity key: stable for the document's lifetime and unique among live documents.
    pub fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.0.state.lock(), DocumentState::Loaded(_))
    }

    /// Load a placeholder. No-op for loaded documents.
    ///
    /// The state flips to an empty loaded state before the hydrate event goes out, so
    /// listeners that touch the document while hydrating it do not recurse. A failed
    /// hydration leaves whatever the listeners wrote before failing.
    pub fn initialize(&self) -> Result<()> {
        let (node, locale, options, context) = {
            let mut state = self.0.state.lock();
            let DocumentState::Unloaded { context, .. } = &*state else {
                return Ok(());
            };
            let context = context.upgrade().ok_or(DocumentManagerError::Detached)?;
            match std::mem::replace(&mut *state, DocumentState::Loaded(DocumentData::default())) {
                DocumentState::Unloaded {
                    node,
                    locale,
                    options,
                    ..
                } => (node, locale, options, context),
                DocumentState::Loaded(_) => return Ok(()),
            }
        };
        tracing::trace!("[Document] initializing {self} from {node} in \"{locale}\"");
        context.hydrate(Some(self), &node, &locale, &options)?;
        Ok(())
    }

    /// Drop a pending lazy load without performing it; the hydration already in flight for
    /// this document replaces it.
    pub(crate) fn supersede_pending(&self) {
        let mut state = self.0.state.lock();
        if let DocumentState::Unloaded { .. } = &*state {
            *state = DocumentState::Loaded(DocumentData::default());
        }
    }

    /// Run `f` against the loaded data. `f` must not access this same document.
    pub fn read<R, F: FnOnce(&DocumentData) -> R>(&self, f: F) -> Result<R> {
        self.initialize()?;
        match &*self.0.state.lock() {
            DocumentState::Loaded(data) => Ok(f(data)),
            DocumentState::Unloaded { .. } => Err(DocumentManagerError::structural(format!(
                "{self} was unloaded while being read"
            ))),
        }
    }

    /// Run `f` against the mutable loaded data. `f` must not access this same document.
    pub fn write<R, F: FnOnce(&mut DocumentData) -> R>(&self, f: F) -> Result<R> {
        self.initialize()?;
        match &mut *self.0.state.lock() {
            DocumentState::Loaded(data) => Ok(f(data)),
            DocumentState::Unloaded { .. } => Err(DocumentManagerError::structural(format!(
                "{self} was unloaded while being written"
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Result<Option<PropertyValue>> {
        self.read(|data| data.get(field).cloned())
    }

    pub fn get_string(&self, field: &str) -> Result<Option<String>> {
        Ok(self
            .get(field)?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    pub fn set<K: Into<String>, V: Into<PropertyValue>>(&self, field: K, value: V) -> Result<()> {
        let (field, value) = (field.into(), value.into());
        self.write(|data| data.set(field, value))
    }

    pub fn parent(&self) -> Result<Option<Document>> {
        self.read(|data| data.parent.clone())
    }

    pub fn set_parent(&self, parent: Option<Document>) -> Result<()> {
        self.write(|data| data.parent = parent)
    }

    pub fn children(&self) -> Result<Option<DocumentCollection>> {
        self.read(|data| data.children.clone())
    }

    pub fn versions(&self) -> Result<Vec<Version>> {
        self.read(|data| data.versions.clone())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Document {}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("class", &self.0.class)
            .field("key", &format_args!("{:#x}", self.key()))
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Document \"{}\" ({:#x})", self.0.class, self.key())
    }
}
