//! Lazy placeholders for documents reached by traversal, and lazy collections of them.

use std::{
    fmt::{self, Debug, Formatter},
    sync::{Arc, Weak},
};

use crate::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    options::Options,
    storage::{Node, NodeId},
};

/// Creates documents for nodes discovered from another document (its parent, children,
/// referrers...) without loading them.
///
/// A node that already has a live document always yields that same document. Fresh
/// placeholders are registered the moment they are created, so a traversal that comes across
/// the same node again, even while the first placeholder is still loading, gets it back
/// instead of a duplicate.
pub struct ProxyFactory<'a> {
    context: &'a ManagerContext,
}

impl<'a> ProxyFactory<'a> {
    pub fn new(context: &'a ManagerContext) -> Self {
        ProxyFactory { context }
    }

    /// A document for `target`, loaded in the locale `from` was originally requested in.
    pub fn create_proxy_for_node(
        &self,
        from: &Document,
        target: &Node,
        options: &Options,
    ) -> Result<Document> {
        let locale = self
            .context
            .registry()
            .get_original_locale_for_document(from)?;
        self.proxy_for_node_in_locale(target, &locale, options)
    }

    pub(crate) fn proxy_for_node_in_locale(
        &self,
        target: &Node,
        locale: &str,
        options: &Options,
    ) -> Result<Document> {
        let existing = {
            let registry = self.context.registry();
            if registry.has_node(target) {
                let document = registry.get_document_for_node(target)?;
                let original = registry.get_original_locale_for_document(&document)?;
                Some((document, original))
            } else {
                None
            }
        };

        if let Some((document, original)) = existing {
            if original == locale {
                tracing::trace!("[ProxyFactory] reusing {document} for {target}");
                return Ok(document);
            }
            tracing::debug!(
                "[ProxyFactory] rehydrating {document} for {target} from \"{original}\" to \"{locale}\""
            );
            self.context
                .hydrate(Some(&document), target, locale, options)?;
            return Ok(document);
        }

        let metadata = self
            .context
            .metadata_factory()
            .get_metadata_for_phpcr_node(target)?;
        let document = Document::proxy(
            metadata.class(),
            target.clone(),
            locale,
            options.clone(),
            self.context.weak(),
        );
        tracing::trace!("[ProxyFactory] created {document} for {target} in \"{locale}\"");
        self.context
            .registry()
            .register_document(&document, target, locale);
        Ok(document)
    }

    /// The children of `document`'s node, realized as placeholders while iterating.
    pub fn create_children_collection(
        &self,
        document: &Document,
        options: &Options,
    ) -> Result<DocumentCollection> {
        self.collection(document, CollectionKind::Children, options)
    }

    /// The documents whose nodes reference `document`'s node.
    pub fn create_referrer_collection(&self, document: &Document) -> Result<DocumentCollection> {
        self.collection(document, CollectionKind::Referrers, &Options::default())
    }

    fn collection(
        &self,
        document: &Document,
        kind: CollectionKind,
        options: &Options,
    ) -> Result<DocumentCollection> {
        let (node, locale) = {
            let registry = self.context.registry();
            (
                registry.get_node_for_document(document)?,
                registry.get_original_locale_for_document(document)?,
            )
        };
        Ok(DocumentCollection {
            node: node.identifier(),
            kind,
            locale,
            options: options.clone(),
            context: self.context.weak(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Children,
    Referrers,
}

/// A finite, restartable, lazy sequence of documents related to one node. Each call to
/// [`DocumentCollection::iter`] re-reads the node's live relations; each item becomes a
/// document only when the iterator reaches it.
///
/// The collection holds the node identifier and the locale it was created for, not the
/// owning document.
#[derive(Clone)]
pub struct DocumentCollection {
    node: NodeId,
    kind: CollectionKind,
    locale: String,
    options: Options,
    context: Weak<ManagerContext>,
}

impl DocumentCollection {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn context(&self) -> Result<Arc<ManagerContext>> {
        self.context.upgrade().ok_or(DocumentManagerError::Detached)
    }

    fn nodes(&self, context: &ManagerContext) -> Result<Vec<Node>> {
        let node = Node::new(context.node_manager().session().clone(), self.node);
        Ok(match self.kind {
            CollectionKind::Children => node.children()?,
            CollectionKind::Referrers => node.referrers()?,
        })
    }

    pub fn iter(&self) -> Result<CollectionIter> {
        let context = self.context()?;
        let nodes = self.nodes(&context)?;
        Ok(CollectionIter {
            nodes: nodes.into_iter(),
            locale: self.locale.clone(),
            options: self.options.clone(),
            context,
        })
    }

    /// Number of related nodes right now; creates no documents.
    pub fn len(&self) -> Result<usize> {
        let context = self.context()?;
        Ok(self.nodes(&context)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn to_vec(&self) -> Result<Vec<Document>> {
        self.iter()?.collect()
    }
}

impl Debug for DocumentCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCollection")
            .field("node", &self.node)
            .field("kind", &self.kind)
            .field("locale", &self.locale)
            .finish()
    }
}

pub struct CollectionIter {
    nodes: std::vec::IntoIter<Node>,
    locale: String,
    options: Options,
    context: Arc<ManagerContext>,
}

impl Iterator for CollectionIter {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.next()?;
        Some(
            self.context
                .proxy_factory()
                .proxy_for_node_in_locale(&node, &self.locale, &self.options),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}
