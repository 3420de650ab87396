use std::sync::Arc;

use crate::{
    context::ManagerContext,
    document::Document,
    error::Result,
    metadata::Metadata,
    options::Options,
    proxy::DocumentCollection,
    storage::Node,
};

/// Read-only questions about managed documents, answered from the identity map and the
/// documents' nodes. Every method fails with `NotManaged` for a document the registry does
/// not know.
pub struct DocumentInspector<'a> {
    context: &'a ManagerContext,
}

impl<'a> DocumentInspector<'a> {
    pub fn new(context: &'a ManagerContext) -> Self {
        DocumentInspector { context }
    }

    pub fn get_node(&self, document: &Document) -> Result<Node> {
        self.context.registry().get_node_for_document(document)
    }

    /// `None` for the document of the root node.
    pub fn get_parent(&self, document: &Document) -> Result<Option<Document>> {
        let Some(parent) = self.get_node(document)?.parent()? else {
            return Ok(None);
        };
        self.context
            .proxy_factory()
            .create_proxy_for_node(document, &parent, &Options::default())
            .map(Some)
    }

    pub fn get_children(&self, document: &Document, options: &Options) -> Result<DocumentCollection> {
        self.context
            .proxy_factory()
            .create_children_collection(document, options)
    }

    pub fn has_children(&self, document: &Document) -> Result<bool> {
        Ok(self.get_node(document)?.has_nodes()?)
    }

    pub fn get_referrers(&self, document: &Document) -> Result<DocumentCollection> {
        self.context
            .proxy_factory()
            .create_referrer_collection(document)
    }

    pub fn get_locale(&self, document: &Document) -> Result<String> {
        self.context.registry().get_locale_for_document(document)
    }

    pub fn get_original_locale(&self, document: &Document) -> Result<String> {
        self.context
            .registry()
            .get_original_locale_for_document(document)
    }

    pub fn get_depth(&self, document: &Document) -> Result<usize> {
        Ok(self.get_node(document)?.depth()?)
    }

    pub fn get_name(&self, document: &Document) -> Result<String> {
        Ok(self.get_node(document)?.name()?)
    }

    pub fn get_path(&self, document: &Document) -> Result<String> {
        Ok(self.get_node(document)?.path()?)
    }

    pub fn get_uuid(&self, document: &Document) -> Result<String> {
        Ok(self.get_node(document)?.identifier().to_string())
    }

    pub fn get_metadata(&self, document: &Document) -> Result<Arc<Metadata>> {
        self.get_node(document)?;
        self.context
            .metadata_factory()
            .get_metadata_for_class(document.class())
    }
}
