//! Document metadata: which document class a stored node maps to, under which alias and type
//! tag, and how the class's fields are laid out on the node.

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::{
    encoder::Encoding,
    error::{DocumentManagerError, Result},
    storage::{Node, PropertyValue},
};

/// Class of documents instantiated for nodes no registered metadata claims.
pub const UNKNOWN_DOCUMENT_CLASS: &str = "UnknownDocument";

/// Capabilities a document class opts into. Each one is serviced by a core subscriber.
#[derive(Debug, EnumSetType, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// `uuid` field mirrors the node identifier.
    Uuid,
    /// `node_name` field mirrors the node name.
    NodeName,
    /// `path` field mirrors the node path.
    Path,
    /// `locale` and `original_locale` fields mirror the registry's locales.
    Locale,
    /// The document's parent is a lazily loaded proxy of the parent node.
    Parent,
    /// The document exposes a lazy children collection.
    Children,
    /// The node name of a new document is derived from its `title` field.
    AutoName,
    /// Version history is loaded from the node.
    Versionable,
}

impl Display for Behavior {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Behavior::Uuid => "uuid",
            Behavior::NodeName => "node_name",
            Behavior::Path => "path",
            Behavior::Locale => "locale",
            Behavior::Parent => "parent",
            Behavior::Children => "children",
            Behavior::AutoName => "auto_name",
            Behavior::Versionable => "versionable",
        };
        write!(f, "{name}")
    }
}

fn mapped_default() -> bool {
    true
}

/// How one document field is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default)]
    pub encoding: Encoding,
    /// Property name before encoding; defaults to the field name.
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub default: Option<PropertyValue>,
    /// Unmapped fields live only on the document and are never written to the node.
    #[serde(default = "mapped_default")]
    pub mapped: bool,
}

impl Default for FieldMapping {
    fn default() -> Self {
        FieldMapping {
            encoding: Encoding::default(),
            property: None,
            default: None,
            mapped: true,
        }
    }
}

impl FieldMapping {
    pub fn property_name<'a>(&'a self, field: &'a str) -> &'a str {
        self.property.as_deref().unwrap_or(field)
    }
}

/// One entry of the mapping table, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMapping {
    pub alias: String,
    pub class: String,
    pub phpcr_type: String,
    #[serde(default)]
    pub behaviors: Vec<Behavior>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldMapping>,
}

impl DocumentMapping {
    pub fn new<A: Into<String>, C: Into<String>, T: Into<String>>(alias: A, class: C, phpcr_type: T) -> Self {
        DocumentMapping {
            alias: alias.into(),
            class: class.into(),
            phpcr_type: phpcr_type.into(),
            behaviors: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_behaviors<I: IntoIterator<Item = Behavior>>(mut self, behaviors: I) -> Self {
        self.behaviors.extend(behaviors);
        self
    }

    pub fn with_field<S: Into<String>>(mut self, name: S, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }
}

/// Immutable descriptor binding a document class to its alias and storage type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    class: String,
    alias: Option<String>,
    phpcr_type: Option<String>,
    behaviors: EnumSet<Behavior>,
    field_mappings: BTreeMap<String, FieldMapping>,
}

impl Metadata {
    fn unknown() -> Self {
        Metadata {
            class: UNKNOWN_DOCUMENT_CLASS.to_string(),
            alias: None,
            phpcr_type: None,
            behaviors: Behavior::Uuid
                | Behavior::NodeName
                | Behavior::Path
                | Behavior::Parent
                | Behavior::Children,
            field_mappings: BTreeMap::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn phpcr_type(&self) -> Option<&str> {
        self.phpcr_type.as_deref()
    }

    pub fn behaviors(&self) -> EnumSet<Behavior> {
        self.behaviors
    }

    pub fn has_behavior(&self, behavior: Behavior) -> bool {
        self.behaviors.contains(behavior)
    }

    pub fn field_mappings(&self) -> &BTreeMap<String, FieldMapping> {
        &self.field_mappings
    }

    pub fn field_mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.field_mappings.get(field)
    }
}

impl From<DocumentMapping> for Metadata {
    fn from(mapping: DocumentMapping) -> Self {
        Metadata {
            class: mapping.class,
            alias: Some(mapping.alias),
            phpcr_type: Some(mapping.phpcr_type),
            behaviors: mapping.behaviors.into_iter().collect(),
            field_mappings: mapping.fields,
        }
    }
}

/// Resolves alias, class or storage type to [`Metadata`]. Built once from the mapping table;
/// each of the three axes must be unique across the table.
#[derive(Debug, Clone)]
pub struct MetadataFactory {
    by_alias: BTreeMap<String, Arc<Metadata>>,
    by_class: BTreeMap<String, Arc<Metadata>>,
    by_phpcr_type: BTreeMap<String, Arc<Metadata>>,
    unknown: Arc<Metadata>,
}

impl Default for MetadataFactory {
    fn default() -> Self {
        MetadataFactory {
            by_alias: BTreeMap::new(),
            by_class: BTreeMap::new(),
            by_phpcr_type: BTreeMap::new(),
            unknown: Arc::new(Metadata::unknown()),
        }
    }
}

fn insert_unique(
    index: &mut BTreeMap<String, Arc<Metadata>>,
    axis: &str,
    key: &str,
    metadata: &Arc<Metadata>,
) -> Result<()> {
    match index.entry(key.to_string()) {
        Entry::Occupied(existing) => Err(DocumentManagerError::Mapping(format!(
            "{axis} \"{key}\" is mapped by both \"{}\" and \"{}\"",
            existing.get().class(),
            metadata.class()
        ))),
        Entry::Vacant(slot) => {
            slot.insert(metadata.clone());
            Ok(())
        }
    }
}

impl MetadataFactory {
    pub fn new<I: IntoIterator<Item = DocumentMapping>>(mappings: I) -> Result<Self> {
        let mut factory = MetadataFactory::default();
        for mapping in mappings {
            let metadata = Arc::new(Metadata::from(mapping));
            if metadata.class() == UNKNOWN_DOCUMENT_CLASS {
                return Err(DocumentManagerError::Mapping(format!(
                    "class \"{UNKNOWN_DOCUMENT_CLASS}\" is reserved"
                )));
            }
            let alias = metadata.alias().unwrap_or_default().to_string();
            let phpcr_type = metadata.phpcr_type().unwrap_or_default().to_string();
            insert_unique(&mut factory.by_alias, "Alias", &alias, &metadata)?;
            insert_unique(&mut factory.by_class, "Class", metadata.class(), &metadata)?;
            insert_unique(&mut factory.by_phpcr_type, "Type", &phpcr_type, &metadata)?;
        }
        tracing::debug!(
            "[MetadataFactory] loaded metadata for aliases {:?}",
            factory.by_alias.keys().collect::<Vec<_>>()
        );
        Ok(factory)
    }

    fn lookup(
        index: &BTreeMap<String, Arc<Metadata>>,
        axis: &'static str,
        key: &str,
    ) -> Result<Arc<Metadata>> {
        index
            .get(key)
            .cloned()
            .ok_or_else(|| DocumentManagerError::MetadataNotFound {
                axis,
                key: key.to_string(),
                known: index.keys().cloned().collect(),
            })
    }

    pub fn get_metadata_for_alias(&self, alias: &str) -> Result<Arc<Metadata>> {
        Self::lookup(&self.by_alias, "alias", alias)
    }

    pub fn get_metadata_for_class(&self, class: &str) -> Result<Arc<Metadata>> {
        if class == UNKNOWN_DOCUMENT_CLASS {
            return Ok(self.unknown.clone());
        }
        Self::lookup(&self.by_class, "class", class)
    }

    pub fn get_metadata_for_phpcr_type(&self, phpcr_type: &str) -> Result<Arc<Metadata>> {
        Self::lookup(&self.by_phpcr_type, "type", phpcr_type)
    }

    pub fn has_metadata_for_phpcr_type(&self, phpcr_type: &str) -> bool {
        self.by_phpcr_type.contains_key(phpcr_type)
    }

    pub fn has_metadata_for_class(&self, class: &str) -> bool {
        self.by_class.contains_key(class)
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    /// Metadata for the first of the node's type tags that is registered, or the reserved
    /// unknown metadata when none is. Fails only when the node itself cannot be read.
    pub fn get_metadata_for_phpcr_node(&self, node: &Node) -> Result<Arc<Metadata>> {
        for mixin in node.mixin_types()? {
            if let Some(metadata) = self.by_phpcr_type.get(&mixin) {
                return Ok(metadata.clone());
            }
        }
        tracing::trace!("[MetadataFactory] no metadata for {node}, using unknown metadata");
        Ok(self.unknown.clone())
    }

    pub fn unknown_metadata(&self) -> Arc<Metadata> {
        self.unknown.clone()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.by_alias.keys().cloned().collect()
    }

    pub fn all_metadata(&self) -> Vec<Arc<Metadata>> {
        self.by_alias.values().cloned().collect()
    }
}
