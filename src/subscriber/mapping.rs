use std::collections::BTreeMap;

use crate::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    event::{HydrateEvent, Listener, PersistEvent, RemoveLocaleEvent},
    metadata::{Behavior, Metadata},
    paths::namespace::{ROLE_CONTENT_LOCALIZED, ROLE_SYSTEM_LOCALIZED},
    storage::{Node, PropertyValue},
    version::Version,
};

use super::locale::LOCALE_MARKER;

/// System property holding a document's versions, one JSON-encoded [`Version`] per value.
pub const VERSIONS_PROPERTY: &str = "versions";

/// Moves field values between documents and node properties according to the class's field
/// mappings, and fills the fields and relations its behaviors promise.
#[derive(Debug, Default)]
pub struct MappingSubscriber;

impl MappingSubscriber {
    fn metadata(context: &ManagerContext, document: &Document) -> Result<std::sync::Arc<Metadata>> {
        context
            .metadata_factory()
            .get_metadata_for_class(document.class())
    }

    fn read_fields(
        context: &ManagerContext,
        metadata: &Metadata,
        node: &Node,
        locale: &str,
    ) -> Result<BTreeMap<String, Option<PropertyValue>>> {
        let mut fields = BTreeMap::new();
        for (field, mapping) in metadata.field_mappings() {
            if !mapping.mapped {
                continue;
            }
            let property = context.encoder().encode(
                mapping.encoding,
                mapping.property_name(field),
                Some(locale),
            )?;
            let value = node.property(&property)?.or_else(|| mapping.default.clone());
            fields.insert(field.clone(), value);
        }
        Ok(fields)
    }

    fn read_versions(context: &ManagerContext, node: &Node) -> Result<Vec<Version>> {
        let property = context.encoder().system_name(VERSIONS_PROPERTY)?;
        let values = match node.property(&property)? {
            Some(PropertyValue::Multiple(values)) => values,
            Some(single) => vec![single],
            None => return Ok(Vec::new()),
        };
        values
            .iter()
            .filter_map(PropertyValue::as_str)
            .map(|encoded| {
                serde_json::from_str::<Version>(encoded).map_err(DocumentManagerError::from)
            })
            .collect()
    }

    /// Fields mirroring the node's structure and, given `(locale, original_locale)`, the
    /// document's locales.
    fn behavior_fields(
        metadata: &Metadata,
        node: &Node,
        locales: Option<(&str, &str)>,
    ) -> Result<BTreeMap<&'static str, PropertyValue>> {
        let mut fields = BTreeMap::new();
        if metadata.has_behavior(Behavior::Uuid) {
            fields.insert("uuid", PropertyValue::from(node.identifier().to_string()));
        }
        if metadata.has_behavior(Behavior::NodeName) {
            fields.insert("node_name", PropertyValue::from(node.name()?));
        }
        if metadata.has_behavior(Behavior::Path) {
            fields.insert("path", PropertyValue::from(node.path()?));
        }
        if let (true, Some((locale, original_locale))) =
            (metadata.has_behavior(Behavior::Locale), locales)
        {
            fields.insert("locale", PropertyValue::from(locale));
            fields.insert("original_locale", PropertyValue::from(original_locale));
        }
        Ok(fields)
    }

    /// Refresh the structural fields of a loaded document after its node moved.
    pub(crate) fn sync_structure(context: &ManagerContext, document: &Document) -> Result<()> {
        if !document.is_initialized() {
            return Ok(());
        }
        let metadata = Self::metadata(context, document)?;
        let node = context.registry().get_node_for_document(document)?;
        let fields = Self::behavior_fields(&metadata, &node, None)?;
        document.write(|data| {
            for (field, value) in fields {
                data.set(field, value);
            }
        })
    }
}

impl Listener<HydrateEvent> for MappingSubscriber {
    fn handle(&self, event: &mut HydrateEvent, context: &ManagerContext) -> Result<()> {
        let document = event.get_document()?;
        let metadata = Self::metadata(context, &document)?;
        let fields = Self::read_fields(context, &metadata, &event.node, &event.locale)?;
        let behavior_fields = Self::behavior_fields(
            &metadata,
            &event.node,
            Some((event.locale.as_str(), event.original_locale.as_str())),
        )?;
        let children = if metadata.has_behavior(Behavior::Children) {
            Some(
                context
                    .proxy_factory()
                    .create_children_collection(&document, &event.options)?,
            )
        } else {
            None
        };
        let versions = if metadata.has_behavior(Behavior::Versionable) {
            Self::read_versions(context, &event.node)?
        } else {
            Vec::new()
        };

        tracing::trace!(
            "[Mapping] hydrating {document} from {} in \"{}\"",
            event.node,
            event.locale
        );
        document.write(|data| {
            for (field, value) in fields {
                match value {
                    Some(value) => data.set(field, value),
                    None => {
                        data.remove(&field);
                    }
                }
            }
            for (field, value) in behavior_fields {
                data.set(field, value);
            }
            data.children = children;
            data.versions = versions;
        })
    }
}

impl Listener<PersistEvent> for MappingSubscriber {
    fn handle(&self, event: &mut PersistEvent, context: &ManagerContext) -> Result<()> {
        let node = event.get_node()?;
        let metadata = Self::metadata(context, &event.document)?;
        let values = event.document.read(|data| data.fields.clone())?;

        for (field, mapping) in metadata.field_mappings() {
            if !mapping.mapped {
                continue;
            }
            let property = context.encoder().encode(
                mapping.encoding,
                mapping.property_name(field),
                Some(&event.locale),
            )?;
            match values.get(field) {
                Some(value) => node.set_property(&property, value.clone())?,
                None => node.remove_property(&property)?,
            }
        }
        let marker = context
            .encoder()
            .localized_system_name(LOCALE_MARKER, Some(&event.locale))?;
        node.set_property(&marker, event.locale.as_str())?;

        let locale = event.locale.as_str();
        let behavior_fields = Self::behavior_fields(&metadata, &node, Some((locale, locale)))?;
        event.document.write(|data| {
            for (field, value) in behavior_fields {
                data.set(field, value);
            }
        })
    }
}

impl Listener<RemoveLocaleEvent> for MappingSubscriber {
    fn handle(&self, event: &mut RemoveLocaleEvent, context: &ManagerContext) -> Result<()> {
        let node = context.registry().get_node_for_document(&event.document)?;
        let prefixes = [ROLE_SYSTEM_LOCALIZED, ROLE_CONTENT_LOCALIZED]
            .iter()
            .map(|role| context.encoder().localized_prefix(role, &event.locale))
            .collect::<Result<Vec<_>>>()?;
        let mut removed = 0usize;
        for property in node.property_names()? {
            if prefixes.iter().any(|prefix| property.starts_with(prefix.as_str())) {
                node.remove_property(&property)?;
                removed += 1;
            }
        }
        tracing::debug!(
            "[Mapping] removed {removed} \"{}\" properties from {node}",
            event.locale
        );
        Ok(())
    }
}
