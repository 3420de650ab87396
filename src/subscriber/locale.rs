use crate::{
    context::ManagerContext,
    error::Result,
    event::{HydrateEvent, Listener},
    paths::namespace::ROLE_SYSTEM_LOCALIZED,
    storage::Node,
};

/// Localized system property marking that a node holds content in a locale. Written on
/// every persist.
pub const LOCALE_MARKER: &str = "locale";

/// Locales `node` holds content in, sorted.
pub fn available_locales(context: &ManagerContext, node: &Node) -> Result<Vec<String>> {
    let prefix = context.encoder().namespaces().prefix(ROLE_SYSTEM_LOCALIZED)?;
    let head = if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}:")
    };
    let tail = format!("-{LOCALE_MARKER}");
    let mut locales: Vec<String> = node
        .property_names()?
        .into_iter()
        .filter_map(|name| {
            name.strip_prefix(head.as_str())
                .and_then(|rest| rest.strip_suffix(tail.as_str()))
                .filter(|locale| !locale.is_empty())
                .map(str::to_string)
        })
        .collect();
    locales.sort();
    locales.dedup();
    Ok(locales)
}

/// Ghost content: a document requested in a locale its node has no content for is loaded
/// in another locale instead, while the requested locale stays the document's original
/// locale. The configured default locale is preferred, then the first available one.
/// Disabled by the `load_ghost_content` option; nodes without any content are left alone.
#[derive(Debug, Default)]
pub struct LocaleSubscriber;

impl Listener<HydrateEvent> for LocaleSubscriber {
    fn handle(&self, event: &mut HydrateEvent, context: &ManagerContext) -> Result<()> {
        if !event.options.load_ghost_content {
            return Ok(());
        }
        let available = available_locales(context, &event.node)?;
        if available.is_empty() || available.contains(&event.locale) {
            return Ok(());
        }
        let fallback = context
            .default_locale()
            .filter(|default| available.iter().any(|locale| locale == default))
            .map(str::to_string)
            .unwrap_or_else(|| available[0].clone());
        tracing::debug!(
            "[Locale] {} has no \"{}\" content, loading \"{fallback}\"",
            event.node,
            event.locale
        );
        event.locale = fallback;
        Ok(())
    }
}
