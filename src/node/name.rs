use crate::{
    error::{DocumentManagerError, Result},
    storage::Node,
};

/// Resolves child-name collisions under a parent node.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl NameResolver {
    pub fn new() -> Self {
        NameResolver
    }

    /// Returns `name` if it is free under `parent` (or taken by `exclude` itself), otherwise the
    /// first free `name-1`, `name-2`, ... when `auto_rename` is set.
    ///
    /// The suffix search is unbounded.
    pub fn resolve_name(
        &self,
        parent: &Node,
        name: &str,
        exclude: Option<&Node>,
        auto_rename: bool,
    ) -> Result<String> {
        let mut index = 0usize;
        loop {
            let candidate = if index == 0 {
                name.to_string()
            } else {
                format!("{name}-{index}")
            };
            if !Self::conflicts(parent, &candidate, exclude)? {
                if index > 0 {
                    tracing::debug!(
                        "[NameResolver] \"{name}\" is taken below {parent}, using \"{candidate}\""
                    );
                }
                return Ok(candidate);
            }
            if !auto_rename {
                return Err(DocumentManagerError::NodeNameAlreadyExists(candidate));
            }
            index += 1;
        }
    }

    fn conflicts(parent: &Node, candidate: &str, exclude: Option<&Node>) -> Result<bool> {
        if !parent.has_node(candidate)? {
            return Ok(false);
        }
        match exclude {
            Some(exclude) => Ok(parent.node(candidate)? != *exclude),
            None => Ok(true),
        }
    }
}
