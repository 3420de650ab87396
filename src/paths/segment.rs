use std::collections::BTreeMap;

use crate::error::{DocumentManagerError, Result};

pub fn default_path_segments() -> BTreeMap<String, String> {
    [
        ("base", "cmf"),
        ("content", "contents"),
        ("route", "routes"),
        ("snippet", "snippets"),
    ]
    .into_iter()
    .map(|(name, segment)| (name.to_string(), segment.to_string()))
    .collect()
}

/// Named path segments, e.g. `base -> cmf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegmentRegistry {
    segments: BTreeMap<String, String>,
}

impl Default for PathSegmentRegistry {
    fn default() -> Self {
        PathSegmentRegistry::new(default_path_segments())
    }
}

impl PathSegmentRegistry {
    pub fn new(segments: BTreeMap<String, String>) -> Self {
        PathSegmentRegistry { segments }
    }

    pub fn path_segment(&self, name: &str) -> Result<&str> {
        self.segments.get(name).map(String::as_str).ok_or_else(|| {
            DocumentManagerError::structural(format!(
                "Unknown path segment \"{name}\". Known path segments: \"{}\"",
                self.segments.keys().cloned().collect::<Vec<_>>().join("\", \"")
            ))
        })
    }
}

/// Builds absolute node paths from literal segments and `%name%` placeholders resolved through
/// a [`PathSegmentRegistry`].
///
/// ```rust
/// use document_manager::paths::{PathBuilder, PathSegmentRegistry};
///
/// let builder = PathBuilder::new(PathSegmentRegistry::default());
/// assert_eq!(
///     builder.build(&["%base%", "sulu_io", "%content%"]).unwrap(),
///     "/cmf/sulu_io/contents"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    registry: PathSegmentRegistry,
}

impl PathBuilder {
    pub fn new(registry: PathSegmentRegistry) -> Self {
        PathBuilder { registry }
    }

    pub fn build<S: AsRef<str>>(&self, segments: &[S]) -> Result<String> {
        let mut results = Vec::with_capacity(segments.len());
        for segment in segments {
            if let Some(resolved) = self.build_segment(segment.as_ref())? {
                results.push(resolved);
            }
        }
        Ok(format!("/{}", results.join("/")))
    }

    fn build_segment<'a>(&'a self, segment: &'a str) -> Result<Option<&'a str>> {
        if segment.is_empty() || segment == "/" {
            return Ok(None);
        }
        if segment.len() > 1 && segment.starts_with('%') && segment.ends_with('%') {
            return self
                .registry
                .path_segment(&segment[1..segment.len() - 1])
                .map(Some);
        }
        Ok(Some(segment))
    }

    pub fn registry(&self) -> &PathSegmentRegistry {
        &self.registry
    }
}
