use once_cell::sync::Lazy;
use regex::Regex;

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[[:xdigit:]]{8}-[[:xdigit:]]{4}-[[:xdigit:]]{4}-[[:xdigit:]]{4}-[[:xdigit:]]{12}$")
        .expect("UUID pattern is a valid regex")
});

/// True if `identifier` is shaped like a hyphenated UUID rather than a node path.
pub fn is_uuid(identifier: &str) -> bool {
    UUID_PATTERN.is_match(identifier)
}

/// Turn a title string into a regularized node name
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(char::is_whitespace, "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}

/// Normalize an absolute node path by resolving `.` and `..` components and collapsing
/// repeated separators. `..` above the root is dropped.
pub fn normalize(path: &str) -> String {
    let mut components = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(part),
        }
    }
    format!("/{}", components.join("/"))
}

/// Parent of an absolute node path. The root is its own parent.
pub fn parent_path(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Final segment of a node path; empty for the root.
pub fn node_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Join a child name onto a parent path.
pub fn join(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        return normalize(parent);
    }
    format!("{parent}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_detection() {
        assert!(is_uuid("6b3d2154-c0a9-437b-9324-5f62adeb9a44"));
        assert!(is_uuid("6B3D2154-C0A9-437B-9324-5F62ADEB9A44"));
        assert!(!is_uuid("/cmf/contents"));
        assert!(!is_uuid("6b3d2154c0a9437b93245f62adeb9a44"));
        assert!(!is_uuid("/6b3d2154-c0a9-437b-9324-5f62adeb9a44"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  My First Page "), "my-first-page");
        assert_eq!(slugify("Ä & Ö?"), "ä--ö");
    }

    #[test]
    fn test_path_parts() {
        assert_eq!(parent_path("/cmf/contents/page"), "/cmf/contents");
        assert_eq!(parent_path("/cmf"), "/");
        assert_eq!(parent_path("/"), "/");
        assert_eq!(node_name("/cmf/contents/page"), "page");
        assert_eq!(node_name("/cmf/"), "cmf");
        assert_eq!(node_name("/"), "");
    }

    #[test]
    fn test_normalize_and_join() {
        assert_eq!(normalize("/cmf//contents/./page/../other"), "/cmf/contents/other");
        assert_eq!(normalize("/../cmf"), "/cmf");
        assert_eq!(join("/", "cmf"), "/cmf");
        assert_eq!(join("/cmf/", "contents"), "/cmf/contents");
        assert_eq!(join("/cmf", ""), "/cmf");
    }
}
