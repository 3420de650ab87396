pub mod namespace;
pub mod path;
pub mod segment;

pub use namespace::{default_namespaces, NamespaceRegistry};
pub use path::{is_uuid, join, node_name, normalize, parent_path, slugify};
pub use segment::{default_path_segments, PathBuilder, PathSegmentRegistry};
