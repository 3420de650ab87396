//! Node-level collaborators: storage access, structural helpers and name resolution.

mod helper;
mod manager;
mod name;

pub use helper::NodeHelper;
pub use manager::NodeManager;
pub use name::NameResolver;
