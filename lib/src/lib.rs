mod error;
mod folder;
mod fs;
mod keeper;
mod meta;
mod op;
mod strategy;
mod watch;
pub mod utils;

pub use error::*;
pub use folder::FolderSnapshot;
pub use fs::*;
pub use keeper::*;
pub use meta::{Metadata, MetadataReader};
pub use strategy::*;
