pub mod catalog;
pub mod cli;
pub mod config;
pub mod ident;
pub mod loader;
pub mod mapping;
pub mod util;

// Resolution
pub mod resolver;

pub use ident::{QualifiedName, Separator};
pub use loader::{FsLoader, SourceLoader};
pub use resolver::{PrefixResolver, Probe, Resolution};
