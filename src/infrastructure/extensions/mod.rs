//! Extension plumbing: fetching packages, laying them out on disk, loading them

pub mod fetch;
pub mod loader;
pub mod metadata;
pub mod package;
pub mod registry;

pub use fetch::{Fetcher, GitFetcher};
pub use loader::{discover_entries, CatalogLoader, ExtensionLoader, NativeLoader};
pub use registry::ExtensionRegistry;
