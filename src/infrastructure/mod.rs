//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Platform integrations
//! - Extensions: Package fetching, filesystem layout, loading and the registry

pub mod adapters;
pub mod config;
pub mod extensions;
