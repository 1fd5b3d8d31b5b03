//! Deployment configuration: YAML schema and loading.

pub mod loader;
pub mod schema;
