//! Built-in resources and resource templates.

pub mod docs;
pub mod registry;
pub mod templates;

pub use registry::register_resources;
