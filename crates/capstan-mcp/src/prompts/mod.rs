//! Built-in prompt templates.

pub mod basic;
pub mod debug;
pub mod query;
pub mod registry;
pub mod review;

pub use registry::register_prompts;
