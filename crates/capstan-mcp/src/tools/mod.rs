//! Built-in tools.

pub mod add;
pub mod calculate;
pub mod calculate_bmi;
pub mod echo;
pub mod greeting;
pub mod hello_world;
pub mod http_request;
pub mod registry;

pub use registry::register_tools;
