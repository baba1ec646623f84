//! Capstan MCP server: built-in capabilities served over stdio or HTTP.

pub mod capabilities;
pub mod config;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use capabilities::{build_dispatcher, build_registry};
pub use config::ServerConfig;
pub use protocol::ProtocolHandler;
pub use transport::StdioTransport;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
