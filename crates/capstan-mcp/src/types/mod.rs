//! Wire types for the JSON-RPC surface.
//!
//! Capability payloads (tool results, resource contents, prompt messages)
//! live in the core crate and are re-exported here.

pub mod capabilities;
pub mod error;
pub mod message;
pub mod request;

pub use capabilities::*;
pub use error::*;
pub use message::*;
pub use request::*;

pub use capstan::types::*;
