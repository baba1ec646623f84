//! JSON-RPC method routing over the capability dispatcher.

pub mod handler;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
