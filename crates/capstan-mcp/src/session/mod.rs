//! Client sessions for connection-less transports.

pub mod registry;

pub use registry::{Session, SessionRegistry};
