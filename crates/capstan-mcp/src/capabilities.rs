//! Assembles the built-in capability set.

use capstan::{ConfigError, Dispatcher, Registry};

use crate::config::ServerConfig;
use crate::prompts::register_prompts;
use crate::resources::register_resources;
use crate::tools::register_tools;

/// Register every built-in tool, resource and prompt, then freeze.
pub fn build_registry(config: &ServerConfig) -> Result<Registry, ConfigError> {
    let mut builder = Registry::builder();
    register_tools(&mut builder, config)?;
    register_resources(&mut builder, config)?;
    register_prompts(&mut builder)?;
    Ok(builder.build())
}

pub fn build_dispatcher(config: &ServerConfig) -> Result<Dispatcher, ConfigError> {
    build_registry(config).map(Dispatcher::new)
}
