//! Resource registration. Static resources first, then templates.

use capstan::{ConfigError, RegistryBuilder};

use crate::config::ServerConfig;

use super::{docs, templates};

pub fn register_resources(
    builder: &mut RegistryBuilder,
    config: &ServerConfig,
) -> Result<(), ConfigError> {
    docs::register(builder, config)?;
    templates::register(builder)?;
    Ok(())
}
