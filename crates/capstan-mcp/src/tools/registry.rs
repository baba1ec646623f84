//! Tool registration, in listing order.

use capstan::{ConfigError, RegistryBuilder};

use crate::config::ServerConfig;

use super::{add, calculate, calculate_bmi, echo, greeting, hello_world, http_request};

pub fn register_tools(builder: &mut RegistryBuilder, config: &ServerConfig) -> Result<(), ConfigError> {
    builder
        .register(hello_world::record())?
        .register(calculate::record())?
        .register(greeting::record())?
        .register(http_request::record(http_request::client(config.http_timeout))?)?
        .register(add::record())?
        .register(calculate_bmi::record())?
        .register(echo::record())?;
    Ok(())
}
