//! Templated resources. Each echoes its captures back in a fixed text shape.

use capstan::{ConfigError, RegistryBuilder, ResourceContent};

pub fn register(builder: &mut RegistryBuilder) -> Result<(), ConfigError> {
    builder
        .resource_template(
            "test://dynamic/resource/{id}",
            "Dynamic Resource",
            "A sample resource addressed by id",
            "text/plain",
            |_ctx, req| async move {
                Ok(vec![ResourceContent::text(
                    req.uri,
                    "text/plain",
                    "This is a sample resource",
                )])
            },
        )?
        .resource_template(
            "users://{user_id}/profile",
            "User Profile",
            "Dynamic user data",
            "text/plain",
            |_ctx, req| async move {
                let user_id = req.params.get("user_id").unwrap_or_default().to_string();
                Ok(vec![ResourceContent::text(
                    req.uri,
                    "text/plain",
                    format!("Profile data for user {user_id}"),
                )])
            },
        )?
        .resource_template(
            "file:///documents/{name}.text",
            "Document",
            "A text document by name",
            "text/plain",
            |_ctx, req| async move {
                let name = req.params.get("name").unwrap_or_default().to_string();
                Ok(vec![ResourceContent::text(
                    req.uri,
                    "text/plain",
                    format!("read: /documents/{name}.text"),
                )])
            },
        )?
        .resource_template(
            "greeting://{name}",
            "Greeting",
            "Get a personalized greeting",
            "text/plain",
            |_ctx, req| async move {
                let name = req.params.get("name").unwrap_or_default().to_string();
                Ok(vec![ResourceContent::text(
                    req.uri,
                    "text/plain",
                    format!("Hello, {name}!"),
                )])
            },
        )?;

    Ok(())
}
