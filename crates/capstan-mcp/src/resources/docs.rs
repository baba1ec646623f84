//! Static resources: the project document and the app configuration.

use std::path::Path;
use std::sync::Arc;

use capstan::{
    CallContext, ConfigError, HandlerError, HandlerResult, RegistryBuilder, ResourceContent,
    ResourceRequest,
};

use crate::config::ServerConfig;

pub const README_URI: &str = "docs://readme";
pub const CONFIG_URI: &str = "config://app";

/// Read the configured document verbatim. Failures surface to the caller.
pub async fn read_readme(path: &Path, uri: &str) -> HandlerResult<Vec<ResourceContent>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HandlerError::failed(format!("failed to read {}: {e}", path.display())))?;

    Ok(vec![ResourceContent::text(uri, "text/markdown", text)])
}

pub fn register(builder: &mut RegistryBuilder, config: &ServerConfig) -> Result<(), ConfigError> {
    let path = Arc::new(config.docs_path.clone());

    builder
        .resource(
            README_URI,
            "Project README",
            "The project's README file",
            "text/markdown",
            move |_ctx: CallContext, req: ResourceRequest| {
                let path = Arc::clone(&path);
                async move { read_readme(&path, &req.uri).await }
            },
        )?
        .resource(
            CONFIG_URI,
            "Application Configuration",
            "Static configuration data",
            "text/plain",
            |_ctx, req| async move {
                Ok(vec![ResourceContent::text(
                    req.uri,
                    "text/plain",
                    "App configuration here",
                )])
            },
        )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_readme_is_read_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# Title\n\nBody with **markdown**.\n").unwrap();

        let contents = read_readme(file.path(), README_URI)
            .await
            .unwrap();
        assert_eq!(contents[0].uri, README_URI);
        assert_eq!(contents[0].mime_type.as_deref(), Some("text/markdown"));
        assert_eq!(
            contents[0].text.as_deref(),
            Some("# Title\n\nBody with **markdown**.\n")
        );
    }

    #[tokio::test]
    async fn test_missing_readme_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_readme(&dir.path().join("absent.md"), README_URI)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
