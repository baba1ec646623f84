//! `http_request` tool: forward a request to an external URL.
//!
//! Any HTTP status counts as success; only transport failures are errors.

use std::time::Duration;

use serde::Deserialize;

use capstan::{
    CallContext, ConfigError, Field, HandlerError, HandlerResult, Schema,
    ToolCallResult, ToolRecord,
};

pub fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("capstan-mcp/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

#[derive(Debug, Deserialize)]
pub struct HttpRequestArgs {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
}

pub fn schema() -> Result<Schema, ConfigError> {
    Ok(Schema::new()
        .field(
            Field::string("method")
                .required()
                .describe("HTTP method to use")
                .one_of(["GET", "POST", "PUT", "DELETE"]),
        )
        .field(
            Field::string("url")
                .required()
                .describe("URL to send the request to")
                .pattern("^https?://.*")?,
        )
        .field(Field::string("body").describe("Request body (for POST/PUT)")))
}

pub async fn execute(
    client: reqwest::Client,
    ctx: CallContext,
    args: HttpRequestArgs,
) -> HandlerResult<ToolCallResult> {
    let method = reqwest::Method::from_bytes(args.method.as_bytes())
        .map_err(|e| HandlerError::failed(format!("unable to create request: {e}")))?;

    let mut builder = client.request(method, args.url.as_str());
    if let Some(body) = args.body {
        builder = builder.body(body);
    }
    // Never outlive the call's own deadline.
    if let Some(remaining) = ctx.remaining() {
        builder = builder.timeout(remaining);
    }

    let request = builder
        .build()
        .map_err(|e| HandlerError::failed(format!("unable to create request: {e}")))?;

    tracing::debug!("Forwarding {} {}", request.method(), request.url());

    let response = client
        .execute(request)
        .await
        .map_err(|e| HandlerError::failed(format!("unable to execute request: {e}")))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| HandlerError::failed(format!("unable to read request response: {e}")))?;

    Ok(ToolCallResult::text(format!("Status: {status}\nBody: {body}")))
}

pub fn record(client: reqwest::Client) -> Result<ToolRecord, ConfigError> {
    Ok(ToolRecord::typed(
        "http_request",
        "Make HTTP requests to external APIs",
        schema()?,
        move |ctx, args: HttpRequestArgs| execute(client.clone(), ctx, args),
    ))
}
