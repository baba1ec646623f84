//! Prompt: query_builder

use capstan::{
    CallContext, Content, HandlerError, HandlerResult, PromptArguments, PromptGetResult,
    PromptMessage,
};

pub async fn query_builder(_ctx: CallContext, args: PromptArguments) -> HandlerResult<PromptGetResult> {
    let table = args
        .get("table")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HandlerError::failed("table name is required"))?;

    Ok(PromptGetResult::new(
        "SQL query builder assistance",
        vec![
            PromptMessage::user(Content::text(
                "Help construct efficient and safe queries for the provided schema.",
            )),
            PromptMessage::user(Content::embedded(
                format!("db://schema/{table}"),
                "application/json",
            )),
        ],
    ))
}
