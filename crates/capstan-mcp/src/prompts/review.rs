//! Prompts: code_review, review_code

use capstan::{CallContext, Content, HandlerResult, PromptArguments, PromptGetResult, PromptMessage};

/// Points the assistant at the pull request diff instead of inlining it.
pub async fn code_review(_ctx: CallContext, args: PromptArguments) -> HandlerResult<PromptGetResult> {
    let pr_number = args.require("pr_number")?;

    Ok(PromptGetResult::new(
        "Code review assistance",
        vec![
            PromptMessage::user(Content::text(
                "Review the changes and provide constructive feedback.",
            )),
            PromptMessage::assistant(Content::embedded(
                format!("git://pulls/{pr_number}/diff"),
                "text/x-diff",
            )),
        ],
    ))
}

pub async fn review_code(_ctx: CallContext, args: PromptArguments) -> HandlerResult<PromptGetResult> {
    let code = args.require("code")?;

    Ok(PromptGetResult::new(
        "Code review request",
        vec![PromptMessage::user(Content::text(format!(
            "Please review this code:\n\n{code}"
        )))],
    ))
}
