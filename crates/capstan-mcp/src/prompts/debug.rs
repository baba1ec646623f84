//! Prompt: debug_error

use capstan::{CallContext, Content, HandlerResult, PromptArguments, PromptGetResult, PromptMessage};

pub async fn debug_error(_ctx: CallContext, args: PromptArguments) -> HandlerResult<PromptGetResult> {
    let error = args.require("error")?;

    Ok(PromptGetResult::new(
        "Debug Assistant",
        vec![
            PromptMessage::user(Content::text("I'm seeing this error:")),
            PromptMessage::user(Content::text(error)),
            PromptMessage::assistant(Content::text(
                "I'll help debug that. What have you tried so far?",
            )),
        ],
    ))
}
