//! Prompts: simple_prompt, greeting

use capstan::{CallContext, Content, HandlerResult, PromptArguments, PromptGetResult, PromptMessage};

pub async fn simple(_ctx: CallContext, _args: PromptArguments) -> HandlerResult<PromptGetResult> {
    Ok(PromptGetResult::new(
        "A simple prompt without arguments",
        vec![PromptMessage::user(Content::text(
            "This is a simple prompt without arguments.",
        ))],
    ))
}

pub async fn greeting(_ctx: CallContext, args: PromptArguments) -> HandlerResult<PromptGetResult> {
    let name = args.get_or("name", "friend");

    Ok(PromptGetResult::new(
        "A friendly greeting",
        vec![PromptMessage::assistant(Content::text(format!(
            "Hello, {name}! How can I help you today?"
        )))],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_greeting_defaults_to_friend() {
        let result = greeting(CallContext::new(), PromptArguments::default())
            .await
            .unwrap();
        assert_eq!(
            result.messages[0].content.as_text(),
            Some("Hello, friend! How can I help you today?")
        );

        let args: PromptArguments = [("name", "")].into_iter().collect();
        let result = greeting(CallContext::new(), args).await.unwrap();
        assert_eq!(
            result.messages[0].content.as_text(),
            Some("Hello, friend! How can I help you today?")
        );
    }
}
