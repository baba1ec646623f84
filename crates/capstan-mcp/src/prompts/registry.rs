//! Prompt registration, in listing order.

use capstan::{argument, ConfigError, RegistryBuilder};

use super::{basic, debug, query, review};

pub fn register_prompts(builder: &mut RegistryBuilder) -> Result<(), ConfigError> {
    builder
        .prompt("simple_prompt", "A simple prompt", vec![], basic::simple)?
        .prompt(
            "greeting",
            "A friendly greeting prompt",
            vec![argument("name", "Name of the person to greet", false)],
            basic::greeting,
        )?
        .prompt(
            "code_review",
            "Code review assistance",
            vec![argument("pr_number", "Pull request number to review", true)],
            review::code_review,
        )?
        .prompt(
            "query_builder",
            "SQL query builder assistance",
            vec![argument("table", "Name of the table to query", true)],
            query::query_builder,
        )?
        .prompt(
            "review_code",
            "Ask for a review of a code snippet",
            vec![argument("code", "The code to review", true)],
            review::review_code,
        )?
        .prompt(
            "debug_error",
            "Debug Assistant",
            vec![argument("error", "The error message to debug", true)],
            debug::debug_error,
        )?;
    Ok(())
}
