//! `hello_world` tool: greet someone by name.

use serde::Deserialize;

use capstan::{CallContext, Field, HandlerResult, Schema, ToolCallResult, ToolRecord};

#[derive(Debug, Deserialize)]
pub struct HelloArgs {
    pub name: String,
}

pub fn schema() -> Schema {
    Schema::new().field(
        Field::string("name")
            .required()
            .describe("Name of the person to greet"),
    )
}

pub async fn execute(_ctx: CallContext, args: HelloArgs) -> HandlerResult<ToolCallResult> {
    Ok(ToolCallResult::text(format!("Hello, {}!", args.name)))
}

pub fn record() -> ToolRecord {
    ToolRecord::typed("hello_world", "Say hello to someone", schema(), execute)
}
