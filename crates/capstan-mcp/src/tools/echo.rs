//! `echo` tool: return the arguments unchanged, as compact JSON.

use capstan::{Arguments, CallContext, HandlerResult, Schema, ToolCallResult, ToolRecord};

pub async fn execute(_ctx: CallContext, args: Arguments) -> HandlerResult<ToolCallResult> {
    Ok(ToolCallResult::text(args.into_value().to_string()))
}

pub fn record() -> ToolRecord {
    ToolRecord::new("echo", "Echo the arguments back", Schema::new(), execute)
}
