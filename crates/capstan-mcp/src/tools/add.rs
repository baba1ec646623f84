//! `add` tool: integer addition.

use serde::Deserialize;

use capstan::{CallContext, Field, HandlerError, HandlerResult, Schema, ToolCallResult, ToolRecord};

#[derive(Debug, Deserialize)]
pub struct AddArgs {
    pub a: i64,
    pub b: i64,
}

pub fn schema() -> Schema {
    Schema::new()
        .field(Field::integer("a").required())
        .field(Field::integer("b").required())
}

pub async fn execute(_ctx: CallContext, args: AddArgs) -> HandlerResult<ToolCallResult> {
    let sum = args
        .a
        .checked_add(args.b)
        .ok_or_else(|| HandlerError::failed("integer overflow"))?;
    Ok(ToolCallResult::text(sum.to_string()))
}

pub fn record() -> ToolRecord {
    ToolRecord::typed("add", "Add two numbers", schema(), execute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capstan::{validate, Arguments};
    use serde_json::json;

    async fn run(args: serde_json::Value) -> HandlerResult<ToolCallResult> {
        let args: Arguments = validate(&schema(), Some(&args))?;
        execute(CallContext::new(), args.bind()?).await
    }

    #[tokio::test]
    async fn test_integral_float_operand() {
        let r = run(json!({"a": 2.0, "b": 3})).await.unwrap();
        assert_eq!(r.joined_text(), "5");
    }

    #[tokio::test]
    async fn test_out_of_range_operand_rejected() {
        let err = run(json!({"a": 9_223_372_036_854_775_808u64, "b": 1}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument 'a': is out of range for a 64-bit integer"
        );
    }

    #[tokio::test]
    async fn test_overflow() {
        let err = run(json!({"a": i64::MAX, "b": 1})).await.unwrap_err();
        assert_eq!(err, HandlerError::failed("integer overflow"));
    }
}
