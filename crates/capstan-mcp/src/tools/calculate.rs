//! `calculate` tool: basic arithmetic on two numbers.

use serde::Deserialize;

use capstan::{CallContext, Field, HandlerError, HandlerResult, Schema, ToolCallResult, ToolRecord};

#[derive(Debug, Deserialize)]
pub struct CalculateArgs {
    pub operation: String,
    pub x: f64,
    pub y: f64,
}

pub fn schema() -> Schema {
    Schema::new()
        .field(
            Field::string("operation")
                .required()
                .describe("The operation to perform (add, subtract, multiply, divide)")
                .one_of(["add", "subtract", "multiply", "divide"]),
        )
        .field(Field::number("x").required().describe("First number"))
        .field(Field::number("y").required().describe("Second number"))
}

pub async fn execute(_ctx: CallContext, args: CalculateArgs) -> HandlerResult<ToolCallResult> {
    let CalculateArgs { operation, x, y } = args;

    let result = match operation.as_str() {
        "add" => x + y,
        "subtract" => x - y,
        "multiply" => x * y,
        "divide" => {
            if y == 0.0 {
                return Err(HandlerError::failed("cannot divide by zero"));
            }
            x / y
        }
        // Unreachable once the schema's enum check has passed.
        other => return Err(HandlerError::failed(format!("unsupported operation: {other}"))),
    };

    Ok(ToolCallResult::text(format!("{result:.2}")))
}

pub fn record() -> ToolRecord {
    ToolRecord::typed(
        "calculate",
        "Perform basic arithmetic operations",
        schema(),
        execute,
    )
}
