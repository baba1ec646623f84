//! `calculate_bmi` tool: body-mass index from weight and height.

use serde::Deserialize;

use capstan::{CallContext, Field, HandlerResult, Schema, ToolCallResult, ToolRecord};

#[derive(Debug, Deserialize)]
pub struct BmiArgs {
    pub weight_kg: f64,
    pub height_m: f64,
}

pub fn schema() -> Schema {
    Schema::new()
        .field(
            Field::number("weight_kg")
                .required()
                .describe("Weight in kilograms")
                .minimum(0.0),
        )
        .field(
            Field::number("height_m")
                .required()
                .describe("Height in meters")
                .minimum(0.01),
        )
}

pub async fn execute(_ctx: CallContext, args: BmiArgs) -> HandlerResult<ToolCallResult> {
    let bmi = args.weight_kg / (args.height_m * args.height_m);
    Ok(ToolCallResult::text(format!("{bmi:.2}")))
}

pub fn record() -> ToolRecord {
    ToolRecord::typed(
        "calculate_bmi",
        "Calculate BMI given weight in kg and height in meters",
        schema(),
        execute,
    )
}
