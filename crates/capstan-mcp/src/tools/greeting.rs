//! `greeting` tool: personalized greeting built from structured arguments.
//!
//! Arguments are bound into [`GreetingArgs`] after validation, so the handler
//! works with typed values only.

use serde::Deserialize;

use capstan::{
    CallContext, Field, FieldKind, HandlerError, HandlerResult, Schema, ToolCallResult, ToolRecord,
};

#[derive(Debug, Default, Deserialize)]
pub struct GreetingArgs {
    pub name: String,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

pub fn schema() -> Schema {
    let metadata = Schema::new()
        .field(Field::string("location").describe("Current location"))
        .field(Field::string("timezone").describe("Timezone"));

    Schema::new()
        .field(
            Field::string("name")
                .required()
                .describe("Name of the person to greet"),
        )
        .field(
            Field::integer("age")
                .describe("Age of the person")
                .minimum(0.0)
                .maximum(150.0),
        )
        .field(
            Field::boolean("is_vip")
                .describe("Whether the person is a VIP")
                .default_value(false.into()),
        )
        .field(
            Field::array("languages", FieldKind::string())
                .describe("Languages the person speaks"),
        )
        .field(
            Field::object("metadata", metadata)
                .describe("Additional information about the person"),
        )
}

pub fn compose(args: &GreetingArgs) -> String {
    let mut greeting = format!("Hello, {}!", args.name);

    if let Some(age) = args.age.filter(|a| *a > 0.0) {
        greeting.push_str(&format!(" You are {age} years old."));
    }

    if args.is_vip {
        greeting.push_str(" Welcome back, valued VIP customer!");
    }

    if !args.languages.is_empty() {
        greeting.push_str(&format!(
            " You speak {} languages: {}.",
            args.languages.len(),
            args.languages.join(", ")
        ));
    }

    let metadata = args.metadata.as_ref();
    if let Some(location) = metadata.and_then(|m| m.location.as_deref()).filter(|l| !l.is_empty()) {
        greeting.push_str(&format!(" I see you're from {location}."));

        if let Some(tz) = metadata.and_then(|m| m.timezone.as_deref()).filter(|t| !t.is_empty()) {
            greeting.push_str(&format!(" Your timezone is {tz}."));
        }
    }

    greeting
}

pub async fn execute(_ctx: CallContext, args: GreetingArgs) -> HandlerResult<ToolCallResult> {
    if args.name.is_empty() {
        return Err(HandlerError::failed("name is required"));
    }
    Ok(ToolCallResult::text(compose(&args)))
}

pub fn record() -> ToolRecord {
    ToolRecord::typed(
        "greeting",
        "Generate a personalized greeting",
        schema(),
        execute,
    )
}
