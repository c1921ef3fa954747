use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Positional and named arguments carried by a call or publish.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Arguments {
    pub args: Vec<JsonValue>,
    pub kwargs: JsonMap<String, JsonValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<JsonValue>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

impl From<Vec<JsonValue>> for Arguments {
    fn from(args: Vec<JsonValue>) -> Self {
        Self { args, kwargs: JsonMap::new() }
    }
}

#[derive(Debug, Serialize)]
pub struct CallBody<'a> {
    pub procedure: &'a str,
    pub args: &'a [JsonValue],
    pub kwargs: &'a JsonMap<String, JsonValue>,
}

impl<'a> CallBody<'a> {
    pub fn new(procedure: &'a str, arguments: &'a Arguments) -> Self {
        Self { procedure, args: &arguments.args, kwargs: &arguments.kwargs }
    }
}

#[derive(Debug, Serialize)]
pub struct PublishBody<'a> {
    pub topic: &'a str,
    pub args: &'a [JsonValue],
    pub kwargs: &'a JsonMap<String, JsonValue>,
}

impl<'a> PublishBody<'a> {
    pub fn new(topic: &'a str, arguments: &'a Arguments) -> Self {
        Self { topic, args: &arguments.args, kwargs: &arguments.kwargs }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PublicationId(pub u64);

/// Read-only view over a decoded bridge response.
///
/// The bridge answers with one of `{"id": n}`, `{"args": [..], "kwargs": {..}}`
/// or `{"error": "..", "args": [..]}`. Anything that is not a JSON object is
/// treated as a response without fields.
#[derive(Clone, Copy, Debug)]
pub struct BridgeResponse<'a> {
    value: &'a JsonValue,
}

impl<'a> BridgeResponse<'a> {
    pub fn new(value: &'a JsonValue) -> Self {
        Self { value }
    }

    /// First element of `args`, if any.
    pub fn first_arg(&self) -> Option<&'a JsonValue> {
        self.value.get("args").and_then(JsonValue::as_array).and_then(|args| args.first())
    }

    pub fn kwargs(&self) -> Option<&'a JsonMap<String, JsonValue>> {
        self.value.get("kwargs").and_then(JsonValue::as_object)
    }

    pub fn error(&self) -> Option<String> {
        let error = self.value.get("error")?;
        Some(match error {
            JsonValue::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    pub fn publication_id(&self) -> Option<PublicationId> {
        self.value.get("id").and_then(JsonValue::as_u64).map(PublicationId)
    }
}
