use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// -- Structured queries --

/// An outbound structured query: the server-side query id plus its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query_id: String,
    pub variables: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(query_id: impl Into<String>, variables: Map<String, Value>) -> Self {
        Self {
            query_id: query_id.into(),
            variables,
        }
    }

    /// The JSON body carried in the `query` node: `{"variables": {...}}`.
    pub fn body(&self) -> Value {
        serde_json::json!({ "variables": self.variables })
    }
}

// -- Results --

/// The JSON object inside a `result` node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<ErrorItem>>,
}

impl ResultEnvelope {
    /// Non-empty error list, if the server reported one.
    pub fn errors(&self) -> Option<&[ErrorItem]> {
        self.errors.as_deref().filter(|errors| !errors.is_empty())
    }

    /// `data[key]` when a key is given, otherwise the whole `data` object.
    pub fn data_slice(&self, key: Option<&str>) -> Option<&Value> {
        let data = self.data.as_ref()?;
        match key {
            Some(key) => data.get(key),
            None => Some(data),
        }
    }
}

/// One entry of a result's `errors` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    /// Usually a string, but taken as sent.
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorItem {
    /// `message` as text: strings as-is, other JSON values stringified,
    /// empty when absent or null.
    pub fn message_text(&self) -> String {
        match &self.message {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Raw `extensions.error_code`, in whatever JSON type the server sent.
    pub fn error_code(&self) -> Option<&Value> {
        self.extensions.as_ref()?.get("error_code")
    }
}
