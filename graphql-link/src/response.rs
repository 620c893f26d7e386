use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single GraphQL error as reported in a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

impl ResponseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: vec![],
        }
    }
}

/// One result emitted by a link for an operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct FetchResult {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ResponseError>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    extensions: Map<String, Value>,
}

impl FetchResult {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// Looks up a value inside `data` using a JSON pointer such as `/counter/count`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.pointer(pointer))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(feature = "graphql")]
impl TryFrom<async_graphql::Response> for FetchResult {
    type Error = serde_json::Error;

    fn try_from(response: async_graphql::Response) -> Result<Self, Self::Error> {
        serde_json::from_value(serde_json::to_value(&response)?)
    }
}
