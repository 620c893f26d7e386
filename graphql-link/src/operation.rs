use getset::{Getters, MutGetters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Caller supplied metadata that travels with an operation through the link
/// chain. It is never sent to the schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationContext(Map<String, Value>);

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the dedup key stored under `field`.
    ///
    /// Only non-empty strings, non-zero numbers and `true` count as a key.
    /// Anything else (missing, `null`, `false`, `""`, `0`, arrays, objects)
    /// means the operation carries no key.
    pub fn dedup_key(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(key) if !key.is_empty() => Some(key.clone()),
            Value::Number(number) if number.as_f64().is_some_and(|n| n != 0.0) => {
                Some(number_key(number))
            }
            Value::Bool(true) => Some(true.to_string()),
            other => {
                log::trace!("Ignoring non-key context value under {}: {}", field, other);
                None
            }
        }
    }
}

/// Integral floats share a key with the matching integer, so `1.0` and `1` both map to `"1"`.
fn number_key(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => (n as i64).to_string(),
        Some(n) => n.to_string(),
        None => number.to_string(),
    }
}

/// A GraphQL request descriptor handed from link to link.
#[derive(Clone, Debug, PartialEq, Getters, MutGetters)]
#[getset(get = "pub")]
pub struct Operation {
    query: String,
    operation_name: Option<String>,
    variables: Map<String, Value>,
    #[getset(get_mut = "pub")]
    context: OperationContext,
}

impl Operation {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: Map::new(),
            context: OperationContext::new(),
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_context(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(field, value);
        self
    }

    /// Name used in logs and errors.
    pub fn display_name(&self) -> &str {
        self.operation_name.as_deref().unwrap_or("<anonymous>")
    }

    #[cfg(feature = "graphql")]
    pub fn into_graphql_request(self) -> async_graphql::Request {
        let request = async_graphql::Request::new(self.query).variables(
            async_graphql::Variables::from_json(Value::Object(self.variables)),
        );
        match self.operation_name {
            Some(name) => request.operation_name(name),
            None => request,
        }
    }
}
