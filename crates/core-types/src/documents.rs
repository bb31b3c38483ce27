use crate::error::CoreError;
use crate::ids::RemoteId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The key inside algorithm metadata that points at a backtest result.
pub const REMOTE_ID_KEY: &str = "remote_id";

/// Metadata describing an algorithm, as stored against its harness id.
///
/// This is a free-form string-keyed document. The only entry the lookup
/// relies on is `remote_id`; everything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgoMetadata(Map<String, Value>);

impl AlgoMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Extracts the `remote_id` entry.
    ///
    /// Strings are used verbatim and integers are rendered in decimal, since
    /// some writers store the key numerically. Any other JSON type is rejected.
    pub fn remote_id(&self) -> Result<RemoteId, CoreError> {
        match self.0.get(REMOTE_ID_KEY) {
            None => Err(CoreError::MissingField(REMOTE_ID_KEY)),
            Some(Value::String(s)) => Ok(RemoteId::new(s.as_str())),
            Some(Value::Number(n)) => Ok(RemoteId::new(n.to_string())),
            Some(other) => Err(CoreError::InvalidField {
                field: REMOTE_ID_KEY,
                value: other.to_string(),
            }),
        }
    }
}

impl From<Map<String, Value>> for AlgoMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for AlgoMetadata {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::InvalidInput(
                "algo metadata".to_string(),
                format!("expected a JSON object, found {}", other),
            )),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for AlgoMetadata {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A stored backtest result. Its shape is owned by whoever wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BacktestResult(Value);

impl BacktestResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Looks up a top-level key when the result is a JSON object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for BacktestResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remote_id_from_string_entry() {
        let metadata: AlgoMetadata = [("remote_id", json!("R1")), ("owner", json!("desk-a"))]
            .into_iter()
            .collect();
        assert_eq!(metadata.remote_id().unwrap(), RemoteId::new("R1"));
    }

    #[test]
    fn remote_id_from_numeric_entry() {
        let metadata: AlgoMetadata = [("remote_id", json!(9001))].into_iter().collect();
        assert_eq!(metadata.remote_id().unwrap().as_str(), "9001");
    }

    #[test]
    fn missing_remote_id_is_key_not_found() {
        let metadata = AlgoMetadata::new();
        assert_eq!(
            metadata.remote_id(),
            Err(CoreError::MissingField(REMOTE_ID_KEY))
        );
    }

    #[test]
    fn structured_remote_id_is_rejected() {
        let metadata: AlgoMetadata = [("remote_id", json!({"nested": true}))]
            .into_iter()
            .collect();
        assert!(matches!(
            metadata.remote_id(),
            Err(CoreError::InvalidField { field: "remote_id", .. })
        ));
    }

    #[test]
    fn metadata_requires_a_json_object() {
        assert!(AlgoMetadata::try_from(json!([1, 2, 3])).is_err());
        let metadata = AlgoMetadata::try_from(json!({"remote_id": "R1"})).unwrap();
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn backtest_result_exposes_top_level_keys() {
        let result = BacktestResult::new(json!({"pnl": 42}));
        assert_eq!(result.get("pnl"), Some(&json!(42)));
        assert_eq!(result.into_inner(), json!({"pnl": 42}));
    }
}
