//! Conversions between typed records and stored field maps.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use storage::repository::{Fields, StorageError};

pub(crate) fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StorageError> {
    match serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

pub(crate) fn from_fields<T: DeserializeOwned>(fields: Fields) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(fields))
}
