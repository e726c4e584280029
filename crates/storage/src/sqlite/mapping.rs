use serde_json::Value;
use sqlx::Row;

use crate::repository::{Document, Fields, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn fields_from_text(text: &str) -> Result<Fields, StorageError> {
    match serde_json::from_str::<Value>(text).map_err(ser)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Serialization(format!(
            "document is not an object: {other}"
        ))),
    }
}

pub(crate) fn fields_to_text(fields: &Fields) -> Result<String, StorageError> {
    serde_json::to_string(fields).map_err(ser)
}

pub(crate) fn map_fields_row(row: &sqlx::sqlite::SqliteRow) -> Result<Fields, StorageError> {
    let text: String = row.try_get("fields").map_err(ser)?;
    fields_from_text(&text)
}

pub(crate) fn map_document_row(row: &sqlx::sqlite::SqliteRow) -> Result<Document, StorageError> {
    let id: String = row.try_get("doc_id").map_err(ser)?;
    Ok(Document {
        id,
        fields: map_fields_row(row)?,
    })
}
