use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::SqliteDocumentStore;
use super::mapping::{fields_to_text, map_document_row, map_fields_row};
use crate::repository::{Document, DocumentPath, DocumentStore, Fields, StorageError, merge_fields};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Fields>, StorageError> {
        let row = sqlx::query("SELECT fields FROM documents WHERE path = ?1")
            .bind(path.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_fields_row).transpose()
    }

    async fn set_document(
        &self,
        path: &DocumentPath,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StorageError> {
        let key = path.to_string();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let fields = if merge {
            let existing = sqlx::query("SELECT fields FROM documents WHERE path = ?1")
                .bind(&key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(conn)?;
            match existing {
                Some(row) => {
                    let mut current = map_fields_row(&row)?;
                    merge_fields(&mut current, fields);
                    current
                }
                None => fields,
            }
        } else {
            fields
        };

        sqlx::query(
            r"
            INSERT INTO documents (path, collection, doc_id, fields, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(path) DO UPDATE SET
                fields = excluded.fields,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&key)
        .bind(path.collection())
        .bind(path.id())
        .bind(fields_to_text(&fields)?)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn query_by_id_set(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT doc_id, fields FROM documents WHERE collection = ");
        qb.push_bind(collection);
        qb.push(" AND doc_id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
        let mut by_id: HashMap<String, Document> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let doc = map_document_row(row)?;
            by_id.insert(doc.id.clone(), doc);
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
