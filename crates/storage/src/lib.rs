#![forbid(unsafe_code)]
//! Generic persistent-document-store contract and its adapters.

pub mod repository;
pub mod sqlite;

pub use repository::{
    Document, DocumentPath, DocumentStore, Fields, InMemoryStore, Storage, StorageError,
};
