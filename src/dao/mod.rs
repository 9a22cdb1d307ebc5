/// Key-value document backends.
pub mod document_store;
/// Persisted document shapes.
pub mod models;
/// Typed wrapper over a document store.
pub mod repository;
/// Storage error types.
pub mod storage;
