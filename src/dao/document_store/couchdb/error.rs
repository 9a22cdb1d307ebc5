//! Failures of the CouchDB document store.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for CouchDB calls.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// What the store was doing when CouchDB failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouchOperation {
    /// Probing the database.
    Probe,
    /// Creating the database.
    CreateDatabase,
    /// Reading a document or its revision.
    Read,
    /// Writing a document.
    Write,
}

impl std::fmt::Display for CouchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CouchOperation::Probe => "probe",
            CouchOperation::CreateDatabase => "create database",
            CouchOperation::Read => "read",
            CouchOperation::Write => "write",
        })
    }
}

/// Failures that can occur while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// The connection settings are incomplete.
    #[error("CouchDB is not configured: `{var}` is unset")]
    NotConfigured {
        /// Missing environment variable.
        var: &'static str,
    },
    /// The HTTP client could not be built.
    #[error("failed to build the CouchDB client")]
    Client(#[source] reqwest::Error),
    /// The request never got a response.
    #[error("CouchDB {operation} of `{target}` failed")]
    Transport {
        /// Operation in flight.
        operation: CouchOperation,
        /// Database or document id.
        target: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with an unexpected status.
    #[error("CouchDB {operation} of `{target}` returned {status}")]
    Status {
        /// Operation in flight.
        operation: CouchOperation,
        /// Database or document id.
        target: String,
        /// Status returned.
        status: StatusCode,
    },
    /// The response body is not the expected JSON.
    #[error("CouchDB returned an unreadable body for `{target}`")]
    Decode {
        /// Document id.
        target: String,
        /// Decoding failure.
        #[source]
        source: reqwest::Error,
    },
}

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        StorageError::unavailable("couchdb".into(), err)
    }
}
