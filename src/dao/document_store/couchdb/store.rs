use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::info;

use crate::dao::{
    document_store::{DocumentKey, DocumentStore},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchOperation, CouchResult},
    models::{CouchDocument, RevisionOnly, doc_id},
};

/// Document store keeping one CouchDB document per logical key.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    config: Arc<CouchConfig>,
}

impl CouchDocumentStore {
    /// Connect to CouchDB, creating the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder().build().map_err(CouchDaoError::Client)?;
        let store = Self {
            client,
            config: Arc::new(config),
        };
        store.ensure_database().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    fn database_request(&self, method: Method) -> RequestBuilder {
        self.with_auth(self.client.request(method, self.config.database_url()))
    }

    fn document_request(&self, method: Method, id: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.database_url(), id);
        self.with_auth(self.client.request(method, url))
    }

    async fn send(
        builder: RequestBuilder,
        operation: CouchOperation,
        target: &str,
    ) -> CouchResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                operation,
                target: target.to_string(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.config.database.as_str();
        let probe = Self::send(
            self.database_request(Method::GET),
            CouchOperation::Probe,
            database,
        )
        .await?;

        match probe.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = Self::send(
                    self.database_request(Method::PUT),
                    CouchOperation::CreateDatabase,
                    database,
                )
                .await?;
                // 412 means another instance created it in the meantime.
                match created.status() {
                    status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => {
                        info!(database, "created CouchDB database");
                        Ok(())
                    }
                    status => Err(CouchDaoError::Status {
                        operation: CouchOperation::CreateDatabase,
                        target: database.to_string(),
                        status,
                    }),
                }
            }
            status => Err(CouchDaoError::Status {
                operation: CouchOperation::Probe,
                target: database.to_string(),
                status,
            }),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, id: &str) -> CouchResult<Option<T>> {
        let response = Self::send(
            self.document_request(Method::GET, id),
            CouchOperation::Read,
            id,
        )
        .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode {
                    target: id.to_string(),
                    source,
                }),
            status => Err(CouchDaoError::Status {
                operation: CouchOperation::Read,
                target: id.to_string(),
                status,
            }),
        }
    }

    async fn store<T: Serialize + ?Sized>(&self, id: &str, body: &T) -> CouchResult<()> {
        let response = Self::send(
            self.document_request(Method::PUT, id).json(body),
            CouchOperation::Write,
            id,
        )
        .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::Status {
                operation: CouchOperation::Write,
                target: id.to_string(),
                status: response.status(),
            })
        }
    }
}

impl DocumentStore for CouchDocumentStore {
    fn load(&self, key: DocumentKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store.fetch::<CouchDocument>(&doc_id(key)).await?;
            Ok(document.map(|document| document.content))
        })
    }

    fn save(&self, key: DocumentKey, document: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = doc_id(key);
            let rev = store
                .fetch::<RevisionOnly>(&id)
                .await?
                .map(|existing| existing.rev);
            store
                .store(&id, &CouchDocument::new(key, rev, document))
                .await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let database = store.config.database.clone();
            let response = Self::send(
                store.database_request(Method::GET),
                CouchOperation::Probe,
                &database,
            )
            .await?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::Status {
                    operation: CouchOperation::Probe,
                    target: database,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn describe(&self) -> &'static str {
        "couchdb"
    }
}
