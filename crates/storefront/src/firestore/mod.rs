//! Firestore document store client.
//!
//! # Layout
//!
//! - One collection per [`Style`] (`hippie`, `gotico`, ...); each product
//!   document carries `producto`, `cantidad`, `precio`, `imagen` and
//!   optionally `descripcion`.
//! - User accounts live in `usuarios` with `usuario`, `contra`, `createdAt`.
//!
//! # Transport
//!
//! Plain REST (`reqwest`) against `firestore.googleapis.com`, authorized
//! with an OAuth access token, or against the local emulator when
//! `FIRESTORE_EMULATOR_HOST` is set. Stock decrements are read-then-patch
//! with no transaction, so concurrent purchases of the last unit can both
//! succeed.

pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use tity_core::{Product, Style, UserId, Username};

use crate::config::FirestoreConfig;
use crate::db::{ProductRepository, RepositoryError, StockChange};
use crate::models::user::{StoredUser, User};
use types::{
    Document, ErrorResponse, ListDocumentsResponse, RunQueryItem, field_equals_query, fields,
    integer_value, string_value, timestamp_value,
};

/// Page size for collection listings.
const PAGE_SIZE: &str = "300";

/// Errors that can occur when talking to Firestore.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Firestore answered with a non-success status.
    #[error("Firestore returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<FirestoreError> for RepositoryError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::Status { status: 404, .. } => Self::NotFound,
            FirestoreError::Status {
                status: 409,
                message,
            } => Self::Conflict(message),
            FirestoreError::Parse(e) => Self::DataCorruption(e.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Firestore-backed repository.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct FirestoreRepository {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    client: reqwest::Client,
    /// `https://firestore.googleapis.com/v1/` or the emulator equivalent.
    api_root: Url,
    /// `projects/{project}/databases/(default)/documents`
    documents_path: String,
    access_token: Option<SecretString>,
}

impl FirestoreRepository {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Url` if the emulator host is not a valid
    /// authority.
    pub fn new(config: &FirestoreConfig) -> Result<Self, FirestoreError> {
        let (api_root, access_token) = match &config.emulator_host {
            // The emulator accepts any bearer token and grants full access to "owner"
            Some(host) => (
                Url::parse(&format!("http://{host}/v1/"))?,
                Some(SecretString::from("owner")),
            ),
            None => (
                Url::parse("https://firestore.googleapis.com/v1/")?,
                config.access_token.clone(),
            ),
        };

        Ok(Self {
            inner: Arc::new(FirestoreInner {
                client: reqwest::Client::new(),
                api_root,
                documents_path: format!(
                    "projects/{}/databases/(default)/documents",
                    config.project_id
                ),
                access_token,
            }),
        })
    }

    /// URL of a path relative to the documents root.
    fn documents_url(&self, suffix: &str) -> Result<Url, FirestoreError> {
        Ok(self
            .inner
            .api_root
            .join(&format!("{}{suffix}", self.inner.documents_path))?)
    }

    /// URL of a full document resource name.
    fn resource_url(&self, name: &str) -> Result<Url, FirestoreError> {
        Ok(self.inner.api_root.join(name)?)
    }

    /// Send a request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, FirestoreError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = &self.inner.access_token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&response_text).map_or_else(
                |_| response_text.chars().take(200).collect::<String>(),
                |e| format!("{} {}", e.error.status, e.error.message),
            );
            tracing::error!(
                status = %status,
                message = %message,
                "Firestore returned non-success status"
            );
            return Err(FirestoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Firestore response"
            );
            FirestoreError::Parse(e)
        })
    }

    /// First document of `collection` whose `field` equals `value`.
    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, FirestoreError> {
        let url = self.documents_url(":runQuery")?;
        let items: Vec<RunQueryItem> = self
            .send(
                Method::POST,
                url,
                Some(field_equals_query(collection, field, value)),
            )
            .await?;

        Ok(items.into_iter().find_map(|item| item.document))
    }

    /// Every document of a collection, following page tokens.
    async fn list_collection(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.documents_url(&format!("/{collection}"))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: ListDocumentsResponse = self.send(Method::GET, url, None).await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    fn stored_user(doc: &Document, fallback_name: &Username) -> StoredUser {
        let username = doc
            .string(fields::USERNAME)
            .and_then(|s| Username::parse(s).ok())
            .unwrap_or_else(|| fallback_name.clone());

        StoredUser {
            user: User {
                id: UserId::new(doc.id()),
                username,
                created_at: doc.timestamp(fields::CREATED_AT).unwrap_or_default(),
            },
            password_hash: doc.string(fields::PASSWORD).unwrap_or_default().to_owned(),
        }
    }
}

#[async_trait]
impl ProductRepository for FirestoreRepository {
    fn backend(&self) -> &'static str {
        "firestore"
    }

    #[instrument(skip(self))]
    async fn list_products(&self, style: Style) -> Result<Vec<Product>, RepositoryError> {
        let documents = self.list_collection(style.slug()).await?;
        let products: Vec<Product> = documents
            .iter()
            .filter_map(|doc| {
                let product = doc.to_product(style);
                if product.is_none() {
                    tracing::warn!(document = %doc.name, "Skipping product document without a name");
                }
                product
            })
            .collect();

        tracing::debug!(style = %style, count = products.len(), "Loaded products from Firestore");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_stock(&self, style: Style, name: &str) -> Result<u32, RepositoryError> {
        let doc = self.find_one(style.slug(), fields::PRODUCT, name).await?;
        Ok(doc.map_or(0, |d| d.stock()))
    }

    #[instrument(skip(self))]
    async fn decrement_stock(
        &self,
        style: Style,
        name: &str,
        quantity: u32,
    ) -> Result<StockChange, RepositoryError> {
        let Some(doc) = self.find_one(style.slug(), fields::PRODUCT, name).await? else {
            tracing::warn!(style = %style, product = name, "Product not found for stock update");
            return Err(RepositoryError::NotFound);
        };

        let change = StockChange::apply(doc.stock(), quantity);

        let mut url = self.resource_url(&doc.name).map_err(FirestoreError::from)?;
        url.query_pairs_mut()
            .append_pair("updateMask.fieldPaths", fields::QUANTITY);
        let body = json!({
            "fields": { (fields::QUANTITY): integer_value(i64::from(change.remaining)) }
        });
        let _: Document = self.send(Method::PATCH, url, Some(body)).await?;

        tracing::info!(
            style = %style,
            product = name,
            previous = change.previous,
            remaining = change.remaining,
            purchased = quantity,
            "Stock updated"
        );
        Ok(change)
    }

    #[instrument(skip(self))]
    async fn find_user(&self, username: &Username) -> Result<Option<StoredUser>, RepositoryError> {
        let doc = self
            .find_one(fields::USERS_COLLECTION, fields::USERNAME, username.as_str())
            .await?;
        Ok(doc.map(|d| Self::stored_user(&d, username)))
    }

    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        // Firestore has no unique constraints; check first
        if self.find_user(username).await?.is_some() {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }

        let url = self
            .documents_url(&format!("/{}", fields::USERS_COLLECTION))
            .map_err(FirestoreError::from)?;
        let body = json!({
            "fields": {
                (fields::USERNAME): string_value(username.as_str()),
                (fields::PASSWORD): string_value(password_hash),
                (fields::CREATED_AT): timestamp_value(Utc::now()),
            }
        });
        let doc: Document = self.send(Method::POST, url, Some(body)).await?;

        tracing::info!(username = %username, "User created");
        Ok(Self::stored_user(&doc, username).user)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let mut url = self
            .documents_url(&format!("/{}", fields::USERS_COLLECTION))
            .map_err(FirestoreError::from)?;
        url.query_pairs_mut().append_pair("pageSize", "1");
        let _: ListDocumentsResponse = self.send(Method::GET, url, None).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn repo(emulator_host: Option<&str>) -> FirestoreRepository {
        FirestoreRepository::new(&FirestoreConfig {
            project_id: "tienda-3e019".to_owned(),
            access_token: Some(SecretString::from("ya29.token")),
            emulator_host: emulator_host.map(str::to_owned),
        })
        .unwrap()
    }

    #[test]
    fn test_documents_url() {
        let url = repo(None).documents_url("/gotico").unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/tienda-3e019/databases/(default)/documents/gotico"
        );

        let url = repo(None).documents_url(":runQuery").unwrap();
        assert!(url.as_str().ends_with("/documents:runQuery"));
    }

    #[test]
    fn test_emulator_url() {
        let url = repo(Some("localhost:8080")).documents_url("/hippie").unwrap();
        assert!(url.as_str().starts_with("http://localhost:8080/v1/projects/tienda-3e019/"));
    }

    #[test]
    fn test_resource_url_from_document_name() {
        let url = repo(None)
            .resource_url("projects/tienda-3e019/databases/(default)/documents/hippie/abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/tienda-3e019/databases/(default)/documents/hippie/abc"
        );
    }

    #[test]
    fn test_error_mapping() {
        let not_found = FirestoreError::Status {
            status: 404,
            message: String::new(),
        };
        assert!(matches!(
            RepositoryError::from(not_found),
            RepositoryError::NotFound
        ));

        let outage = FirestoreError::Status {
            status: 503,
            message: "UNAVAILABLE".to_owned(),
        };
        assert!(RepositoryError::from(outage).is_unavailable());
    }
}
