//! HTTP object storage speaking the Firebase Storage v0 REST dialect.
//!
//! Upload: `POST {endpoint}/v0/b/{bucket}/o?uploadType=media&name={path}`
//! with the raw bytes as body. The returned metadata carries
//! `downloadTokens`, which make the object fetchable at
//! `{endpoint}/v0/b/{bucket}/o/{encoded path}?alt=media&token={token}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tandem_contracts::prelude::{ObjectStorage, StorageError, StoredObject};
use tracing::{debug, warn};
use url::Url;

use super::check_object_path;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    #[serde(default)]
    name: Option<String>,
    /// Decimal string in this API
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl ObjectMetadata {
    fn first_token(&self) -> Option<&str> {
        self.download_tokens
            .as_deref()?
            .split(',')
            .map(str::trim)
            .find(|token| !token.is_empty())
    }
}

#[derive(Clone)]
pub struct RestObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    auth_token: Option<String>,
}

impl std::fmt::Debug for RestObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestObjectStorage")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

impl RestObjectStorage {
    pub fn new(
        endpoint: &str,
        bucket: impl Into<String>,
        auth_token: Option<String>,
    ) -> Result<Self, StorageError> {
        let parsed = Url::parse(endpoint).map_err(|err| {
            StorageError::Transport(format!("invalid endpoint {endpoint}: {err}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| {
                StorageError::Transport(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint: parsed.as_str().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            auth_token,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

pub fn object_url(endpoint: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/v0/b/{}/o/{}",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(bucket),
        urlencoding::encode(path)
    )
}

pub fn upload_url(
    endpoint: &str,
    bucket: &str,
    path: &str,
) -> Result<Url, StorageError> {
    let base = format!(
        "{}/v0/b/{}/o",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(bucket)
    );
    Url::parse_with_params(&base, &[("uploadType", "media"), ("name", path)])
        .map_err(|err| StorageError::Transport(format!("invalid upload URL: {err}")))
}

pub fn media_url(endpoint: &str, bucket: &str, path: &str, token: &str) -> String {
    format!(
        "{}?alt=media&token={}",
        object_url(endpoint, bucket, path),
        urlencoding::encode(token)
    )
}

pub fn status_error(status: StatusCode, path: &str, body: &str) -> StorageError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::Unauthorized(format!("{path}: {status}"))
        }
        StatusCode::NOT_FOUND => StorageError::NotFound(path.to_string()),
        StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => {
            StorageError::QuotaExceeded
        }
        _ => StorageError::Transport(format!("{path}: {status} {body}")),
    }
}

fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Transport(err.to_string())
}

async fn read_metadata(
    response: reqwest::Response,
    path: &str,
) -> Result<ObjectMetadata, StorageError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(path, %status, "storage request rejected");
        return Err(status_error(status, path, body.trim()));
    }
    response.json::<ObjectMetadata>().await.map_err(transport)
}

#[async_trait]
impl ObjectStorage for RestObjectStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        check_object_path(path)?;
        let url = upload_url(&self.endpoint, &self.bucket, path)?;
        let len = bytes.len() as u64;

        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        let response = self.authorize(request).send().await.map_err(transport)?;
        let metadata = read_metadata(response, path).await?;

        debug!(path, name = ?metadata.name, "object uploaded");
        Ok(StoredObject {
            path: metadata.name.unwrap_or_else(|| path.to_string()),
            size: metadata
                .size
                .as_deref()
                .and_then(|size| size.parse().ok())
                .unwrap_or(len),
            content_type: metadata
                .content_type
                .unwrap_or_else(|| content_type.to_string()),
        })
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        check_object_path(path)?;
        let url = object_url(&self.endpoint, &self.bucket, path);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        let metadata = read_metadata(response, path).await?;

        let token = metadata.first_token().ok_or_else(|| {
            StorageError::NotFound(format!("{path}: object has no download token"))
        })?;
        Ok(media_url(&self.endpoint, &self.bucket, path, token))
    }
}
