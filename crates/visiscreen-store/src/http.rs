//! REST JSON document API record store.
//!
//! Records live under `{base_url}/v1/collections/{collection}/documents`:
//! `POST` creates (responds `{"id": ...}`), `GET`/`PUT`/`DELETE` on
//! `.../documents/{id}` read, replace and remove, and `GET` on the collection
//! lists (responds `{"documents": [...]}`).

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;
use tracing::instrument;

use visiscreen_core::record::ScreeningRecord;
use visiscreen_core::traits::{RecordQuery, RecordStore, StoredRecord};

use crate::error::StoreError;

/// Record store backed by a remote document API.
pub struct HttpStore {
    base_url: String,
    collection: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<StoredRecord>,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        collection: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            api_key,
            timeout_secs,
            client,
        })
    }

    fn documents_url(&self) -> Result<Url> {
        let url = format!(
            "{}/v1/collections/{}/documents",
            self.base_url, self.collection
        );
        Url::parse(&url).map_err(|e| anyhow::anyhow!("invalid store URL {url}: {e}"))
    }

    fn document_url(&self, id: &str) -> Result<Url> {
        let mut url = self.documents_url()?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("store URL cannot be a base: {}", self.base_url))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder, id: Option<&str>) -> Result<Response> {
        let response = self.authorize(req).send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_secs)
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            if let Some(id) = id {
                return Err(StoreError::NotFound(id.to_string()).into());
            }
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unauthorized(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status,
                message: body,
            }
            .into());
        }
        Ok(response)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
        response.json().await.map_err(|e| {
            StoreError::Api {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
            .into()
        })
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, record), fields(collection = %self.collection))]
    async fn save(&self, record: &ScreeningRecord) -> Result<String> {
        let req = self.client.post(self.documents_url()?).json(record);
        let response = self.send(req, None).await?;
        let created: CreatedResponse = Self::parse(response).await?;
        tracing::info!(id = %created.id, "saved record");
        Ok(created.id)
    }

    #[instrument(skip(self, record), fields(collection = %self.collection))]
    async fn update(&self, id: &str, record: &ScreeningRecord) -> Result<()> {
        let req = self.client.put(self.document_url(id)?).json(record);
        self.send(req, Some(id)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn get(&self, id: &str) -> Result<StoredRecord> {
        let req = self.client.get(self.document_url(id)?);
        let response = self.send(req, Some(id)).await?;
        Self::parse(response).await
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn list(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>> {
        let mut url = self.documents_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(keyword) = &query.keyword {
                pairs.append_pair("keyword", keyword);
            }
            if let Some(date) = query.exam_date {
                pairs.append_pair("exam_date", &date.format("%Y-%m-%d").to_string());
            }
            pairs.append_pair("limit", &query.limit.to_string());
        }

        let response = self.send(self.client.get(url), None).await?;
        let listed: ListResponse = Self::parse(response).await?;
        // the server may ignore filters; apply them locally as well
        Ok(query.apply(listed.documents))
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn delete(&self, id: &str) -> Result<()> {
        let req = self.client.delete(self.document_url(id)?);
        self.send(req, Some(id)).await?;
        Ok(())
    }
}
