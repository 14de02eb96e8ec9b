// crates/client/src/http.rs
//! `JobsApi` over HTTP with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use bulkadd_core::{ApiError, JobsApi};
use bulkadd_types::{
    Collection, CollectionId, CollectionPage, JobId, JobStatus, SubmissionRequest, SubmitOutcome,
};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::wire::{AddCompaniesBody, AddCompaniesResponse, BulkAddJobBody, ErrorBody};

#[derive(Debug, Clone)]
pub struct HttpJobsApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpJobsApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url,
            timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let resp = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.message())
                .unwrap_or_else(|_| {
                    let text = String::from_utf8_lossy(&bytes).trim().to_string();
                    if text.is_empty() {
                        status.canonical_reason().unwrap_or("unknown error").to_string()
                    } else {
                        text
                    }
                });
            tracing::warn!(status = %status, detail = %detail, "Server rejected request");
            return Err(ApiError::from_status(status.as_u16(), detail));
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

fn collection_path(id: &CollectionId) -> String {
    format!("/collections/{}", urlencoding::encode(id.as_str()))
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn submit_bulk_add(&self, request: &SubmissionRequest) -> Result<SubmitOutcome, ApiError> {
        let url = self.url(&format!("{}/companies", collection_path(request.target())));
        let body = AddCompaniesBody::from(request);
        let resp: AddCompaniesResponse = self.send(self.client.post(url).json(&body)).await?;
        Ok(SubmitOutcome::from_job_id(resp.bulk_add_job_id))
    }

    async fn get_job_status(&self, job_id: JobId) -> Result<JobStatus, ApiError> {
        let url = self.url(&format!("/bulk_add_jobs/{job_id}"));
        let body: BulkAddJobBody = self.send(self.client.get(url)).await?;
        body.into_status(job_id)
    }

    async fn cancel_job(&self, job_id: JobId) -> Result<JobStatus, ApiError> {
        let url = self.url(&format!("/bulk_add_jobs/{job_id}/cancel"));
        let body: BulkAddJobBody = self.send(self.client.put(url)).await?;
        body.into_status(job_id)
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        self.send(self.client.get(self.url("/collections"))).await
    }

    async fn list_collection_items(
        &self,
        collection_id: &CollectionId,
        offset: u64,
        limit: u64,
    ) -> Result<CollectionPage, ApiError> {
        let url = self.url(&format!(
            "{}?offset={offset}&limit={limit}",
            collection_path(collection_id)
        ));
        self.send(self.client.get(url)).await
    }
}
