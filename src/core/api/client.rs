//! Typed HTTP client for the novel-writing backend.
//!
//! Translates typed calls into REST requests against the configured base URL.
//! Non-2xx responses become [`ApiError::Http`] carrying the status and the raw
//! body text. 2xx bodies are decoded into an [`ApiResponse`] and returned
//! whole; checking the envelope's `error` is left to the caller
//! (see [`ApiResponse::into_parts`]).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use super::types::{
    ApiResponse, CharactersRequest, CreateProjectRequest, ExpandChapterRequest,
    ExpandChapterResult, OutlineRequest, ProjectState, RagPreview, RagPreviewQuery, RagStats,
};
use crate::config::ApiConfig;

/// Backend API client. Cloning shares the underlying connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Client for `base_url` with default settings.
    pub fn with_base_url(base_url: &str) -> ApiResult<Self> {
        Self::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, project_id: &str, suffix: &str) -> String {
        format!(
            "{}/projects/{}{}",
            self.base_url,
            urlencoding::encode(project_id),
            suffix
        )
    }

    fn builder(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client.request(method, url)
    }

    fn post_json<B: Serialize>(&self, url: &str, body: &B) -> ApiResult<RequestBuilder> {
        let payload = serde_json::to_vec(body)?;
        Ok(self.builder(Method::POST, url).body(payload))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<ApiResponse<T>> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::debug!("Backend returned {status}: {text}");
            return Err(ApiError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    // ── Projects ────────────────────────────────────────────────────────

    /// `POST /projects`
    #[instrument(skip(self, payload), fields(genre = %payload.genre))]
    pub async fn create_project(
        &self,
        payload: &CreateProjectRequest,
    ) -> ApiResult<ApiResponse<ProjectState>> {
        let url = format!("{}/projects", self.base_url);
        self.send(self.post_json(&url, payload)?).await
    }

    /// `GET /projects/{id}`
    #[instrument(skip(self))]
    pub async fn get_project(&self, project_id: &str) -> ApiResult<ApiResponse<ProjectState>> {
        let url = self.project_url(project_id, "");
        self.send(self.builder(Method::GET, &url)).await
    }

    /// `POST /projects/{id}/outline`
    #[instrument(skip(self, payload))]
    pub async fn generate_outline(
        &self,
        project_id: &str,
        payload: &OutlineRequest,
    ) -> ApiResult<ApiResponse<ProjectState>> {
        let url = self.project_url(project_id, "/outline");
        self.send(self.post_json(&url, payload)?).await
    }

    /// `POST /projects/{id}/characters`
    #[instrument(skip(self, payload))]
    pub async fn generate_characters(
        &self,
        project_id: &str,
        payload: &CharactersRequest,
    ) -> ApiResult<ApiResponse<ProjectState>> {
        let url = self.project_url(project_id, "/characters");
        self.send(self.post_json(&url, payload)?).await
    }

    // ── Chapters ────────────────────────────────────────────────────────

    /// `POST /projects/{id}/chapters/{n}/expand`
    #[instrument(skip(self, payload))]
    pub async fn expand_chapter(
        &self,
        project_id: &str,
        chapter: u32,
        payload: &ExpandChapterRequest,
    ) -> ApiResult<ApiResponse<ExpandChapterResult>> {
        let url = self.project_url(project_id, &format!("/chapters/{chapter}/expand"));
        self.send(self.post_json(&url, payload)?).await
    }

    // ── Retrieval diagnostics ───────────────────────────────────────────

    /// `GET /projects/{id}/rag/stats`
    #[instrument(skip(self))]
    pub async fn rag_stats(&self, project_id: &str) -> ApiResult<ApiResponse<RagStats>> {
        let url = self.project_url(project_id, "/rag/stats");
        self.send(self.builder(Method::GET, &url)).await
    }

    /// `GET /projects/{id}/rag/preview`
    #[instrument(skip(self))]
    pub async fn rag_preview(
        &self,
        project_id: &str,
        params: &RagPreviewQuery,
    ) -> ApiResult<ApiResponse<RagPreview>> {
        let url = self.project_url(project_id, "/rag/preview");
        let request = self.builder(Method::GET, &url).query(&params.to_pairs());
        self.send(request).await
    }
}
