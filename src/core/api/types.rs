//! Wire types exchanged with the novel-writing backend.
//!
//! Every record here is a read-only snapshot owned by the server. Fields the
//! backend may omit carry `#[serde(default)]` so an older or newer server
//! does not break decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};

// ============================================================================
// Envelope
// ============================================================================

/// One audit record per backend agent action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    #[serde(default)]
    pub ts: Option<String>,
    pub agent: String,
    pub action: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub output_preview: Option<String>,
}

/// Structured application error carried inside a 2xx envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Envelope wrapping every endpoint's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    #[serde(default)]
    pub agent_logs: Vec<AgentLog>,
}

impl<T> ApiResponse<T> {
    /// Check the envelope's `error` before handing out `data`.
    ///
    /// A 2xx response with an `error` set, or with no `data`, is an
    /// [`ApiError::Application`].
    pub fn into_parts(self) -> ApiResult<(T, Vec<AgentLog>)> {
        if let Some(err) = self.error {
            return Err(ApiError::Application {
                code: err.code,
                message: err.message,
            });
        }
        match self.data {
            Some(data) => Ok((data, self.agent_logs)),
            None => Err(ApiError::Application {
                code: "empty_data".to_string(),
                message: "response carried no data".to_string(),
            }),
        }
    }
}

// ============================================================================
// Project
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    pub id: String,
    pub genre: String,
    pub setting: String,
    pub style: String,
    pub keywords: String,
    pub audience: String,
    pub target_chapters: u32,
    pub outline: String,
    pub characters: serde_json::Map<String, serde_json::Value>,
    pub characters_text: String,
    /// Chapter number (stringified) to chapter text. A missing key means the
    /// chapter has not been generated.
    pub chapters: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Chapter number a `chapters` key stands for. Surrounding whitespace and
/// leading zeros are accepted; zero and non-numeric keys are not chapters.
pub fn chapter_number(key: &str) -> Option<u32> {
    key.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

impl ProjectState {
    /// Text of a chapter, if it has been generated. The canonical key wins
    /// over equivalent spellings such as `"02"`.
    pub fn chapter_text(&self, chapter: u32) -> Option<&str> {
        self.chapters
            .get(&chapter.to_string())
            .or_else(|| {
                self.chapters
                    .iter()
                    .find(|(key, _)| chapter_number(key) == Some(chapter))
                    .map(|(_, text)| text)
            })
            .map(String::as_str)
    }
}

// ============================================================================
// Retrieval & critic
// ============================================================================

/// One retrieval hit, shared by preview and expansion payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunkSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
    pub channel: String,
    #[serde(default)]
    pub chapter_no: Option<u32>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticIssue {
    pub issue_type: String,
    pub severity: String,
    pub conflict: String,
    #[serde(default)]
    pub evidence_snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandChapterResult {
    pub chapter_number: u32,
    pub text: String,
    #[serde(default)]
    pub context_used: String,
    #[serde(default)]
    pub retrieved_context_sources: Vec<RetrievedChunkSummary>,
    #[serde(default)]
    pub critic_issues: Vec<CriticIssue>,
    #[serde(default)]
    pub revised: bool,
}

/// Diagnostic snapshot of the retrieval pipeline for a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPreview {
    pub query: String,
    pub vector_results: Vec<RetrievedChunkSummary>,
    pub keyword_results: Vec<RetrievedChunkSummary>,
    pub merged_candidates: Vec<RetrievedChunkSummary>,
    pub final_selected: Vec<RetrievedChunkSummary>,
    pub final_selected_grouped: BTreeMap<String, Vec<RetrievedChunkSummary>>,
    pub context_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagStatsItem {
    pub chunks: u64,
    #[serde(default)]
    pub last_updated_at: Option<serde_json::Value>,
}

/// Knowledge-base name to chunk statistics.
pub type RagStats = BTreeMap<String, RagStatsItem>;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_chapters: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_words: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharactersRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandChapterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_words: Option<u32>,
}

/// Query parameters for the retrieval preview endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RagPreviewQuery {
    pub chapter: Option<u32>,
    pub query: Option<String>,
    pub top_k: Option<u32>,
}

impl RagPreviewQuery {
    /// Query-string pairs, keeping only truthy values (non-zero numbers,
    /// non-empty text).
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(chapter) = self.chapter.filter(|c| *c != 0) {
            pairs.push(("chapter", chapter.to_string()));
        }
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("query", query.to_string()));
        }
        if let Some(top_k) = self.top_k.filter(|k| *k != 0) {
            pairs.push(("top_k", top_k.to_string()));
        }
        pairs
    }
}

/// Empty strings become `None` so optional request fields are omitted.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
