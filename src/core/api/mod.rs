//! Backend REST API: typed client, wire types, and errors.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use types::{
    chapter_number, non_empty, AgentLog, ApiErrorBody, ApiResponse, CharactersRequest, CreateProjectRequest,
    CriticIssue, ExpandChapterRequest, ExpandChapterResult, OutlineRequest, ProjectState,
    RagPreview, RagPreviewQuery, RagStats, RagStatsItem, RetrievedChunkSummary,
};
