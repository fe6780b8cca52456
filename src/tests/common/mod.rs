//! Common Test Utilities
//!
//! Mock-backend fixtures shared by the integration suites:
//! - `Services` wired to a `wiremock` server
//! - JSON builders for the response envelope and its payloads
//! - `settle`, which drives a view's `poll()` until its requests resolve

use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::MockServer;

use crate::config::GenerationConfig;
use crate::core::api::ApiClient;
use crate::tui::events::AppEvent;
use crate::tui::services::Services;

const SETTLE_ATTEMPTS: usize = 500;
const SETTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Services pointed at `server`, plus the receiving end of the app channel.
pub fn services(server: &MockServer) -> (Services, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let api = ApiClient::with_base_url(&server.uri()).expect("mock server uri is a valid base url");
    (Services::new(api, GenerationConfig::default(), tx), rx)
}

/// Call `step` until it reports done, yielding to spawned request tasks in
/// between. Panics if the view never settles.
pub async fn settle(mut step: impl FnMut() -> bool) {
    for _ in 0..SETTLE_ATTEMPTS {
        if step() {
            return;
        }
        tokio::time::sleep(SETTLE_INTERVAL).await;
    }
    panic!("view did not settle");
}

/// Successful envelope.
pub fn envelope(data: Value, agent_logs: Value) -> Value {
    json!({ "data": data, "agent_logs": agent_logs })
}

pub fn agent_log(agent: &str, action: &str) -> Value {
    json!({
        "ts": "2024-05-01T10:20:30Z",
        "agent": agent,
        "action": action,
        "summary": format!("{agent} {action}"),
        "output_preview": null
    })
}

/// Project snapshot with the given `(chapter key, text)` entries.
pub fn project(id: &str, outline: &str, chapters: &[(&str, &str)]) -> Value {
    let chapters: serde_json::Map<String, Value> = chapters
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    json!({
        "id": id,
        "genre": "Science fiction",
        "setting": "An orbital station",
        "style": "Terse",
        "keywords": "station, amnesia",
        "audience": "Adults",
        "target_chapters": 10,
        "outline": outline,
        "characters": { "Mira": { "role": "engineer" } },
        "characters_text": "Mira, station engineer.",
        "chapters": chapters,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:20:30Z"
    })
}

pub fn chunk(id: &str, channel: &str, chapter_no: Option<u32>) -> Value {
    json!({
        "id": id,
        "type": "chapter",
        "score": 0.75,
        "channel": channel,
        "chapter_no": chapter_no,
        "source_id": format!("src-{id}"),
        "snippet": format!("snippet {id}")
    })
}
