//! Chapter expansion view against a mock backend.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::GenerationConfig;
use crate::tests::common::{agent_log, chunk, envelope, project, services, settle};
use crate::tui::events::{AppEvent, NotificationLevel};
use crate::tui::views::chapter::{ChapterAction, ChapterViewState};

fn view(chapter: u32) -> ChapterViewState {
    ChapterViewState::new("p1", chapter, &GenerationConfig::default())
}

fn idle(view: &mut ChapterViewState) -> bool {
    view.poll();
    !view.is_busy() && !view.is_loading()
}

fn preview_body() -> Value {
    envelope(
        json!({
            "query": "the heist",
            "vector_results": [chunk("v1", "vector", Some(1))],
            "keyword_results": [chunk("k1", "keyword", Some(1))],
            "merged_candidates": [chunk("v1", "vector", Some(1)), chunk("k1", "keyword", Some(1))],
            "final_selected": [chunk("v1", "vector", Some(1))],
            "final_selected_grouped": { "vector": [chunk("v1", "vector", Some(1))] },
            "context_string": "[OUTLINE]\n..."
        }),
        json!([agent_log("Retriever", "preview")]),
    )
}

fn expand_body(text: &str, revised: bool) -> Value {
    envelope(
        json!({
            "chapter_number": 2,
            "text": text,
            "context_used": "[OUTLINE] ...",
            "retrieved_context_sources": [chunk("k1", "keyword", Some(1))],
            "critic_issues": [],
            "revised": revised
        }),
        json!([agent_log("Writer", "expand"), agent_log("Critic", "review")]),
    )
}

async fn mount_get(server: &MockServer, chapters: &[(&str, &str)], expected: u64) {
    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("p1", "outline", chapters),
            json!([agent_log("Store", "load")]),
        )))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_seeds_text_from_snapshot() {
    let server = MockServer::start().await;
    mount_get(&server, &[("1", "one"), ("2", "Existing chapter two.")], 1).await;
    let (services, _rx) = services(&server);

    let mut view = view(2);
    view.load(&services);
    settle(|| idle(&mut view)).await;

    assert_eq!(view.text(), "Existing chapter two.");
    assert_eq!(view.logs().len(), 1);
}

#[tokio::test]
async fn test_expand_waits_for_slow_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(
                    project("p1", "outline", &[("2", "OLD TEXT")]),
                    json!([agent_log("Store", "load")]),
                ))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/chapters/2/expand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(expand_body("NEW TEXT", false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("p1", "outline", &[("2", "NEW TEXT")]),
            json!([agent_log("Store", "refresh")]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = view(2);
    assert!(view.load(&services));
    assert!(!view.load(&services));
    assert!(!view.start_expand(&services));
    assert!(!view.toggle_preview(&services));
    assert_eq!(view.pending(), Some(ChapterAction::Load));
    settle(|| idle(&mut view)).await;
    assert_eq!(view.text(), "OLD TEXT");

    assert!(view.start_expand(&services));
    settle(|| idle(&mut view)).await;

    assert_eq!(view.text(), "NEW TEXT");
    assert_eq!(view.logs()[0].action, "refresh");
}

#[tokio::test]
async fn test_preview_on_off_on_fetches_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p1/rag/preview"))
        .and(query_param("chapter", "2"))
        .and(query_param("top_k", "18"))
        .respond_with(ResponseTemplate::new(200).set_body_json(preview_body()))
        .expect(2)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = view(2);
    assert!(view.toggle_preview(&services));
    assert_eq!(view.pending(), Some(ChapterAction::Preview));
    settle(|| idle(&mut view)).await;
    assert_eq!(view.preview().map(|p| p.final_selected.len()), Some(1));

    assert!(view.toggle_preview(&services));
    assert!(!view.is_preview_on());
    assert!(!view.is_busy());
    assert!(!view.refresh_preview(&services));

    assert!(view.toggle_preview(&services));
    settle(|| idle(&mut view)).await;

    // Preview leaves the chapter state alone
    assert!(view.text().is_empty());
    assert!(view.logs().is_empty());
    assert!(view.project().is_none());
}

#[tokio::test]
async fn test_expand_replaces_buffer_and_keeps_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/chapters/2/expand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(expand_body("Fresh chapter two.", true)))
        .expect(1)
        .mount(&server)
        .await;
    // Refresh snapshot does not have chapter 2 yet
    mount_get(&server, &[("1", "one")], 1).await;
    let (services, _rx) = services(&server);

    let mut view = view(2);
    assert!(view.start_expand(&services));
    settle(|| idle(&mut view)).await;

    assert_eq!(view.text(), "Fresh chapter two.");
    let result = view.expand_result().unwrap();
    assert!(result.revised);
    assert_eq!(result.retrieved_context_sources.len(), 1);
    assert_eq!(view.logs()[0].agent, "Store");
    assert!(view.project().is_some());
}

#[tokio::test]
async fn test_refresh_reseeds_buffer_when_chapter_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/chapters/2/expand"))
        .respond_with(ResponseTemplate::new(200).set_body_json(expand_body("Draft text.", false)))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, &[("2", "Stored revision.")], 1).await;
    let (services, _rx) = services(&server);

    let mut view = view(2);
    view.start_expand(&services);
    settle(|| idle(&mut view)).await;

    assert_eq!(view.text(), "Stored revision.");
    assert_eq!(view.expand_result().map(|r| r.text.as_str()), Some("Draft text."));
    assert!(!view.expand_result().unwrap().revised);
}

#[tokio::test]
async fn test_preview_refused_while_expanding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/chapters/2/expand"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(expand_body("t", false))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/p1/rag/preview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(preview_body()))
        .expect(0)
        .mount(&server)
        .await;
    mount_get(&server, &[], 1).await;
    let (services, _rx) = services(&server);

    let mut view = view(2);
    assert!(view.start_expand(&services));
    assert!(!view.toggle_preview(&services));
    assert!(!view.is_preview_on());
    assert!(!view.start_expand(&services));
    assert_eq!(view.pending(), Some(ChapterAction::Expand));

    settle(|| idle(&mut view)).await;
}

#[tokio::test]
async fn test_expand_failure_keeps_buffer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/chapters/2/expand"))
        .respond_with(ResponseTemplate::new(404).set_body_string("project not found"))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, &[], 0).await;
    let (services, mut rx) = services(&server);

    let mut view = view(2);
    assert!(view.start_expand(&services));
    settle(|| idle(&mut view)).await;

    assert!(view.text().is_empty());
    assert!(view.expand_result().is_none());
    let error = view.error().unwrap();
    assert!(error.contains("404") && error.contains("project not found"), "{error}");

    match rx.try_recv() {
        Ok(AppEvent::Notification(n)) => assert_eq!(n.level, NotificationLevel::Error),
        other => panic!("expected error notification, got {other:?}"),
    }
}
