//! Project detail view against a mock backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::tests::common::{agent_log, envelope, project, services, settle};
use crate::tui::events::{AppEvent, NotificationLevel};
use crate::tui::views::project::{ChapterEntry, ProjectAction, ProjectTab, ProjectViewState};

async fn mount_get(server: &MockServer, outline: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("p1", outline, &[("2", "two"), ("1", "one"), ("draft", "x")]),
            json!([agent_log("Store", "load")]),
        )))
        .expect(expected)
        .mount(server)
        .await;
}

fn idle(view: &mut ProjectViewState) -> bool {
    view.poll();
    !view.is_busy() && !view.is_loading()
}

#[tokio::test]
async fn test_load_populates_snapshot_and_chapters() {
    let server = MockServer::start().await;
    mount_get(&server, "Act one.", 1).await;
    let (services, _rx) = services(&server);

    let mut view = ProjectViewState::new("p1");
    assert!(view.load(&services));
    assert!(!view.load(&services));
    assert!(view.is_loading());
    assert_eq!(view.pending(), Some(ProjectAction::Load));
    settle(|| idle(&mut view)).await;

    assert_eq!(view.project().map(|p| p.outline.as_str()), Some("Act one."));
    assert_eq!(view.logs().len(), 1);
    assert_eq!(
        view.chapter_entries(),
        vec![
            ChapterEntry::Written(1),
            ChapterEntry::Written(2),
            ChapterEntry::Next(3),
        ]
    );
}

#[tokio::test]
async fn test_outline_refreshes_snapshot_before_release() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/outline"))
        .and(body_json(json!({ "total_words": 80000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("p1", "Outline from mutation", &[]),
            json!([agent_log("Outliner", "outline")]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "Outline after refresh", 1).await;
    let (services, mut rx) = services(&server);

    let mut view = ProjectViewState::new("p1");
    assert!(view.start_outline(&services));
    assert_eq!(view.pending(), Some(ProjectAction::Outline));
    settle(|| idle(&mut view)).await;

    let project = view.project().unwrap();
    assert_eq!(project.outline, "Outline after refresh");
    assert_eq!(view.logs()[0].agent, "Store");
    assert!(view.error().is_none());

    match rx.try_recv() {
        Ok(AppEvent::Notification(n)) => assert_eq!(n.level, NotificationLevel::Success),
        other => panic!("expected success notification, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_action_while_pending_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/outline"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(project("p1", "o", &[]), json!([])))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/characters"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/p1/rag/stats"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_get(&server, "o", 1).await;
    let (services, _rx) = services(&server);

    let mut view = ProjectViewState::new("p1");
    assert!(view.start_outline(&services));
    assert!(!view.start_characters(&services));
    assert!(!view.start_outline(&services));
    assert!(!view.refresh_stats(&services));
    assert!(!view.open_knowledge_base(&services));
    assert_eq!(view.tab(), ProjectTab::Overview);
    assert_eq!(view.pending(), Some(ProjectAction::Outline));

    settle(|| idle(&mut view)).await;
}

#[tokio::test]
async fn test_failed_mutation_keeps_snapshot_and_skips_refresh() {
    let server = MockServer::start().await;
    mount_get(&server, "Original outline", 1).await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/characters"))
        .respond_with(ResponseTemplate::new(502).set_body_string("llm timeout"))
        .expect(1)
        .mount(&server)
        .await;
    let (services, mut rx) = services(&server);

    let mut view = ProjectViewState::new("p1");
    view.load(&services);
    settle(|| idle(&mut view)).await;

    assert!(view.start_characters(&services));
    settle(|| idle(&mut view)).await;

    assert_eq!(view.project().unwrap().outline, "Original outline");
    assert!(view.error().unwrap().contains("502"));
    assert_eq!(view.logs().len(), 1);

    match rx.try_recv() {
        Ok(AppEvent::Notification(n)) => assert_eq!(n.level, NotificationLevel::Error),
        other => panic!("expected error notification, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mutation_waits_for_slow_reload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(project("p1", "STALE", &[]), json!([])))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/outline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("p1", "MUTATED", &[]),
            json!([]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/p1/characters"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("p1", "FRESH", &[]),
            json!([agent_log("Store", "refresh")]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = ProjectViewState::new("p1");
    assert!(view.load(&services));
    assert!(!view.start_outline(&services));
    assert!(!view.start_characters(&services));
    assert_eq!(view.pending(), Some(ProjectAction::Load));
    settle(|| idle(&mut view)).await;
    assert_eq!(view.project().unwrap().outline, "STALE");

    assert!(view.start_outline(&services));
    settle(|| idle(&mut view)).await;

    assert_eq!(view.project().unwrap().outline, "FRESH");
    assert_eq!(view.logs()[0].action, "refresh");
}

#[tokio::test]
async fn test_knowledge_base_loads_stats_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p1/rag/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!({
                "outline": { "chunks": 4, "last_updated_at": null },
                "chapter": { "chunks": 12, "last_updated_at": "2024-05-01T10:20:30Z" }
            }),
            json!([]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = ProjectViewState::new("p1");
    assert!(view.open_knowledge_base(&services));
    assert_eq!(view.pending(), Some(ProjectAction::RagStats));
    settle(|| idle(&mut view)).await;

    let stats = view.rag_stats().unwrap();
    let names: Vec<&str> = stats.keys().map(String::as_str).collect();
    assert_eq!(names, ["chapter", "outline"]);
    assert_eq!(stats["chapter"].chunks, 12);

    view.open_overview();
    assert!(view.open_knowledge_base(&services));
    assert!(!view.is_busy());
}
