//! Project creation form against a mock backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::tests::common::{agent_log, envelope, project, services, settle};
use crate::tui::views::create::{CreateOutcome, CreateProjectState, FormField};

#[tokio::test]
async fn test_create_navigates_with_returned_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            project("proj-42", "", &[]),
            json!([agent_log("Planner", "create"), agent_log("Indexer", "index")]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = CreateProjectState::new();
    assert!(view.submit(&services));
    assert!(view.is_busy());

    let mut opened = None;
    settle(|| {
        if let Some(CreateOutcome::OpenProject(id)) = view.poll() {
            opened = Some(id);
        }
        !view.is_busy()
    })
    .await;

    assert_eq!(opened.as_deref(), Some("proj-42"));
    assert_eq!(view.logs().len(), 2);
    assert!(view.error().is_none());
}

#[tokio::test]
async fn test_create_failure_shows_error_and_stays() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_string("planner crashed"))
        .expect(1)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = CreateProjectState::new();
    assert!(view.submit(&services));

    let mut opened = false;
    settle(|| {
        opened |= view.poll().is_some();
        !view.is_busy()
    })
    .await;

    assert!(!opened);
    let error = view.error().unwrap();
    assert!(error.contains("500"), "{error}");
    assert!(error.contains("planner crashed"), "{error}");
}

#[tokio::test]
async fn test_missing_genre_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = CreateProjectState::new();
    view.set_field(FormField::Genre, "  ");
    assert!(!view.submit(&services));
    assert!(!view.is_busy());
    assert_eq!(view.error(), Some("Genre is required"));
}

#[tokio::test]
async fn test_submit_refused_while_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(project("proj-1", "", &[]), json!([])))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let (services, _rx) = services(&server);

    let mut view = CreateProjectState::new();
    assert!(view.submit(&services));
    assert!(!view.submit(&services));

    settle(|| {
        view.poll();
        !view.is_busy()
    })
    .await;
}
