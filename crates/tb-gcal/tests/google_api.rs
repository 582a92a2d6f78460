//! Integration tests for the Google Calendar client against a mock server.

use chrono::{TimeZone, Utc};
use serde_json::json;
use tb_core::{EventSource, PaletteSource, SourceError};
use tb_gcal::{Client, GcalError};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ya29.test-token";

fn client(server: &MockServer) -> Client {
    Client::with_api_base(TOKEN, "primary", &server.uri()).expect("client should build")
}

fn google_event(id: &str, color: Option<&str>, start: &str, end: &str) -> serde_json::Value {
    let mut event = json!({
        "id": id,
        "summary": format!("event {id}"),
        "start": {"dateTime": start},
        "end": {"dateTime": end},
    });
    if let Some(color) = color {
        event["colorId"] = json!(color);
    }
    event
}

#[tokio::test]
async fn list_events_sends_window_and_expands_recurring() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(query_param("timeMin", "2025-05-16T04:00:00Z"))
        .and(query_param("timeMax", "2025-05-17T04:00:00Z"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                google_event("a", Some("1"), "2025-05-16T10:00:00-04:00", "2025-05-16T11:00:00-04:00"),
                google_event("b", None, "2025-05-16T16:00:00-04:00", "2025-05-16T17:00:00-04:00"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2025, 5, 16, 4, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 5, 17, 4, 0, 0).unwrap();
    let events = client(&server).list_events(start, end).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id.as_deref(), Some("a"));
    assert_eq!(events[0].category_tag.as_deref(), Some("1"));
    assert_eq!(events[0].duration_minutes(), 60);
    assert_eq!(events[1].category_tag, None);
}

#[tokio::test]
async fn list_events_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [google_event("p1", Some("2"), "2025-05-16T09:00:00Z", "2025-05-16T09:30:00Z")],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [google_event("p2", Some("2"), "2025-05-16T10:00:00Z", "2025-05-16T10:45:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2025, 5, 16, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 5, 17, 0, 0, 0).unwrap();
    let events = client(&server).fetch_events(start, end).await.unwrap();

    let ids: Vec<_> = events.iter().filter_map(|e| e.id.as_deref()).collect();
    assert_eq!(ids, ["p1", "p2"]);
}

#[tokio::test]
async fn list_events_surfaces_api_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2025, 5, 16, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 5, 17, 0, 0, 0).unwrap();

    let err = client(&server).fetch_events(start, end).await.unwrap_err();
    assert!(matches!(err, GcalError::Api { status: 401, .. }));

    let err = client(&server).list_events(start, end).await.unwrap_err();
    assert!(matches!(err, SourceError::Unavailable { .. }));
    assert!(err.to_string().contains("Invalid Credentials"));
}

#[tokio::test]
async fn get_event_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/evt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_event(
            "evt-1",
            Some("5"),
            "2025-05-16T10:00:00Z",
            "2025-05-16T10:20:00Z",
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Not Found"}
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let event = client.get_event("evt-1").await.unwrap().unwrap();
    assert_eq!(event.summary.as_deref(), Some("event evt-1"));
    assert_eq!(event.duration_minutes(), 20);

    assert_eq!(client.get_event("missing").await.unwrap(), None);
}

#[tokio::test]
async fn get_palette_reads_event_colors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/colors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#colors",
            "calendar": {"1": {"background": "#ac725e", "foreground": "#1d1d1d"}},
            "event": {
                "1": {"background": "#a4bdfc", "foreground": "#1d1d1d"},
                "2": {"background": "#7ae7bf", "foreground": "#1d1d1d"}
            }
        })))
        .mount(&server)
        .await;

    let palette = client(&server).get_palette().await.unwrap();
    assert_eq!(palette.len(), 2);
    assert_eq!(palette["1"].background, "#a4bdfc");
    assert_eq!(palette["2"].background, "#7ae7bf");
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/colors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_palette().await.unwrap_err();
    assert!(matches!(err, GcalError::InvalidResponse(_)));
}
