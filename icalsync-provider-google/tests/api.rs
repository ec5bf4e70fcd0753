use chrono::{TimeZone, Utc};
use icalsync_core::{EventStatus, NormalizedEvent, RemoteCalendar, RemoteError, Transparency};
use icalsync_provider_google::GoogleCalendar;
use mockito::{Matcher, Server};
use serde_json::json;

const CALENDAR: &str = "team@group.calendar.google.com";
const EVENTS_PATH: &str = "/calendars/team@group.calendar.google.com/events";

fn event() -> NormalizedEvent {
    NormalizedEvent {
        id: "c5h66p35".to_string(),
        title: "Standup".to_string(),
        description: String::new(),
        location: "Room 4".to_string(),
        status: EventStatus::Confirmed,
        transparency: Transparency::Transparent,
        start: Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()),
        end: None,
        all_day: false,
    }
}

fn event_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "status": status,
        "summary": "Standup",
        "start": { "dateTime": "2025-03-20T09:00:00Z" },
        "end": { "dateTime": "2025-03-20T10:00:00Z" }
    })
}

#[tokio::test]
async fn test_list_follows_pages_and_keeps_cancelled() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::Regex("^showDeleted=true&maxResults=2500$".into()))
        .match_header("authorization", "Bearer token")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [event_json("aaaaa", "confirmed")],
                "nextPageToken": "page-2"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let second = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::UrlEncoded("pageToken".into(), "page-2".into()))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    event_json("bbbbb", "cancelled"),
                    { "id": "ccccc", "status": "cancelled" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = GoogleCalendar::with_base_url(server.url(), "token");
    let events = client.list_all_events(CALENDAR).await.unwrap();

    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["aaaaa", "bbbbb", "ccccc"]);
    assert_eq!(events[0].status, EventStatus::Confirmed);
    assert_eq!(events[0].transparency, Transparency::Opaque);
    assert!(events[1].is_cancelled());
    assert_eq!(events[2].start, None);

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_create_sends_event_with_id() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", EVENTS_PATH)
        .match_body(Matcher::PartialJson(json!({
            "id": "c5h66p35",
            "summary": "Standup",
            "location": "Room 4",
            "status": "confirmed",
            "transparency": "transparent"
        })))
        .with_header("content-type", "application/json")
        .with_body(event_json("c5h66p35", "confirmed").to_string())
        .create_async()
        .await;

    let client = GoogleCalendar::with_base_url(server.url(), "token");
    let created = client.create_event(CALENDAR, &event()).await.unwrap();

    assert_eq!(created.id, "c5h66p35");
    assert_eq!(
        created.end,
        Some(Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap())
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_puts_to_event_path() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PUT", format!("{EVENTS_PATH}/c5h66p35").as_str())
        .match_body(Matcher::PartialJson(json!({ "status": "confirmed" })))
        .with_header("content-type", "application/json")
        .with_body(event_json("c5h66p35", "confirmed").to_string())
        .create_async()
        .await;

    let client = GoogleCalendar::with_base_url(server.url(), "token");
    let updated = client
        .update_event(CALENDAR, "c5h66p35", &event())
        .await
        .unwrap();

    assert_eq!(updated.status, EventStatus::Confirmed);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_and_error_mapping() {
    let mut server = Server::new_async().await;

    server
        .mock("DELETE", format!("{EVENTS_PATH}/aaaaa").as_str())
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("DELETE", format!("{EVENTS_PATH}/bbbbb").as_str())
        .with_status(404)
        .with_body(r#"{"error":{"code":404,"message":"Not Found"}}"#)
        .create_async()
        .await;
    server
        .mock("DELETE", format!("{EVENTS_PATH}/ccccc").as_str())
        .with_status(403)
        .with_body(
            r#"{"error":{"code":403,"errors":[{"reason":"rateLimitExceeded"}],"message":"Rate Limit Exceeded"}}"#,
        )
        .create_async()
        .await;
    server
        .mock("DELETE", format!("{EVENTS_PATH}/ddddd").as_str())
        .with_status(410)
        .with_body(r#"{"error":{"code":410,"message":"Resource has been deleted"}}"#)
        .create_async()
        .await;

    let client = GoogleCalendar::with_base_url(server.url(), "token");

    assert_eq!(client.delete_event(CALENDAR, "aaaaa").await, Ok(()));
    assert!(matches!(
        client.delete_event(CALENDAR, "bbbbb").await,
        Err(RemoteError::NotFound(_))
    ));
    match client.delete_event(CALENDAR, "ccccc").await {
        Err(RemoteError::RateLimited(payload)) => assert!(payload.contains("rateLimitExceeded")),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(matches!(
        client.delete_event(CALENDAR, "ddddd").await,
        Err(RemoteError::RequestFailed(_))
    ));
}

#[tokio::test]
async fn test_ensure_calendar() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/calendars/team@group.calendar.google.com")
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": CALENDAR, "summary": "Team" }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/calendars/missing")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/calendars/expired")
        .with_status(401)
        .create_async()
        .await;

    let client = GoogleCalendar::with_base_url(server.url(), "token");

    assert_eq!(client.ensure_calendar(CALENDAR).await, Ok("Team".to_string()));
    assert!(matches!(
        client.ensure_calendar("missing").await,
        Err(RemoteError::NotFound(_))
    ));
    assert!(matches!(
        client.ensure_calendar("expired").await,
        Err(RemoteError::AuthorizationFailed(_))
    ));
}
