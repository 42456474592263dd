// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Handler tests driven through the router with `tower::ServiceExt`.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http_body_util::BodyExt;
use tower::ServiceExt;
use vesper_core::Store;
use vesper_server::{AppState, Credentials, router};

const USER: &str = "vesper";
const PASS: &str = "hunter2";

async fn app() -> (Router, Store) {
    let store = Store::open(None).await.expect("in-memory store");
    let state = AppState {
        store: store.clone(),
        credentials: Some(Credentials {
            username: USER.to_string(),
            password: PASS.to_string(),
        }),
    };
    (router(state), store)
}

fn basic_auth() -> String {
    format!("Basic {}", BASE64.encode(format!("{USER}:{PASS}")))
}

fn event_ics(uid: &str, summary: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\nBEGIN:VEVENT\r\nUID:{uid}\r\nDTSTAMP:20250101T000000Z\r\nDTSTART:20250601T090000Z\r\nDTEND:20250601T093000Z\r\nSUMMARY:{summary}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
    let response = app.clone().oneshot(request).await.expect("infallible");
    (response.status(), response)
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth())
}

async fn local_calendar_id(app: &Router, store: &Store) -> String {
    // Principal PROPFIND lazily creates the local calendar.
    let (status, _) = send(
        app,
        authed("PROPFIND", "/api/caldav/")
            .header("Depth", "0")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    store
        .calendars
        .get_local()
        .await
        .unwrap()
        .expect("local calendar")
        .id
}

#[tokio::test]
async fn missing_credentials_fail_closed_with_503() {
    let store = Store::open(None).await.unwrap();
    let app = router(AppState {
        store,
        credentials: None,
    });

    let (status, _) = send(
        &app,
        Request::builder()
            .method("PROPFIND")
            .uri("/api/caldav/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn wrong_credentials_get_a_basic_challenge() {
    let (app, _store) = app().await;

    let bad = format!("Basic {}", BASE64.encode("vesper:wrong"));
    let (status, response) = send(
        &app,
        Request::builder()
            .method("PROPFIND")
            .uri("/api/caldav/")
            .header(header::AUTHORIZATION, bad)
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Basic realm=\"vesper\"")
    );
}

#[tokio::test]
async fn options_advertises_caldav_without_auth() {
    let (app, _store) = app().await;

    let (status, response) = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/api/caldav/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let dav = response.headers().get("DAV").unwrap().to_str().unwrap();
    assert!(dav.contains("calendar-access"));
    let allow = response
        .headers()
        .get(header::ALLOW)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(allow.contains("PROPFIND") && allow.contains("REPORT"));
}

#[tokio::test]
async fn principal_propfind_lists_calendars_at_depth_1() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;

    let (status, response) = send(
        &app,
        authed("PROPFIND", "/api/caldav/")
            .header("Depth", "1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/xml; charset=utf-8")
    );
    let body = body_text(response).await;
    assert!(body.contains("<D:current-user-principal>"));
    assert!(body.contains("<C:calendar-home-set>"));
    assert!(body.contains(&format!("/api/caldav/calendars/{calendar_id}/")));
    assert!(body.contains("<C:calendar/>"));
}

#[tokio::test]
async fn put_then_get_round_trips_the_raw_object() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;
    let ics = event_ics("e1", "Standup");

    let (status, response) = send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::from(ics.clone()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let etag = response
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(etag.starts_with('"'));

    let (status, response) = send(
        &app,
        authed("GET", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ETAG).unwrap().to_str().unwrap(),
        etag
    );
    assert_eq!(body_text(response).await, ics);
}

#[tokio::test]
async fn put_update_enforces_if_match() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;

    let (_, response) = send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::from(event_ics("e1", "Standup")))
            .unwrap(),
    )
    .await;
    let etag = response
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Stale If-Match is rejected and changes nothing.
    let (status, _) = send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .header(header::IF_MATCH, "\"stale\"")
            .body(Body::from(event_ics("e1", "Hijacked")))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    let stored = store.events.get(&calendar_id, "e1").await.unwrap().unwrap();
    assert_eq!(stored.title, "Standup");
    assert_eq!(stored.etag, etag);

    // The right If-Match goes through.
    let (status, _) = send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .header(header::IF_MATCH, etag)
            .body(Body::from(event_ics("e1", "Standup (moved)")))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let stored = store.events.get(&calendar_id, "e1").await.unwrap().unwrap();
    assert_eq!(stored.title, "Standup (moved)");
}

#[tokio::test]
async fn put_into_remote_backed_calendar_is_refused() {
    let (app, store) = app().await;
    let account = store
        .accounts
        .insert(vesper_core::NewAccount {
            server_url: "https://dav.example.com/cal/".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            display_name: "Remote".to_string(),
        })
        .await
        .unwrap();
    let calendar = store
        .calendars
        .insert_remote(&account.id, "/cal/personal/", "Remote", None, None)
        .await
        .unwrap();

    let (status, _) = send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{}/e1.ics", calendar.id))
            .body(Body::from(event_ics("e1", "X")))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_put_body_is_a_400() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;

    let (status, _) = send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/x.ics"))
            .body(Body::from("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nno end"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_and_then_404s() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;

    send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::from(event_ics("e1", "Standup")))
            .unwrap(),
    )
    .await;

    let (status, _) = send(
        &app,
        authed("DELETE", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        authed("DELETE", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn calendar_propfind_depth_1_lists_etags_without_data() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;
    send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::from(event_ics("e1", "Standup")))
            .unwrap(),
    )
    .await;

    let (status, response) = send(
        &app,
        authed("PROPFIND", &format!("/api/caldav/calendars/{calendar_id}/"))
            .header("Depth", "1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let body = body_text(response).await;
    assert!(body.contains(&format!("/api/caldav/calendars/{calendar_id}/e1.ics")));
    assert!(body.contains("<D:getetag>"));
    assert!(body.contains("<CS:getctag>"));
    assert!(!body.contains("calendar-data"));
}

#[tokio::test]
async fn report_query_honors_time_range_and_data_request() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;
    send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/june.ics"))
            .body(Body::from(event_ics("june", "In June")))
            .unwrap(),
    )
    .await;

    // An event in another month.
    let other = event_ics("july", "In July")
        .replace("20250601T090000Z", "20250701T090000Z")
        .replace("20250601T093000Z", "20250701T093000Z");
    send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/july.ics"))
            .body(Body::from(other))
            .unwrap(),
    )
    .await;

    let query = r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <C:filter><C:comp-filter name="VCALENDAR"><C:comp-filter name="VEVENT">
    <C:time-range start="20250601T000000Z" end="20250630T000000Z"/>
  </C:comp-filter></C:comp-filter></C:filter>
</C:calendar-query>"#;

    let (status, response) = send(
        &app,
        authed("REPORT", &format!("/api/caldav/calendars/{calendar_id}/"))
            .body(Body::from(query))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let body = body_text(response).await;
    assert!(body.contains("june.ics"));
    assert!(!body.contains("july.ics"));
    assert!(body.contains("SUMMARY:In June"));

    // Without calendar-data in the prop list the payload is omitted.
    let lean_query = r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/></D:prop>
  <C:filter><C:comp-filter name="VCALENDAR"/></C:filter>
</C:calendar-query>"#;
    let (_, response) = send(
        &app,
        authed("REPORT", &format!("/api/caldav/calendars/{calendar_id}/"))
            .body(Body::from(lean_query))
            .unwrap(),
    )
    .await;
    let body = body_text(response).await;
    assert!(body.contains("<D:getetag>"));
    assert!(!body.contains("SUMMARY:"));
}

#[tokio::test]
async fn report_multiget_resolves_hrefs_and_omits_misses() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;
    send(
        &app,
        authed("PUT", &format!("/api/caldav/calendars/{calendar_id}/e1.ics"))
            .body(Body::from(event_ics("e1", "Standup")))
            .unwrap(),
    )
    .await;

    let multiget = format!(
        r#"<C:calendar-multiget xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/><C:calendar-data/></D:prop>
  <D:href>/api/caldav/calendars/{calendar_id}/e1.ics</D:href>
  <D:href>/api/caldav/calendars/{calendar_id}/ghost.ics</D:href>
</C:calendar-multiget>"#
    );

    let (status, response) = send(
        &app,
        authed("REPORT", &format!("/api/caldav/calendars/{calendar_id}/"))
            .body(Body::from(multiget))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let body = body_text(response).await;
    assert!(body.contains("e1.ics"));
    assert!(body.contains("SUMMARY:Standup"));
    assert!(!body.contains("ghost.ics"));
}

#[tokio::test]
async fn post_tunneling_reaches_propfind_and_report() {
    let (app, store) = app().await;
    let calendar_id = local_calendar_id(&app, &store).await;

    let (status, response) = send(
        &app,
        authed("POST", "/api/caldav/")
            .header("X-Original-Method", "PROPFIND")
            .header("Depth", "1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert!(body_text(response).await.contains("calendar-home-set"));

    let query = r#"<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:prop><D:getetag/></D:prop>
  <C:filter><C:comp-filter name="VCALENDAR"/></C:filter>
</C:calendar-query>"#;
    let (status, _) = send(
        &app,
        authed("POST", &format!("/api/caldav/calendars/{calendar_id}/"))
            .header("X-Original-Method", "REPORT")
            .body(Body::from(query))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn unknown_calendar_is_404() {
    let (app, _store) = app().await;

    let (status, _) = send(
        &app,
        authed("PROPFIND", "/api/caldav/calendars/nope/")
            .header("Depth", "0")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        authed("GET", "/api/caldav/calendars/nope/e1.ics")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
