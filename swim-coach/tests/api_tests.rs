//! HTTP API integration tests
//!
//! Drives the router in-process with `oneshot` against an in-memory database.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use futures::future::join_all;
use serde_json::{json, Value};
use std::time::Duration;
use swim_coach::db::users::{create_user, NewUser};
use swim_coach::settings::RuntimeSettings;
use swim_coach::{build_router, AppState};
use swim_common::db::{init_memory_database, Role};
use tower::util::ServiceExt;

// =============================================================================
// Helpers
// =============================================================================

struct TestApp {
    state: AppState,
}

impl TestApp {
    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn send(&self, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        (status, set_cookie, extract_json(response.into_body()).await)
    }
}

async fn setup_app() -> TestApp {
    let pool = init_memory_database().await.unwrap();
    create_user(
        &pool,
        &NewUser {
            email: "coach@pool.test",
            name: "Coach Kim",
            password: "coach-pw",
            role: Role::Coach,
            coach_id: None,
            phone: None,
        },
    )
    .await
    .unwrap();

    TestApp {
        state: AppState::new(pool, RuntimeSettings::default(), "https://swim.test"),
    }
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// `name=value` part of a Set-Cookie header
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let (status, set_cookie, _) = app
        .send("POST", "/api/login", None, Some(json!({"email": email, "password": password})))
        .await;
    assert_eq!(status, StatusCode::OK);
    cookie_pair(&set_cookie.unwrap())
}

/// Registers a parent with one child; returns (parent cookie, pupil id)
async fn enroll_family(app: &TestApp, email: &str) -> (String, String) {
    let (status, set_cookie, _) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "email": email,
                "confirm_email": email,
                "password": "parent-pw",
                "confirm_password": "parent-pw",
                "name": "Alex Parent",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let cookie = cookie_pair(&set_cookie.unwrap());

    let (status, _, pupil) = app
        .send(
            "POST",
            "/api/register/child",
            Some(&cookie),
            Some(json!({"name": "Robin", "date_of_birth": "2018-04-02"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    (cookie, pupil["id"].as_str().unwrap().to_string())
}

async fn submit_video(app: &TestApp, cookie: &str, pupil_id: &str, level: i64) -> String {
    let (status, _, submission) = app
        .send(
            "POST",
            "/api/submissions",
            Some(cookie),
            Some(json!({
                "pupil_id": pupil_id,
                "level_number": level,
                "video_url": format!("videos/{}.mp4", level),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    submission["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_app().await;
    let (status, _, body) = app.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "swim-coach");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = setup_app().await;

    let (status, _, body) = app.send("GET", "/api/levels", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _, _) = app.send("GET", "/api/levels", Some("session=bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = setup_app().await;
    let (status, set_cookie, _) = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({"email": "coach@pool.test", "password": "nope"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(set_cookie.is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = setup_app().await;
    let cookie = login(&app, "coach@pool.test", "coach-pw").await;

    let (status, set_cookie, _) = app.send("POST", "/api/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(set_cookie.unwrap().contains("Max-Age=0"));

    let (status, _, _) = app.send("GET", "/api/levels", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_registration_assigns_coach_and_enrolls_child() {
    let app = setup_app().await;
    let (cookie, pupil_id) = enroll_family(&app, "family@pool.test").await;

    let (status, _, pupils) = app.send("GET", "/api/pupils", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let pupils = pupils.as_array().unwrap();
    assert_eq!(pupils.len(), 1);
    assert_eq!(pupils[0]["id"], pupil_id.as_str());
    assert_eq!(pupils[0]["progress"], 0);

    // The registration window is single-use
    let (status, _, _) = app
        .send("POST", "/api/register/child", Some(&cookie), Some(json!({"name": "Second"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration_validates_and_rejects_duplicates() {
    let app = setup_app().await;

    let (status, _, _) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "email": "a@pool.test",
                "confirm_email": "b@pool.test",
                "password": "pw",
                "confirm_password": "pw",
                "name": "A",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    enroll_family(&app, "dup@pool.test").await;
    let (status, _, _) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "email": "DUP@pool.test",
                "confirm_email": "dup@pool.test",
                "password": "pw",
                "confirm_password": "pw",
                "name": "Dup",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_add_child_enrolls_once() {
    let app = setup_app().await;
    let (status, set_cookie, _) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "email": "race@pool.test",
                "confirm_email": "race@pool.test",
                "password": "parent-pw",
                "confirm_password": "parent-pw",
                "name": "Race Parent",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let cookie = cookie_pair(&set_cookie.unwrap());

    let responses = join_all((0..8).map(|i| {
        app.send(
            "POST",
            "/api/register/child",
            Some(&cookie),
            Some(json!({"name": format!("Child {}", i)})),
        )
    }))
    .await;

    let created = responses.iter().filter(|(s, _, _)| *s == StatusCode::CREATED).count();
    let forbidden = responses.iter().filter(|(s, _, _)| *s == StatusCode::FORBIDDEN).count();
    assert_eq!(created, 1);
    assert_eq!(forbidden, 7);

    let (_, _, pupils) = app.send("GET", "/api/pupils", Some(&cookie), None).await;
    assert_eq!(pupils.as_array().unwrap().len(), 1);
}

// =============================================================================
// Submissions and reviews
// =============================================================================

#[tokio::test]
async fn test_submit_and_review_advances_progress() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;

    let submission_id = submit_video(&app, &parent, &pupil_id, 1).await;

    let (status, _, pending) = app
        .send("GET", "/api/submissions?status=pending", Some(&coach), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], submission_id.as_str());

    let uri = format!("/api/submissions/{}/review", submission_id);
    let (status, _, outcome) = app
        .send("POST", &uri, Some(&coach), Some(json!({"feedback": "Lovely glide", "medal": "GOLD"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["progress"], 1);
    assert_eq!(outcome["previous_progress"], 0);
    assert_eq!(outcome["submission"]["status"], "REVIEWED");
    assert_eq!(outcome["submission"]["medal"], "GOLD");

    // Reviewing twice is a conflict
    let (status, _, body) = app
        .send("POST", &uri, Some(&coach), Some(json!({"medal": "SILVER"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _, overview) = app
        .send("GET", &format!("/api/pupils/{}/levels", pupil_id), Some(&parent), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview[0]["status"], "completed");
    assert_eq!(overview[0]["medal"], "GOLD");
    assert_eq!(overview[1]["status"], "current");
    assert_eq!(overview[2]["status"], "locked");
}

#[tokio::test]
async fn test_review_skipping_levels_is_rejected() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;

    let submission_id = submit_video(&app, &parent, &pupil_id, 3).await;
    let (status, _, _) = app
        .send(
            "POST",
            &format!("/api/submissions/{}/review", submission_id),
            Some(&coach),
            Some(json!({"medal": "GOLD"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, _, pending) = app
        .send("GET", "/api/submissions?status=PENDING", Some(&coach), None)
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_locked_level_finished_by_parts_is_still_rejected() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;

    for part in ["A", "B"] {
        let (status, _, _) = app
            .send(
                "PATCH",
                "/api/level-progress",
                Some(&parent),
                Some(json!({"pupil_id": pupil_id, "level_number": 2, "part": part, "completed": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let submission_id = submit_video(&app, &parent, &pupil_id, 2).await;
    let (status, _, body) = app
        .send(
            "POST",
            &format!("/api/submissions/{}/review", submission_id),
            Some(&coach),
            Some(json!({"medal": "GOLD"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, _, pupils) = app.send("GET", "/api/pupils", Some(&parent), None).await;
    assert_eq!(pupils[0]["progress"], 0);
}

#[tokio::test]
async fn test_coach_marks_submission_read() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;
    let submission_id = submit_video(&app, &parent, &pupil_id, 1).await;

    let (_, _, listed) = app.send("GET", "/api/submissions", Some(&coach), None).await;
    assert_eq!(listed[0]["is_read"], false);

    let uri = format!("/api/submissions/{}/read", submission_id);
    let (status, _, _) = app.send("POST", &uri, Some(&parent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app.send("POST", &uri, Some(&coach), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, listed) = app.send("GET", "/api/submissions", Some(&coach), None).await;
    assert_eq!(listed[0]["is_read"], true);
    assert_eq!(listed[0]["status"], "PENDING", "reading does not review");

    let (status, _, _) = app
        .send(
            "POST",
            &format!("/api/submissions/{}/read", uuid::Uuid::new_v4()),
            Some(&coach),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_checks() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;
    let submission_id = submit_video(&app, &parent, &pupil_id, 1).await;

    let (status, _, _) = app.send("GET", "/api/submissions", Some(&parent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(
            "POST",
            &format!("/api/submissions/{}/review", submission_id),
            Some(&parent),
            Some(json!({"medal": "GOLD"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app.send("GET", "/api/coach/dashboard", Some(&parent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(
            "POST",
            "/api/submissions",
            Some(&coach),
            Some(json!({"pupil_id": pupil_id, "level_number": 1, "video_url": "v.mp4"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_parent_cannot_see_other_families() {
    let app = setup_app().await;
    let (_, pupil_a) = enroll_family(&app, "a@pool.test").await;
    let (parent_b, _) = enroll_family(&app, "b@pool.test").await;

    let (status, _, _) = app
        .send("GET", &format!("/api/pupils/{}/levels", pupil_a), Some(&parent_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app
        .send(
            "POST",
            "/api/submissions",
            Some(&parent_b),
            Some(json!({"pupil_id": pupil_a, "level_number": 1, "video_url": "v.mp4"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_video_url_is_bad_request() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;

    let (status, _, body) = app
        .send(
            "POST",
            "/api/submissions",
            Some(&parent),
            Some(json!({"pupil_id": pupil_id, "level_number": 1, "video_url": "  "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// =============================================================================
// Level parts
// =============================================================================

#[tokio::test]
async fn test_mark_level_parts() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;

    let (status, _, outcome) = app
        .send(
            "PATCH",
            "/api/level-progress",
            Some(&parent),
            Some(json!({"pupil_id": pupil_id, "level_number": 1, "part": "A", "completed": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["level_progress"]["first_part_completed"], true);
    assert_eq!(outcome["level_progress"]["fully_completed"], false);

    let (_, _, outcome) = app
        .send(
            "PATCH",
            "/api/level-progress",
            Some(&parent),
            Some(json!({"pupil_id": pupil_id, "level_number": 1, "part": "B", "completed": true})),
        )
        .await;
    assert_eq!(outcome["newly_fully_completed"], true);
    assert_eq!(outcome["completed_parts"], json!(["A", "B"]));

    let (status, _, _) = app
        .send(
            "PATCH",
            "/api/level-progress",
            Some(&parent),
            Some(json!({"pupil_id": pupil_id, "level_number": 1, "part": "Q", "completed": true})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .send(
            "PATCH",
            "/api/level-progress",
            Some(&parent),
            Some(json!({"pupil_id": pupil_id, "level_number": 77, "part": "A", "completed": true})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Part marking never moves progress
    let (_, _, pupils) = app.send("GET", "/api/pupils", Some(&parent), None).await;
    assert_eq!(pupils[0]["progress"], 0);
}

// =============================================================================
// Dashboard, chat and notifications
// =============================================================================

#[tokio::test]
async fn test_coach_dashboard_counts() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;
    submit_video(&app, &parent, &pupil_id, 1).await;
    app.send("POST", "/api/messages", Some(&parent), Some(json!({"content": "Hello coach"})))
        .await;

    let (status, _, dashboard) = app.send("GET", "/api/coach/dashboard", Some(&coach), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["pupil_count"], 1);
    assert_eq!(dashboard["pending_submission_count"], 1);
    assert_eq!(dashboard["unread_message_count"], 1);
}

#[tokio::test]
async fn test_chat_between_parent_and_coach() {
    let app = setup_app().await;
    let (parent, _) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;

    let (status, _, message) = app
        .send("POST", "/api/messages", Some(&parent), Some(json!({"content": "Is Robin ready?"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let parent_id = message["parent_id"].as_str().unwrap().to_string();
    let message_id = message["id"].as_str().unwrap().to_string();

    // A coach has to name the parent
    let (status, _, _) = app.send("GET", "/api/messages", Some(&coach), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, conversation) = app
        .send("GET", &format!("/api/messages?parent_id={}", parent_id), Some(&coach), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversation.as_array().unwrap().len(), 1);

    // The sender cannot mark their own message as read
    let (_, _, body) = app
        .send("POST", "/api/messages/mark-read", Some(&parent), Some(json!({"ids": [message_id]})))
        .await;
    assert_eq!(body["updated"], 0);

    let (_, _, body) = app
        .send("POST", "/api/messages/mark-read", Some(&coach), Some(json!({"ids": [message_id]})))
        .await;
    assert_eq!(body["updated"], 1);
}

#[tokio::test]
async fn test_review_notifies_parent() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;
    let submission_id = submit_video(&app, &parent, &pupil_id, 1).await;

    app.send(
        "POST",
        &format!("/api/submissions/{}/review", submission_id),
        Some(&coach),
        Some(json!({"medal": "BRONZE"})),
    )
    .await;

    // Delivery runs detached from the request
    let mut notifications = Value::Null;
    for _ in 0..50 {
        let (_, _, body) = app.send("GET", "/api/notifications", Some(&parent), None).await;
        if body.as_array().is_some_and(|n| !n.is_empty()) {
            notifications = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let notifications = notifications.as_array().expect("notification delivered");
    assert_eq!(notifications[0]["title"], "Submission reviewed");
    assert_eq!(notifications[0]["url"], "https://swim.test/app/levels/1");
    assert_eq!(notifications[0]["read"], false);

    let id = notifications[0]["id"].as_str().unwrap();
    let (status, _, _) = app
        .send("POST", &format!("/api/notifications/{}/read", id), Some(&parent), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Someone else's notification is not found
    let (status, _, _) = app
        .send("POST", &format!("/api/notifications/{}/read", id), Some(&coach), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Pupil edits, parents, profile and settings
// =============================================================================

#[tokio::test]
async fn test_coach_edits_pupil_name_and_notes() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;
    let uri = format!("/api/pupils/{}", pupil_id);

    let (status, _, pupil) = app
        .send("PATCH", &uri, Some(&coach), Some(json!({"name": "Robin J", "notes": "Needs goggles"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pupil["name"], "Robin J");
    assert_eq!(pupil["notes"], "Needs goggles");
    assert_eq!(pupil["progress"], 0);

    let (_, _, pupils) = app.send("GET", "/api/pupils", Some(&parent), None).await;
    assert_eq!(pupils[0]["notes"], "Needs goggles");

    let (status, _, _) = app
        .send("PATCH", &uri, Some(&coach), Some(json!({"name": "  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .send("PATCH", &uri, Some(&parent), Some(json!({"notes": "mine"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_coach_cannot_edit_pupil() {
    let app = setup_app().await;
    let (_, pupil_id) = enroll_family(&app, "family@pool.test").await;
    create_user(
        &app.state.db,
        &NewUser {
            email: "other@pool.test",
            name: "Coach Lee",
            password: "other-pw",
            role: Role::Coach,
            coach_id: None,
            phone: None,
        },
    )
    .await
    .unwrap();
    let other = login(&app, "other@pool.test", "other-pw").await;

    let (status, _, _) = app
        .send("PATCH", &format!("/api/pupils/{}", pupil_id), Some(&other), Some(json!({"notes": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_coach_lists_and_edits_parents() {
    let app = setup_app().await;
    let (parent, pupil_id) = enroll_family(&app, "zoe@pool.test").await;
    enroll_family(&app, "adam@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;

    let (status, _, parents) = app.send("GET", "/api/coach/parents", Some(&coach), None).await;
    assert_eq!(status, StatusCode::OK);
    let parents = parents.as_array().unwrap();
    assert_eq!(parents.len(), 2);
    assert!(parents.iter().all(|p| p["pupils"].as_array().unwrap().len() == 1));
    assert!(parents.iter().all(|p| p.get("password_hash").is_none()));

    let zoe = parents.iter().find(|p| p["email"] == "zoe@pool.test").unwrap();
    let uri = format!("/api/coach/parents/{}", zoe["id"].as_str().unwrap());
    let (status, _, detail) = app.send("GET", &uri, Some(&coach), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["pupils"][0]["id"], pupil_id.as_str());

    let (status, _, detail) = app
        .send(
            "PATCH",
            &uri,
            Some(&coach),
            Some(json!({"name": "Zoe Visser", "phone": "0611111111", "email": "Zoe.V@pool.test"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Zoe Visser");
    assert_eq!(detail["email"], "zoe.v@pool.test");

    // The parent now signs in with the new address
    login(&app, "zoe.v@pool.test", "parent-pw").await;

    let (status, _, _) = app
        .send("PATCH", &uri, Some(&coach), Some(json!({"email": "adam@pool.test"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app.send("GET", "/api/coach/parents", Some(&parent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send("GET", &format!("/api/coach/parents/{}", uuid::Uuid::new_v4()), Some(&coach), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update() {
    let app = setup_app().await;
    let (parent, _) = enroll_family(&app, "family@pool.test").await;
    let coach = login(&app, "coach@pool.test", "coach-pw").await;

    let (status, _, profile) = app
        .send("PATCH", "/api/profile", Some(&coach), Some(json!({"bio": "Former lifeguard"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["bio"], "Former lifeguard");
    assert_eq!(profile["name"], "Coach Kim");

    let (status, _, _) = app
        .send("PATCH", "/api/profile", Some(&parent), Some(json!({"bio": "Not a coach"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, profile) = app
        .send("PATCH", "/api/profile", Some(&parent), Some(json!({"name": "Alex P", "phone": "0622222222"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["phone"], "0622222222");

    let (_, _, me) = app.send("GET", "/api/profile", Some(&parent), None).await;
    assert_eq!(me["name"], "Alex P");
    assert_eq!(me["role"], "PARENT");
}

#[tokio::test]
async fn test_user_settings() {
    let app = setup_app().await;
    let (parent, _) = enroll_family(&app, "family@pool.test").await;

    let (status, _, settings) = app.send("GET", "/api/settings", Some(&parent), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        settings,
        json!({"push_notifications": false, "email_notifications": false, "theme": "LIGHT", "language": "en"})
    );

    let (status, _, settings) = app
        .send("PATCH", "/api/settings", Some(&parent), Some(json!({"theme": "DARK", "push_notifications": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["theme"], "DARK");
    assert_eq!(settings["push_notifications"], true);
    assert_eq!(settings["language"], "en");

    let (status, _, body) = app.send("PATCH", "/api/settings", Some(&parent), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "No valid settings to update");

    let (status, _, _) = app
        .send("PATCH", "/api/settings", Some(&parent), Some(json!({"language": "de"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, settings) = app.send("GET", "/api/settings", Some(&parent), None).await;
    assert_eq!(settings["theme"], "DARK");
}
