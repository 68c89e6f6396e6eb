use bugdesk::api::{ApiError, Credentials, TrackerClient, bugs, reference, session};
use bugdesk::config::types::ServerConfig;
use bugdesk::types::{CreateBugPayload, UpdateBugPayload};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TrackerClient {
    let config = ServerConfig {
        base_url: server.uri(),
        ..ServerConfig::default()
    };
    TrackerClient::new(&config, 5).expect("valid mock server url")
}

fn json_body(raw: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(raw.to_owned(), "application/json")
}

fn stored_bug(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "priority": {"id": 3, "level": "High", "status": "active"},
        "status": null,
        "assignee": null,
        "createdBy": {"id": 3, "email": "bob.stone@example.com", "firstName": "Bob", "lastName": "Stone", "status": "active"},
        "createdAt": "2025-03-14T10:00:00"
    })
}

// ---------------------------------------------------------------------------
// Bugs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_bugs_decodes_server_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bugs"))
        .respond_with(json_body(include_str!("fixtures/bugs.json")))
        .expect(1)
        .mount(&server)
        .await;

    let bugs = bugs::list_bugs(&client_for(&server)).await.unwrap();
    assert_eq!(bugs.len(), 3);
    assert_eq!(bugs[0].assignee_name(), "John Smith");
    assert_eq!(bugs[1].description, "", "null description reads as empty");
    assert!(bugs[2].created_at.is_none());
}

#[tokio::test]
async fn create_bug_posts_every_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bugs"))
        .and(body_json(json!({
            "title": "Export fails",
            "description": "",
            "priorityId": 3,
            "statusId": null,
            "assigneeId": null,
            "createdByUserId": 3
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(stored_bug(12, "Export fails")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = CreateBugPayload {
        title: "Export fails".into(),
        description: String::new(),
        priority_id: Some(3),
        status_id: None,
        assignee_id: None,
        created_by_user_id: Some(3),
    };
    let bug = bugs::create_bug(&client_for(&server), &payload).await.unwrap();
    assert_eq!(bug.id, 12);
    assert_eq!(bug.creator_name().as_deref(), Some("Bob Stone"));
}

#[tokio::test]
async fn update_bug_puts_to_the_bug_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/bugs/2"))
        .and(body_json(json!({
            "id": 2,
            "title": "Typo on the login page",
            "description": "",
            "priorityId": null,
            "statusId": 3,
            "assigneeId": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_bug(2, "Typo on the login page")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = UpdateBugPayload {
        id: 2,
        title: "Typo on the login page".into(),
        description: String::new(),
        priority_id: None,
        status_id: Some(3),
        assignee_id: Some(1),
    };
    let bug = bugs::update_bug(&client_for(&server), &payload).await.unwrap();
    assert_eq!(bug.title, "Typo on the login page");
}

#[tokio::test]
async fn server_message_becomes_the_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bugs"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Title must not be blank"})),
        )
        .mount(&server)
        .await;

    let payload = CreateBugPayload {
        title: " ".into(),
        description: String::new(),
        priority_id: None,
        status_id: None,
        assignee_id: None,
        created_by_user_id: None,
    };
    let err = bugs::create_bug(&client_for(&server), &payload)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Title must not be blank");
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.server_message(), Some("Title must not be blank"));
}

#[tokio::test]
async fn bare_error_status_is_described() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bugs"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = bugs::list_bugs(&client_for(&server)).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 404 Not Found");
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn redirect_on_a_read_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bugs"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login"))
        .mount(&server)
        .await;

    let err = bugs::list_bugs(&client_for(&server)).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FOUND));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bugs"))
        .respond_with(json_body("[{\"id\": \"twelve\"}]"))
        .mount(&server)
        .await;

    let err = bugs::list_bugs(&client_for(&server)).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "{err:?}");
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn active_listings_are_cached_until_forced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/priorities/active"))
        .respond_with(json_body(include_str!("fixtures/priorities.json")))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = reference::fetch_active_priorities(&client, false).await.unwrap();
    let cached = reference::fetch_active_priorities(&client, false).await.unwrap();
    assert_eq!(first, cached);
    let forced = reference::fetch_active_priorities(&client, true).await.unwrap();
    assert_eq!(forced.len(), 4);
}

#[tokio::test]
async fn failed_load_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/active"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/statuses/active"))
        .respond_with(json_body(include_str!("fixtures/statuses.json")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(reference::load_active_users(&client).await.is_empty());
    assert_eq!(reference::load_active_statuses(&client).await.len(), 4);
    assert!(reference::fetch_active_users(&client, false).await.is_err());
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

fn me_json() -> serde_json::Value {
    json!({
        "id": 3,
        "email": "bob.stone@example.com",
        "firstName": "Bob",
        "lastName": "Stone",
        "role": {"id": 1, "role": "admin"},
        "status": "active"
    })
}

#[tokio::test]
async fn anonymous_session_has_no_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let user = session::current_user(&client_for(&server)).await.unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn login_follows_up_with_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "bob.stone@example.com", "password": "hunter2"})))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/")
                .insert_header("Set-Cookie", "JSESSIONID=abc123; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_json()))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::Password {
        email: "bob.stone@example.com".into(),
        password: "hunter2".into(),
    };
    let user = session::establish(&client_for(&server), &credentials)
        .await
        .unwrap();
    assert_eq!(user.id, 3);
    assert!(user.is_admin());
}

#[tokio::test]
async fn rejected_login_without_message_reads_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = session::login(&client_for(&server), "me@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), session::INVALID_CREDENTIALS);
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn rejected_login_keeps_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Account disabled"})))
        .mount(&server)
        .await;

    let err = session::login(&client_for(&server), "old.timer@example.com", "pw")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Account disabled");
}

#[tokio::test]
async fn session_cookie_is_sent_with_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("cookie", "JSESSIONID=from-browser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_json()))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::SessionCookie("from-browser".into());
    let user = session::establish(&client_for(&server), &credentials)
        .await
        .unwrap();
    assert_eq!(user.full_name(), "Bob Stone");
}

#[tokio::test]
async fn unaccepted_cookie_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let credentials = Credentials::SessionCookie("stale".into());
    let err = session::establish(&client_for(&server), &credentials)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn logout_accepts_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login"))
        .expect(1)
        .mount(&server)
        .await;

    session::logout(&client_for(&server)).await.unwrap();
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

fn registration() -> session::Registration {
    session::Registration {
        email: "new.hire@example.com".into(),
        first_name: "New".into(),
        last_name: "Hire".into(),
        password: "s3cret".into(),
    }
}

#[tokio::test]
async fn register_creates_an_active_user_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/register"))
        .and(body_json(json!({
            "email": "new.hire@example.com",
            "firstName": "New",
            "lastName": "Hire",
            "password": "s3cret",
            "userRoleId": 2,
            "status": "active"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    session::register(&client_for(&server), &registration())
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_registration_reads_the_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Email already registered"))
        .mount(&server)
        .await;

    let err = session::register(&client_for(&server), &registration())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(err.to_string(), "Email already registered");
}

#[tokio::test]
async fn duplicate_registration_without_text_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/register"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = session::register(&client_for(&server), &registration())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), session::EMAIL_TAKEN);
}

#[tokio::test]
async fn profile_update_returns_the_stored_user() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/me"))
        .and(body_json(json!({
            "email": "bob.stone@example.com",
            "firstName": "Robert",
            "lastName": "Stone"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "email": "bob.stone@example.com",
            "firstName": "Robert",
            "lastName": "Stone",
            "status": "active"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let me: bugdesk::types::User = serde_json::from_value(me_json()).unwrap();
    let mut update = session::ProfileUpdate::from_user(&me);
    update.first_name = "Robert".into();
    let updated = session::update_profile(&client_for(&server), &update)
        .await
        .unwrap();
    assert_eq!(updated.full_name(), "Robert Stone");
}

#[tokio::test]
async fn password_change_sends_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/me/password"))
        .and(header("content-type", "text/plain"))
        .and(body_string("correct horse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_json()))
        .expect(1)
        .mount(&server)
        .await;

    session::change_password(&client_for(&server), "correct horse", "correct horse")
        .await
        .unwrap();
}

#[tokio::test]
async fn mismatched_password_is_refused_locally() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/me/password"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for (password, confirmation) in [("one", "two"), ("", "")] {
        let err = session::change_password(&client, password, confirmation)
            .await
            .unwrap_err();
        assert!(matches!(err, session::PasswordChangeError::Mismatch));
        assert_eq!(err.to_string(), "Passwords must match and cannot be empty.");
    }
}

#[tokio::test]
async fn failed_password_change_explains_itself() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/me/password"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = session::change_password(&client_for(&server), "pw", "pw")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), session::PASSWORD_UPDATE_FAILED);
}
