#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use hrpanel::auth::jwt::generate_access_token;
use hrpanel::query::Clock;
use hrpanel::store::DocumentStore;
use serde_json::{Value, json};

use common::{SECRET, seed_user, state};

#[actix_web::test]
async fn missing_header_is_forbidden() {
    let (_, state) = state(Clock::System);
    let app = app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/task").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"], "A token is required for authentication");
}

#[actix_web::test]
async fn bad_tokens_are_unauthorized() {
    let (store, state) = state(Clock::System);
    let (_, auth) = seed_user(&store, "admin@acme.mn", "pw").await;
    let token = auth.trim_start_matches("Token ");
    let app = app!(state);

    for header in [
        "Token not-a-jwt".to_string(),
        format!("Bearer {token}"),
        format!("Token {}", generate_access_token("x", "other-secret", 60).unwrap()),
    ] {
        let req = TestRequest::get()
            .uri("/api/task")
            .insert_header(("Authorization", header.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{header}");
    }
}

#[actix_web::test]
async fn token_for_a_deleted_user_is_not_found() {
    let (store, state) = state(Clock::System);
    let (user, auth) = seed_user(&store, "admin@acme.mn", "pw").await;
    store
        .delete_many("user", &[user["_id"].as_str().unwrap().to_string()])
        .await
        .unwrap();
    let app = app!(state);

    let req = TestRequest::get()
        .uri("/api/task")
        .insert_header(("Authorization", auth.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn login_issues_a_working_token() {
    let (store, state) = state(Clock::System);
    let (user, _) = seed_user(&store, "admin@acme.mn", "secret-pw").await;
    let app = app!(state);

    let req = TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "admin@acme.mn", "password": "secret-pw"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let data = &body["data"];
    assert_eq!(data["id"], user["id"]);
    assert_eq!(data["role"], "admin");
    assert!(data.get("password").is_none());

    let req = TestRequest::get()
        .uri("/api/task")
        .insert_header(("Authorization", format!("Token {}", data["token"].as_str().unwrap())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = store
        .find_by_id("user", user["_id"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(stored["lastActive"].is_string());
}

#[actix_web::test]
async fn login_echoes_profile_fields_of_any_shape() {
    let (store, state) = state(Clock::System);
    let (_, auth) = seed_user(&store, "admin@acme.mn", "pw").await;
    let app = app!(state);

    let req = TestRequest::post()
        .uri("/api/user")
        .insert_header(("Authorization", auth.as_str()))
        .set_json(json!({
            "email": "odd@acme.mn",
            "password": "odd-pw",
            "name": {"first": "Bat", "last": "Erdene"},
            "role": ["employee"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "odd@acme.mn", "password": "odd-pw"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["name"], json!({"first": "Bat", "last": "Erdene"}));
    assert_eq!(body["data"]["role"], json!(["employee"]));
    assert!(body["data"]["token"].is_string());
}

#[actix_web::test]
async fn login_failures_are_not_found() {
    let (store, state) = state(Clock::System);
    seed_user(&store, "admin@acme.mn", "secret-pw").await;
    let app = app!(state);

    let cases = [
        (json!({"email": "admin@acme.mn"}), "Email and password are required!"),
        (json!({"email": "who@acme.mn", "password": "x"}), "User not found!"),
        (json!({"email": "admin@acme.mn", "password": "wrong"}), "Password is not valid!"),
    ];
    for (payload, message) in cases {
        let req = TestRequest::post().uri("/api/login").set_json(payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], message);
    }
}

#[actix_web::test]
async fn install_then_initial_reports_found() {
    let (store, state) = state(Clock::System);
    let app = app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/initial").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/install")
        .set_json(json!({"admin": {"email": "boss@acme.mn"}, "setting": {"companyName": "Acme"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/install")
        .set_json(json!({
            "admin": {"email": "boss@acme.mn", "password": "pw", "name": "Boss"},
            "setting": {"companyName": "Acme"}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], "Success");

    let admin = store
        .find_one("user", &hrpanel::store::Filter::eq("email", "boss@acme.mn"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin["role"], "admin");
    assert_eq!(admin["status"], true);
    assert_ne!(admin["password"], "pw");

    let body: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/api/initial").to_request()).await;
    assert_eq!(body["data"], "Found");

    let req = TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "boss@acme.mn", "password": "pw"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn version_and_refresh_are_public() {
    let (_, state) = state(Clock::System);
    let app = app!(state);

    let body: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/api/version").to_request()).await;
    assert_eq!(body["data"]["version"], "1.4.0");
    assert_eq!(body["data"]["server"], env!("CARGO_PKG_VERSION"));

    let resp = test::call_service(&app, TestRequest::post().uri("/api/refresh").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
}
