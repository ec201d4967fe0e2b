//! Account lifecycle over the versioned REST API with process-local adapters.
//!
//! Requests carry the real encrypted session cookie between calls, so these
//! tests cover the session middleware as deployed.

#[path = "support/app.rs"]
mod app_support;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use healthsyntra::inbound::http::{configure_api, json_config};
use serde_json::{Value, json};

use app_support::{Accounts, http_state, session_cookie, session_settings};

struct Reply {
    status: StatusCode,
    body: Value,
}

/// Browser stand-in that remembers the latest session cookie.
#[derive(Default)]
struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    async fn send<S, B>(&mut self, app: &S, request: TestRequest) -> Reply
    where
        S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let request = match &self.cookie {
            Some(cookie) => request.cookie(cookie.clone()),
            None => request,
        };
        let response = test::call_service(app, request.to_request()).await;
        if let Some(cookie) = session_cookie(&response) {
            self.cookie = Some(cookie);
        }
        let status = response.status();
        let bytes = test::read_body(response).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        Reply { status, body }
    }
}

fn credentials(path: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri(path)
        .set_json(json!({ "email": "ada@example.com", "password": password }))
}

fn profile_request() -> TestRequest {
    TestRequest::get().uri("/api/v1/users/me/profile")
}

fn change_plan(plan: &str) -> TestRequest {
    TestRequest::put()
        .uri("/api/v1/users/me/subscription")
        .set_json(json!({ "plan": plan }))
}

#[actix_web::test]
async fn account_lifecycle_keeps_the_tier_across_sessions() {
    let accounts = Accounts::in_memory();
    let settings = session_settings();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(http_state(&accounts, None)))
            .app_data(json_config())
            .wrap(settings.middleware())
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;
    let mut browser = Browser::default();

    let registered = browser
        .send(&app, credentials("/api/v1/register", "correct-horse"))
        .await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.body["email"], "ada@example.com");
    assert_eq!(registered.body["subscriptionPlan"], "free");
    let uid = registered.body["uid"].clone();

    let updated = browser.send(&app, change_plan("premium")).await;
    assert_eq!(updated.status, StatusCode::NO_CONTENT);

    let rejected = browser.send(&app, change_plan("gold")).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let profile = browser.send(&app, profile_request()).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["subscriptionPlan"], "premium");
    assert_eq!(profile.body["uid"], uid);

    let logout = browser
        .send(&app, TestRequest::post().uri("/api/v1/logout"))
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    let signed_out = browser.send(&app, profile_request()).await;
    assert_eq!(signed_out.status, StatusCode::UNAUTHORIZED);

    let login = browser
        .send(&app, credentials("/api/v1/login", "correct-horse"))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["subscriptionPlan"], "premium");
    assert_eq!(login.body["uid"], uid);
}

#[actix_web::test]
async fn deleted_accounts_cannot_sign_in_again() {
    let accounts = Accounts::in_memory();
    let settings = session_settings();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(http_state(&accounts, None)))
            .app_data(json_config())
            .wrap(settings.middleware())
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;
    let mut browser = Browser::default();

    let registered = browser
        .send(&app, credentials("/api/v1/register", "correct-horse"))
        .await;
    assert_eq!(registered.status, StatusCode::OK);

    let deleted = browser
        .send(&app, TestRequest::delete().uri("/api/v1/users/me"))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let profile = browser.send(&app, profile_request()).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);

    let login = browser
        .send(&app, credentials("/api/v1/login", "correct-horse"))
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn duplicate_registration_is_a_conflict() {
    let accounts = Accounts::in_memory();
    let settings = session_settings();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(http_state(&accounts, None)))
            .app_data(json_config())
            .wrap(settings.middleware())
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;
    let mut first = Browser::default();
    let mut second = Browser::default();

    let created = first
        .send(&app, credentials("/api/v1/register", "correct-horse"))
        .await;
    assert_eq!(created.status, StatusCode::OK);

    let duplicate = second
        .send(&app, credentials("/api/v1/register", "another-horse"))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(
        duplicate.body["message"],
        "This email address is already registered. Please login or use a different email."
    );
    assert!(second.cookie.is_none());
}
