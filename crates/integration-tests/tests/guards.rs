//! Route guards, anonymous access and response headers.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;
use talent_integration_tests::{TestApp, location};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_signed_out_user_is_sent_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/employees").await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login?return_url=%2Femployees");
}

#[tokio::test]
async fn test_login_page_starts_flow_with_return_url() {
    let app = TestApp::spawn().await;

    let page = app.get("/login?return_url=%2Fdepartments").await;

    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("/auth/login?return_url=%2Fdepartments"));
}

#[tokio::test]
async fn test_missing_role_is_forbidden() {
    let app = TestApp::spawn().await;
    app.sign_in(&["Employee"], "/dashboard").await;

    let create = app.get("/positions/create").await;
    assert!(create.status().is_redirection());
    assert_eq!(location(&create), "/403");

    let delete = app
        .post_form(
            "/salary-ranges/3fa85f64-5717-4562-b3fc-2c963f66afa6/delete",
            &[("name", "Band A"), ("from", "list")],
        )
        .await;
    assert_eq!(location(&delete), "/403");
}

#[tokio::test]
async fn test_error_pages_keep_their_status() {
    let app = TestApp::spawn().await;

    let response = app.get("/403").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.text().await.unwrap().contains("403"));
}

#[tokio::test]
async fn test_anonymous_access_admits_signed_out_users() {
    let app = TestApp::spawn_with(true).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Dashboard/Metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "totalEmployees": 42,
                "totalDepartments": 5,
                "totalPositions": 9,
                "totalSalaryRanges": 3,
                "newHiresThisMonth": 2,
                "averageSalary": 61000.0,
                "genderDistribution": { "male": 20, "female": 22 }
            },
            "isSuccess": true
        })))
        .mount(&app.api)
        .await;

    let response = app.get("/dashboard").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Dashboard"));
    assert!(body.contains("42"));
}

#[tokio::test]
async fn test_pages_carry_security_headers() {
    let app = TestApp::spawn().await;

    let response = app.get("/login").await;
    let headers = response.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(
        headers["content-security-policy"]
            .to_str()
            .unwrap()
            .contains("frame-ancestors 'none'")
    );
    assert!(headers.contains_key("x-request-id"));
}
