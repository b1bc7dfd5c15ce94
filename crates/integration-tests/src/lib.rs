//! End-to-end tests for the talent admin app.
//!
//! Each [`TestApp`] serves the real router on an ephemeral port, with two
//! wiremock servers standing in for the identity provider and the HR API.
//! The HTTP client keeps cookies and does not follow redirects, so tests can
//! assert on every hop of the sign-in flow.
//!
//! ```bash
//! cargo test -p talent-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::{Client, Response, redirect::Policy};
use serde_json::{Value, json};
use talent_admin::config::TalentConfig;
use talent_admin::state::AppState;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "TalentManagement";

/// A running app plus its mock collaborators.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub idp: MockServer,
    pub api: MockServer,
}

impl TestApp {
    /// Start the app with anonymous access disabled.
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    pub async fn spawn_with(allow_anonymous_access: bool) -> Self {
        let idp = MockServer::start().await;
        let api = MockServer::start().await;
        mount_discovery(&idp).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let vars = HashMap::from([
            ("TALENT_BASE_URL", base_url.clone()),
            ("TALENT_API_URL", format!("{}/api/v1", api.uri())),
            ("TALENT_OIDC_ISSUER", idp.uri()),
            ("TALENT_OIDC_CLIENT_ID", CLIENT_ID.to_string()),
            (
                "TALENT_ALLOW_ANONYMOUS_ACCESS",
                allow_anonymous_access.to_string(),
            ),
            (
                "TALENT_MENU_PATH",
                concat!(env!("CARGO_MANIFEST_DIR"), "/../admin/static/data/menu.json").to_string(),
            ),
        ]);
        let config =
            TalentConfig::from_vars(&|key: &str| vars.get(key).cloned()).unwrap();
        let state = AppState::from_config(config).unwrap();
        let app = talent_admin::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            idp,
            api,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Run the full authorization code flow for a user with `roles`,
    /// starting from `/auth/login?return_url=...`. Returns the callback
    /// response (a redirect to `return_url` on success).
    pub async fn sign_in(&self, roles: &[&str], return_url: &str) -> Response {
        let start = self
            .get(&format!(
                "/auth/login?return_url={}",
                url::form_urlencoded::byte_serialize(return_url.as_bytes()).collect::<String>()
            ))
            .await;
        assert!(start.status().is_redirection(), "login did not redirect");
        let authorize = Url::parse(location(&start)).unwrap();
        let params: HashMap<String, String> = authorize.query_pairs().into_owned().collect();
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["client_id"], CLIENT_ID);

        let id_token = id_token(&self.idp.uri(), &params["nonce"], roles);
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token(roles),
                "id_token": id_token,
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": "openid profile email",
            })))
            .mount(&self.idp)
            .await;

        self.get(&format!(
            "/callback?code=auth-code&state={}",
            params["state"]
        ))
        .await
    }
}

/// The `Location` header of a redirect.
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Access token the mock provider issues for `roles`.
pub fn access_token(roles: &[&str]) -> String {
    format!("access-{}", roles.join("-"))
}

async fn mount_discovery(idp: &MockServer) {
    let issuer = idp.uri();
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/authorize"),
            "token_endpoint": format!("{issuer}/token"),
            "userinfo_endpoint": format!("{issuer}/userinfo"),
            "end_session_endpoint": format!("{issuer}/logout"),
            "code_challenge_methods_supported": ["S256"],
        })))
        .mount(idp)
        .await;
}

/// An unsigned ID token carrying `nonce` and a `role` claim.
pub fn id_token(issuer: &str, nonce: &str, roles: &[&str]) -> String {
    let now = chrono::Utc::now().timestamp();
    let payload: Value = json!({
        "sub": "user-1",
        "name": "Pat Doe",
        "email": "pat.doe@example.com",
        "role": roles,
        "nonce": nonce,
        "iss": issuer,
        "aud": CLIENT_ID,
        "iat": now,
        "exp": now + 3600,
    });
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// A one-item paged body for `/Employees/Paged`.
pub fn employee_page() -> Value {
    json!({
        "items": [{
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "employeeNumber": "E-100",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phoneNumber": "555-0100",
            "hireDate": "2024-03-04T00:00:00",
            "gender": 1,
            "salary": 72500.5,
            "departmentId": null,
            "positionId": null,
            "salaryRangeId": null
        }],
        "pageNumber": 1,
        "pageSize": 10,
        "totalPages": 1,
        "totalCount": 1,
        "hasPreviousPage": false,
        "hasNextPage": false
    })
}
