use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use iris_client::{
    ApiClient, ApiError, ApiResponse, AuthTokens, HttpRequest, HttpResponse, HttpTransport,
    Method, Model, RequestOptions, Session, User, REFRESH_PATH,
};
use iris_core::canvas::{build_model_version_data, create_canvas_node};
use iris_core::{Position, SimpleEntityKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[derive(Clone, Copy)]
enum RefreshMode {
    Issue,
    Reject,
    Unreachable,
    /// Rejects this refresh token and issues tokens for any other.
    Revoked(&'static str),
}

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// In-memory backend. Accepts `Bearer fresh` only, so the initial `stale`
/// token always needs a refresh.
struct FakeBackend {
    refresh: RefreshMode,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
    handler: Handler,
}

impl FakeBackend {
    fn new(refresh: RefreshMode) -> Self {
        Self::with_handler(refresh, |request| {
            if request.header("Authorization") == Some("Bearer fresh") {
                HttpResponse::new(200, r#"{"ok": true}"#)
            } else {
                HttpResponse::new(401, r#"{"detail": "Token expired"}"#)
            }
        })
    }

    fn with_handler(
        refresh: RefreshMode,
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            refresh,
            refresh_delay: Duration::from_millis(20),
            refresh_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> iris_client::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if request.path == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.refresh_delay).await;
            let presented = request
                .body
                .as_deref()
                .and_then(|body| serde_json::from_slice::<Value>(body).ok())
                .and_then(|body| body["refresh_token"].as_str().map(str::to_string));
            let refresh = match self.refresh {
                RefreshMode::Revoked(token) if presented.as_deref() == Some(token) => {
                    RefreshMode::Reject
                }
                RefreshMode::Revoked(_) => RefreshMode::Issue,
                mode => mode,
            };
            return match refresh {
                RefreshMode::Issue => Ok(HttpResponse::new(
                    200,
                    r#"{"access_token": "fresh", "refresh_token": "r2", "token_type": "bearer", "expires_in": 900}"#,
                )),
                RefreshMode::Reject => Ok(HttpResponse::new(
                    401,
                    r#"{"detail": "Invalid refresh token"}"#,
                )),
                RefreshMode::Unreachable => Err(ApiError::transport("connection reset")),
                RefreshMode::Revoked(_) => unreachable!(),
            };
        }
        Ok((self.handler)(&request))
    }
}

fn user() -> User {
    User {
        id: "u1".to_string(),
        username: "alice".to_string(),
        role: "architect".to_string(),
        is_active: true,
    }
}

fn logged_in(backend: &Arc<FakeBackend>, access_token: &str) -> ApiClient {
    let session = Session::new();
    session.set_auth(AuthTokens::bearer(access_token, "r"), user());
    ApiClient::new(backend.clone(), session)
}

fn jwt(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

fn model_json(version: u64) -> Value {
    json!({
        "id": "m1", "model_type": "simple", "current_version": version, "name": "Checkout",
        "description": "Checkout flow", "data": {}, "created_at": "2024-01-01T00:00:00Z",
        "created_by": "u1", "updated_at": "2024-01-01T00:00:00Z", "is_deleted": false, "tags": []
    })
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Issue));
    let client = logged_in(&backend, "stale");

    let (models, entities) = tokio::join!(
        client.fetch("/api/models", RequestOptions::get()),
        client.fetch("/api/entities", RequestOptions::get()),
    );

    assert_eq!(models.unwrap(), ApiResponse::Json(json!({"ok": true})));
    assert_eq!(entities.unwrap(), ApiResponse::Json(json!({"ok": true})));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(client.session().access_token().as_deref(), Some("fresh"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("r2"));
    assert_eq!(client.session().current_user(), Some(user()));

    let refresh = &backend.requests_to(REFRESH_PATH)[0];
    assert_eq!(refresh.method, Method::Post);
    assert_eq!(refresh.header("Authorization"), None);
    let body: Value = serde_json::from_slice(refresh.body.as_ref().unwrap()).unwrap();
    assert_eq!(body, json!({"refresh_token": "r"}));
}

#[tokio::test]
async fn later_401_starts_a_new_refresh() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Issue));
    let client = logged_in(&backend, "stale");

    client.fetch("/api/models", RequestOptions::get()).await.unwrap();
    client
        .session()
        .update_tokens(AuthTokens::bearer("stale-again", "r2"));
    client.fetch("/api/models", RequestOptions::get()).await.unwrap();

    assert_eq!(backend.refresh_calls(), 2);
}

#[tokio::test]
async fn abandoned_refresh_is_not_resumed_after_new_login() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Revoked("r")));
    let client = logged_in(&backend, "stale");

    let abandoned = tokio::time::timeout(
        Duration::from_millis(5),
        client.fetch("/api/models", RequestOptions::get()),
    )
    .await;
    assert!(abandoned.is_err());

    client
        .session()
        .set_auth(AuthTokens::bearer("stale", "r-new"), user());
    let response = client.fetch("/api/models", RequestOptions::get()).await;

    assert_eq!(response.unwrap(), ApiResponse::Json(json!({"ok": true})));
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().access_token().as_deref(), Some("fresh"));
    let presented: Vec<Value> = backend
        .requests_to(REFRESH_PATH)
        .iter()
        .map(|r| serde_json::from_slice(r.body.as_ref().unwrap()).unwrap())
        .collect();
    assert_eq!(
        presented,
        vec![json!({"refresh_token": "r"}), json!({"refresh_token": "r-new"})]
    );
}

#[tokio::test]
async fn abandoned_refresh_does_not_keep_client_alive() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Issue));
    let client = logged_in(&backend, "stale");

    let abandoned = tokio::time::timeout(Duration::from_millis(5), client.try_refresh()).await;
    assert!(abandoned.is_err());
    assert_eq!(backend.refresh_calls(), 1);

    drop(client);
    assert_eq!(Arc::strong_count(&backend), 1);
}

#[tokio::test]
async fn rejected_refresh_clears_session() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Reject));
    let client = logged_in(&backend, "stale");

    let err = client
        .fetch("/api/models", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(backend.refresh_calls(), 1);
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().current_user(), None);
}

#[tokio::test]
async fn unreachable_refresh_clears_session() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Unreachable));
    let client = logged_in(&backend, "stale");

    assert!(!client.try_refresh().await);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn still_unauthorized_after_refresh() {
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, |_| {
        HttpResponse::new(401, r#"{"detail": "Account disabled"}"#)
    }));
    let client = logged_in(&backend, "stale");

    let err = client
        .fetch("/api/models", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(backend.requests_to("/api/models").len(), 2);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn no_refresh_without_refresh_token() {
    let backend = Arc::new(FakeBackend::new(RefreshMode::Issue));
    let client = ApiClient::new(backend.clone(), Session::new());

    assert!(!client.try_refresh().await);
    let err = client
        .fetch("/api/models", RequestOptions::get())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn no_content_is_empty() {
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, |_| {
        HttpResponse::new(204, "")
    }));
    let client = logged_in(&backend, "fresh");

    let response = client
        .fetch("/api/models/m1", RequestOptions::delete().if_match(3))
        .await
        .unwrap();
    assert_eq!(response, ApiResponse::Empty);

    client.delete_model("m1", 3).await.unwrap();
    let sent = backend.requests_to("/api/models/m1");
    assert_eq!(sent[1].method, Method::Delete);
    assert_eq!(sent[1].header("If-Match"), Some("3"));
    assert_eq!(sent[1].header("Authorization"), Some("Bearer fresh"));
}

#[tokio::test]
async fn error_detail_becomes_message() {
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, |request| {
        match request.path.as_str() {
            "/api/models/missing" => HttpResponse::new(404, r#"{"detail": "Not found"}"#),
            _ => HttpResponse::new(500, "upstream exploded"),
        }
    }));
    let client = logged_in(&backend, "fresh");

    let err = client.get_model("missing").await.unwrap_err();
    assert!(
        matches!(err, ApiError::Status { status: 404, ref message } if message == "Not found"),
        "{err:?}"
    );

    let err = client.get_model("broken").await.unwrap_err();
    assert!(
        matches!(err, ApiError::Status { status: 500, ref message } if message == "Internal Server Error"),
        "{err:?}"
    );
    assert_eq!(err.status(), Some(500));
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn login_reads_user_from_token() {
    let access = jwt(json!({"sub": "u-7", "role": "architect", "exp": 4_102_444_800u64}));
    let tokens = json!({"access_token": access, "refresh_token": "r", "token_type": "bearer", "expires_in": 900});
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, move |request| {
        match request.path.as_str() {
            "/api/auth/login" => HttpResponse::new(200, tokens.to_string()),
            _ => HttpResponse::new(404, ""),
        }
    }));
    let client = ApiClient::new(backend.clone(), Session::new());

    let user = client.login("bob", "hunter2").await.unwrap();
    assert_eq!(user.id, "u-7");
    assert_eq!(user.username, "bob");
    assert_eq!(user.role, "architect");
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().access_token_expiry(), Some(4_102_444_800_000));

    let sent = &backend.requests_to("/api/auth/login")[0];
    let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
    assert_eq!(body, json!({"username": "bob", "password": "hunter2"}));
}

#[tokio::test]
async fn bad_credentials_do_not_refresh() {
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, |_| {
        HttpResponse::new(401, r#"{"detail": "Invalid credentials"}"#)
    }));
    let client = logged_in(&backend, "old");

    let err = client.login("bob", "wrong").await.unwrap_err();
    assert!(
        matches!(err, ApiError::Status { status: 401, ref message } if message == "Invalid credentials"),
        "{err:?}"
    );
    assert_eq!(backend.refresh_calls(), 0);
    assert_eq!(client.session().access_token().as_deref(), Some("old"));
}

#[tokio::test]
async fn logout_clears_even_if_server_fails() {
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, |_| {
        HttpResponse::new(500, "")
    }));
    let client = logged_in(&backend, "fresh");

    client.logout().await;

    assert!(!client.session().is_authenticated());
    let sent = backend.requests_to("/api/auth/logout");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("Authorization"), Some("Bearer fresh"));
}

#[tokio::test]
async fn save_model_version_puts_document_with_version_guard() {
    let backend = Arc::new(FakeBackend::with_handler(RefreshMode::Issue, |request| {
        match (request.method, request.path.as_str()) {
            (Method::Put, "/api/models/m1") => HttpResponse::new(200, model_json(5).to_string()),
            _ => HttpResponse::new(404, ""),
        }
    }));
    let client = logged_in(&backend, "fresh");

    let model: Model = serde_json::from_value(model_json(4)).unwrap();
    let nodes = vec![create_canvas_node(
        "n1",
        "Cart",
        SimpleEntityKind::Service.into(),
        Position::new(40.0, 60.0),
        Some("e1"),
        None,
    )];
    let data = build_model_version_data(&nodes, &[]);

    let saved = client
        .save_model_version(&model, &data, Some("moved cart"))
        .await
        .unwrap();
    assert_eq!(saved.current_version, 5);

    let sent = &backend.requests_to("/api/models/m1")[0];
    assert_eq!(sent.header("If-Match"), Some("4"));
    let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
    assert_eq!(body["name"], "Checkout");
    assert_eq!(body["change_summary"], "moved cart");
    assert_eq!(body["data"]["placements"][0]["entity_id"], "e1");
    assert_eq!(body["data"]["canvas"]["grid"]["size"], 20);
}
