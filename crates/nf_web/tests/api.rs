use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use nf_core::{ArticleStore, Error, NewArticle, NewUser, Result, User};
use nf_inference::testing::{CannedExtractor, ScriptedModel};
use nf_inference::Summarizer;
use nf_storage::{MemoryStorage, Storage};
use nf_web::auth::JwtService;
use nf_web::clients::{GoogleProfile, IdentityVerifier, NewsItem, NewsSearch, NewsSource};
use nf_web::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const PAGE_URL: &str = "http://example.com/article";
const PAGE_TEXT: &str =
    "Harbour reopens after storm\nShipping resumed on Monday after a week of closures along the coast.";
const LONG_CONTENT: &str =
    "Central bank holds rates steady as inflation cools across most of the region.";

struct FakeGoogle;

#[async_trait]
impl IdentityVerifier for FakeGoogle {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile> {
        match id_token {
            "good-token" => Ok(GoogleProfile {
                email: "ada@example.com".to_string(),
                name: Some("Ada".to_string()),
                picture: Some("https://pics.example.com/ada.png".to_string()),
            }),
            _ => Err(Error::Unauthorized("Google authentication failed".to_string())),
        }
    }
}

struct FakeNews;

#[async_trait]
impl NewsSource for FakeNews {
    async fn search(&self, query: &str) -> Result<NewsSearch> {
        if query == "ratelimit" {
            return Err(Error::Upstream {
                status: Some(429),
                message: "You have made too many requests".to_string(),
            });
        }
        Ok(NewsSearch {
            articles: vec![NewsItem {
                source_id: Some("bbc-news".to_string()),
                source_name: Some("BBC News".to_string()),
                title: Some(format!("About {}", query)),
                url: Some("https://bbc.example/story".to_string()),
                image_url: None,
                published_at: Some("2025-08-19T10:00:00Z".to_string()),
                description: None,
            }],
            total_results: 1,
        })
    }
}

struct TestApp {
    router: Router,
    storage: Storage,
    model: Arc<ScriptedModel>,
    alice: User,
    bob: User,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(ScriptedModel::valid(), Config::default()).await
    }

    async fn build(model: Arc<ScriptedModel>, config: Config) -> Self {
        let storage = Storage::from_backend(MemoryStorage::new());
        let alice = storage
            .users
            .find_or_create_user(NewUser {
                email: "alice@example.com".to_string(),
                name: Some("Alice".to_string()),
                picture: None,
            })
            .await
            .unwrap();
        let bob = storage
            .users
            .find_or_create_user(NewUser {
                email: "bob@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let summarizer = Summarizer::new(
            storage.articles.clone(),
            CannedExtractor::with_pages(&[(PAGE_URL, PAGE_TEXT)]),
            model.clone(),
        );
        let config = Config {
            jwt_secret: SECRET.to_string(),
            ..config
        };
        let state = AppState::new(config, storage.clone(), summarizer)
            .unwrap()
            .with_identity(Arc::new(FakeGoogle))
            .with_news(Arc::new(FakeNews));

        Self {
            router: create_app(state),
            storage,
            model,
            alice,
            bob,
        }
    }

    fn token(&self, user: &User) -> String {
        JwtService::new(SECRET).create_token(user).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn seed_article(&self, user: &User, url: &str, image_url: &str) -> i64 {
        self.storage
            .articles
            .create(NewArticle {
                user_id: user.id,
                url: url.to_string(),
                image_url: Some(image_url.to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn create_article(&self, user: &User, url: &str) -> i64 {
        let (status, body) = self
            .call("POST", "/articles", Some(user), Some(json!({ "url": url })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }
}

fn assert_envelope(body: &Value, code: &str) {
    assert_eq!(body["error"]["code"], code, "unexpected body: {}", body);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_healthz() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_enveloped() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Route GET /nope not found");
}

#[tokio::test]
async fn test_summarize_requires_bearer() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call("POST", "/ai/summarize", None, Some(json!({ "content": LONG_CONTENT })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, "UNAUTHORIZED");

    let request = Request::builder()
        .method("POST")
        .uri("/ai/summarize")
        .header("authorization", "Bearer not-a-jwt")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "content": LONG_CONTENT }).to_string()))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, "UNAUTHORIZED");
    assert_eq!(app.model.calls(), 0);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_unauthorized() {
    let app = TestApp::new().await;
    let ghost = User {
        id: 999,
        ..app.alice.clone()
    };
    let (status, body) = app.call("GET", "/articles", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_summarize_short_content_is_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "content": "too short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");
    assert_eq!(app.model.calls(), 0);
}

#[tokio::test]
async fn test_summarize_unknown_article_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "articleId": 12345 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, "NOT_FOUND");
}

#[tokio::test]
async fn test_summarize_recovers_noisy_model_output() {
    let reply = r#"garbage... {"bullets":["x"],"sentiment":"neutral","impact":"Low - ok"} ..."#;
    let app = TestApp::build(ScriptedModel::replying(&[reply]), Config::default()).await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "content": LONG_CONTENT })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bullets"], json!(["x"]));
    assert_eq!(body["sentiment"], "neutral");
    assert_eq!(body["keywords"], json!([]));
    assert_eq!(body["impact"], "Low - ok");
    assert!(body["savedArticleId"].is_null());
}

#[tokio::test]
async fn test_summarize_url_request_image_replaces_stored_image() {
    let app = TestApp::new().await;
    let existing = app
        .seed_article(&app.alice, PAGE_URL, "http://img/stored.png")
        .await;

    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "url": PAGE_URL, "imageUrl": "http://img/fresh.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["savedArticleId"], existing);
    assert_eq!(body["imageUrl"], "http://img/fresh.png");

    let stored = app.storage.articles.find_by_id(existing).await.unwrap().unwrap();
    assert_eq!(stored.image_url.as_deref(), Some("http://img/fresh.png"));
    assert_eq!(stored.sentiment.as_deref(), Some("positive"));
}

#[tokio::test]
async fn test_summarize_invalid_model_output_is_bad_gateway() {
    let app = TestApp::build(ScriptedModel::replying(&["invalid json"]), Config::default()).await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "content": LONG_CONTENT })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_envelope(&body, "AI_RESPONSE_INVALID");
    assert_eq!(body["error"]["message"], "AI response invalid");
}

#[tokio::test]
async fn test_summarize_url_saves_article_for_caller() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "url": PAGE_URL, "imageUrl": "http://img" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageUrl"], "http://img");
    let saved_id = body["savedArticleId"].as_i64().unwrap();

    let (status, list) = app.call("GET", "/articles", Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], saved_id);
    assert_eq!(list[0]["title"], "Harbour reopens after storm");
    assert_eq!(list[0]["sentiment"], "positive");

    let (_, again) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "url": PAGE_URL })),
        )
        .await;
    assert_eq!(again["savedArticleId"], saved_id);
    let (_, list) = app.call("GET", "/articles", Some(&app.alice), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_summarize_without_persist_saves_nothing() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "url": PAGE_URL, "persist": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["savedArticleId"].is_null());
    let (_, list) = app.call("GET", "/articles", Some(&app.alice), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/ai/summarize")
        .header("authorization", format!("Bearer {}", app.token(&app.alice)))
        .header("content-type", "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");
}

#[tokio::test]
async fn test_model_failure_is_internal_error() {
    let app = TestApp::build(ScriptedModel::failing(), Config::default()).await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "content": LONG_CONTENT })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_envelope(&body, "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "Internal Server Error");
    assert!(body["error"].get("details").is_none());
}

#[tokio::test]
async fn test_error_details_can_be_exposed() {
    let config = Config {
        expose_error_details: true,
        ..Default::default()
    };
    let app = TestApp::build(ScriptedModel::failing(), config).await;
    let (status, body) = app
        .call(
            "POST",
            "/ai/summarize",
            Some(&app.alice),
            Some(json!({ "content": LONG_CONTENT })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Internal Server Error");
    let details = body["error"]["details"].as_str().unwrap();
    assert!(details.contains("Inference error"));
}

#[tokio::test]
async fn test_public_summarize_is_opt_in() {
    let app = TestApp::new().await;
    let (status, _) = app
        .call(
            "POST",
            "/public/ai/summarize",
            None,
            Some(json!({ "content": LONG_CONTENT })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let config = Config {
        public_summarize: true,
        ..Default::default()
    };
    let app = TestApp::build(ScriptedModel::valid(), config).await;
    let (status, body) = app
        .call("POST", "/public/ai/summarize", None, Some(json!({ "url": PAGE_URL })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["savedArticleId"].is_null());

    let (status, body) = app
        .call(
            "POST",
            "/public/ai/summarize",
            Some(&app.bob),
            Some(json!({ "url": PAGE_URL })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["savedArticleId"].is_i64());
}

#[tokio::test]
async fn test_public_summarize_updates_article_by_id_for_anonymous_caller() {
    let config = Config {
        public_summarize: true,
        ..Default::default()
    };
    let app = TestApp::build(ScriptedModel::valid(), config).await;
    let article = app
        .seed_article(&app.alice, PAGE_URL, "http://img/stored.png")
        .await;

    let (status, body) = app
        .call(
            "POST",
            "/public/ai/summarize",
            None,
            Some(json!({ "articleId": article, "imageUrl": "http://img/other.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["savedArticleId"], article);

    let stored = app.storage.articles.find_by_id(article).await.unwrap().unwrap();
    assert_eq!(stored.user_id, app.alice.id);
    assert_eq!(stored.image_url.as_deref(), Some("http://img/other.png"));
}

#[tokio::test]
async fn test_article_crud_and_ownership() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call("POST", "/articles", Some(&app.alice), Some(json!({ "title": "No url" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");

    let (status, created) = app
        .call(
            "POST",
            "/articles",
            Some(&app.alice),
            Some(json!({
                "url": "https://bbc.example/story",
                "title": "Markets rally",
                "sourceId": "bbc-news",
                "publishedAt": "2025-08-19T10:00:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["userId"], app.alice.id);
    assert_eq!(created["sourceId"], "bbc-news");
    let id = created["id"].as_i64().unwrap();

    let path = format!("/articles/{}", id);
    let (status, body) = app
        .call("PUT", &path, Some(&app.bob), Some(json!({ "tags": "finance" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_envelope(&body, "FORBIDDEN");

    let (status, body) = app
        .call("PUT", &path, Some(&app.alice), Some(json!({ "tags": "finance" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], "finance");
    assert_eq!(body["title"], "Markets rally");

    let (status, body) = app
        .call("PUT", "/articles/9999", Some(&app.alice), Some(json!({ "tags": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, "NOT_FOUND");

    let (_, list) = app.call("GET", "/articles", Some(&app.bob), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, body) = app.call("DELETE", &path, Some(&app.bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_envelope(&body, "FORBIDDEN");

    let (status, body) = app.call("DELETE", &path, Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Article deleted");
    assert!(app.storage.articles.find_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_articles_are_listed_newest_first() {
    let app = TestApp::new().await;
    let first = app.create_article(&app.alice, "https://a.example/1").await;
    let second = app.create_article(&app.alice, "https://a.example/2").await;
    let (_, list) = app.call("GET", "/articles", Some(&app.alice), None).await;
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn test_invalid_article_id_is_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app.call("DELETE", "/articles/abc", Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");
}

#[tokio::test]
async fn test_notes_lifecycle() {
    let app = TestApp::new().await;
    let article = app.create_article(&app.alice, "https://a.example/notes").await;
    let other = app.create_article(&app.alice, "https://a.example/other").await;
    let notes = format!("/articles/{}/notes", article);

    let (status, body) = app
        .call("POST", &notes, Some(&app.alice), Some(json!({ "content": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");

    let (status, body) = app
        .call("POST", &notes, Some(&app.bob), Some(json!({ "content": "mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_envelope(&body, "FORBIDDEN");

    let (status, first) = app
        .call("POST", &notes, Some(&app.alice), Some(json!({ "content": "  check sources  " })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["content"], "check sources");
    assert_eq!(first["articleId"], article);
    let note_id = first["id"].as_i64().unwrap();

    app.call("POST", &notes, Some(&app.alice), Some(json!({ "content": "second" })))
        .await;
    let (status, list) = app.call("GET", &notes, Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["check sources", "second"]);

    let note_path = format!("{}/{}", notes, note_id);
    let (status, body) = app
        .call("PUT", &note_path, Some(&app.alice), Some(json!({ "content": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");

    let (status, body) = app
        .call("PUT", &note_path, Some(&app.alice), Some(json!({ "content": "verified" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "verified");

    let wrong_article = format!("/articles/{}/notes/{}", other, note_id);
    let (status, body) = app.call("DELETE", &wrong_article, Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, "NOT_FOUND");

    let (status, body) = app.call("DELETE", &note_path, Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Note deleted");

    let (status, body) = app.call("DELETE", &note_path, Some(&app.alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, "NOT_FOUND");
}

#[tokio::test]
async fn test_news_search() {
    let app = TestApp::new().await;

    let (status, body) = app.call("GET", "/news/search?q=%20a%20", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");

    let (status, body) = app.call("GET", "/news/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, "BAD_REQUEST");

    let (status, body) = app.call("GET", "/news/search?q=rates", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalResults"], 1);
    assert_eq!(body["articles"][0]["title"], "About rates");
    assert_eq!(body["articles"][0]["sourceName"], "BBC News");
    assert!(body["articles"][0]["imageUrl"].is_null());

    let (status, body) = app.call("GET", "/news/search?q=ratelimit", None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_envelope(&body, "EXTERNAL_API_ERROR");
    assert_eq!(body["error"]["message"], "You have made too many requests");
}

#[tokio::test]
async fn test_google_sign_in() {
    let app = TestApp::new().await;

    let (status, body) = app.call("POST", "/auth/google", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "idToken required");

    let (status, body) = app
        .call("POST", "/auth/google", None, Some(json!({ "idToken": "forged" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_envelope(&body, "UNAUTHORIZED");

    let (status, body) = app
        .call("POST", "/auth/google", None, Some(json!({ "idToken": "good-token" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["name"], "Ada");
    let user_id = body["id"].as_i64().unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/articles")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, again) = app
        .call("POST", "/auth/google", None, Some(json!({ "idToken": "good-token" })))
        .await;
    assert_eq!(again["id"], user_id);
}
