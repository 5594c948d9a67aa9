use api::{create_app, AppConfig, AppState};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Stand-in for the three model-serving services.
fn model_services() -> Router {
    Router::new()
        .route(
            "/extract",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({"content": "Hanoi is the capital."}));
                Json(json!({"entities": [{"entity_name": "Hanoi", "entity_type": "LOCATION"}]}))
            }),
        )
        .route(
            "/questions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(
                    body["entities"],
                    json!([{"entity_name": "Hanoi", "entity_type": "LOCATION"}])
                );
                Json(json!({"questions": [{"question": "Why is Hanoi significant?"}]}))
            }),
        )
        .route(
            "/summarize",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(
                    body["question_answer_pairs"],
                    json!([{
                        "question": "Why is Hanoi significant?",
                        "entity": {"entity_name": "Hanoi", "entity_type": "LOCATION"}
                    }])
                );
                assert_eq!(body["summarization_model_name"], "BARTpho");
                assert_eq!(body["search_config"]["kwargs"]["max_new_tokens"], 256);
                Json(json!({"summary": "Hanoi is Vietnam's capital."}))
            }),
        )
}

fn app_with(settings: &[(&str, String)]) -> Router {
    let config = AppConfig::from_lookup(|key| {
        settings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap();
    create_app(AppState::new(&config).unwrap())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = call(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_extract_generate_summarize_clear() {
    let upstream = spawn_upstream(model_services()).await;
    let app = app_with(&[
        ("EXTRACT_ENTITIES_API_URL", format!("{upstream}/extract")),
        ("QUESTION_GENERATION_API_URL", format!("{upstream}/questions")),
        ("SUMMARIZATION_API_URL", format!("{upstream}/summarize")),
    ]);
    let id = new_session(&app).await;
    let text = "Hanoi is the capital.";

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/extract"),
        Some(json!({"text": text})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"entity_choices": ["Hanoi (LOCATION)"]}));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/generate"),
        Some(json!({"text": text, "selected_entities": ["Hanoi (LOCATION)"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let questions_text = body["questions_text"].as_str().unwrap().to_string();
    assert!(questions_text.contains("Why is Hanoi significant?"));
    assert!(questions_text.contains("Hanoi (LOCATION)"));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/summarize"),
        Some(json!({
            "text": text,
            "selected_entities": ["Hanoi (LOCATION)"],
            "questions_text": questions_text,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Hanoi is Vietnam's capital.");

    let (_, state) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(state["summary"], "Hanoi is Vietnam's capital.");
    assert_eq!(state["entity_choices"], json!(["Hanoi (LOCATION)"]));

    let (status, body) = call(&app, Method::POST, &format!("/api/sessions/{id}/clear"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"text": "", "entity_choices": [], "summary": "", "questions_text": ""})
    );

    let (_, state) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(state["text"], "");
    assert_eq!(state["summary"], "");
    assert_eq!(state["questions_text"], "");
    assert_eq!(state["entity_choices"], json!([]));

    let (_, metrics) = call(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(metrics["sessions_created"], 1);
    assert_eq!(metrics["summarize"]["calls"], 1);
    assert_eq!(metrics["summarize"]["fallbacks"], 0);
}

#[tokio::test]
async fn test_unconfigured_endpoints_fall_back() {
    let app = app_with(&[]);
    let id = new_session(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/extract"),
        Some(json!({"text": "Hà Nội"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entity_choices"], json!([]));
    assert!(body["failure"].as_str().is_some());

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/generate"),
        Some(json!({"text": "Hà Nội", "selected_entities": ["Hà Nội (LOCATION)"]})),
    )
    .await;
    assert_eq!(body["questions_text"], "Error occurred while generating questions.");

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/summarize"),
        Some(json!({"text": "Hà Nội"})),
    )
    .await;
    assert_eq!(body["summary"], "Error occurred while summarizing the text.");
}

#[tokio::test]
async fn test_generate_without_selection_is_rejected() {
    let app = app_with(&[]);
    let id = new_session(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/generate"),
        Some(json!({"text": "Hà Nội", "selected_entities": []})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["warning"], "Please select at least one entity.");

    let (_, metrics) = call(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(metrics["generate"]["rejected"], 1);
    assert_eq!(metrics["generate"]["calls"], 0);
}

#[tokio::test]
async fn test_unknown_session() {
    let app = app_with(&[]);
    let missing = uuid::Uuid::new_v4();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{missing}/extract"),
        Some(json!({"text": "t"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = new_session(&app).await;
    let (status, _) = call(&app, Method::DELETE, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_options_and_health() {
    let app = app_with(&[
        ("SUMMARIZATION_MODELS", "BARTpho,ViT5".to_string()),
        ("SUMMARIZATION_API_URL", "http://127.0.0.1:9/summarize".to_string()),
    ]);

    let (_, options) = call(&app, Method::GET, "/api/options", None).await;
    assert_eq!(options["models"], json!(["BARTpho", "ViT5"]));
    assert_eq!(options["default_model"], "BARTpho");
    assert_eq!(options["default_max_new_tokens"], 256);

    let (status, health) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["summarization_configured"], true);
    assert_eq!(health["entity_extraction_configured"], false);
}

#[tokio::test]
async fn test_server_errors_fall_back() {
    let failing = Router::new().fallback(|| async {
        (StatusCode::INTERNAL_SERVER_ERROR, "model unavailable")
    });
    let upstream = spawn_upstream(failing).await;
    let app = app_with(&[
        ("EXTRACT_ENTITIES_API_URL", format!("{upstream}/extract")),
        ("QUESTION_GENERATION_API_URL", format!("{upstream}/questions")),
        ("SUMMARIZATION_API_URL", format!("{upstream}/summarize")),
    ]);
    let id = new_session(&app).await;

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/extract"),
        Some(json!({"text": "t"})),
    )
    .await;
    assert_eq!(body["entity_choices"], json!([]));
    assert!(body["failure"].as_str().unwrap().contains("500"));

    let (_, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/generate"),
        Some(json!({"text": "t", "selected_entities": ["A (B)"]})),
    )
    .await;
    assert_eq!(body["questions_text"], "Error occurred while generating questions.");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{id}/summarize"),
        Some(json!({"text": "t", "model": "BARTpho", "max_new_tokens": 32})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Error occurred while summarizing the text.");

    let (_, metrics) = call(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(metrics["extract"]["fallbacks"], 1);
    assert_eq!(metrics["generate"]["fallbacks"], 1);
    assert_eq!(metrics["summarize"]["fallbacks"], 1);
}

#[tokio::test]
async fn test_clear_does_not_wait_for_pending_summarize() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let slow = {
        let started = started.clone();
        let release = release.clone();
        Router::new().route(
            "/summarize",
            post(move || {
                let started = started.clone();
                let release = release.clone();
                async move {
                    started.notify_one();
                    release.notified().await;
                    Json(json!({"summary": "late summary"}))
                }
            }),
        )
    };
    let upstream = spawn_upstream(slow).await;
    let app = app_with(&[("SUMMARIZATION_API_URL", format!("{upstream}/summarize"))]);
    let id = new_session(&app).await;

    let pending = {
        let app = app.clone();
        let uri = format!("/api/sessions/{id}/summarize");
        tokio::spawn(async move {
            call(&app, Method::POST, &uri, Some(json!({"text": "Hà Nội"}))).await
        })
    };
    started.notified().await;

    let (status, _) = tokio::time::timeout(
        Duration::from_secs(1),
        call(&app, Method::GET, &format!("/api/sessions/{id}"), None),
    )
    .await
    .expect("reading the session waited for the remote call");
    assert_eq!(status, StatusCode::OK);

    let (status, body) = tokio::time::timeout(
        Duration::from_secs(1),
        call(&app, Method::POST, &format!("/api/sessions/{id}/clear"), None),
    )
    .await
    .expect("clear waited for the remote call");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "");

    release.notify_one();
    let (status, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "late summary");

    // The call started before the clear, so its result is not stored.
    let (_, state) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(state["summary"], "");
    assert_eq!(state["text"], "");
}

#[tokio::test]
async fn test_oldest_session_is_evicted_at_capacity() {
    let app = app_with(&[("MAX_SESSIONS", "2".to_string())]);
    let first = new_session(&app).await;
    let second = new_session(&app).await;

    let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let third = new_session(&app).await;

    let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{second}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    for id in [&first, &third] {
        let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, health) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(health["sessions"], 2);
    assert_eq!(health["max_sessions"], 2);
}
