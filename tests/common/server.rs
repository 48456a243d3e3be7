// In-process stand-in for the therapy backend REST API

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;

/// What the server saw of one voice upload
#[derive(Debug, Clone, Default)]
pub struct VoiceUpload {
    pub query: HashMap<String, String>,
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub file_size: usize,
}

#[derive(Default)]
pub struct MockBackend {
    pub users: Mutex<Vec<Value>>,
    pub sessions: Mutex<Vec<Value>>,
    pub chat_requests: Mutex<Vec<Value>>,
    pub voice_uploads: Mutex<Vec<VoiceUpload>>,
    /// Answer GET /sessions with a bare array instead of a page object
    pub bare_session_lists: AtomicBool,
}

impl MockBackend {
    pub fn add_user(&self, username: &str) -> Value {
        let mut users = self.users.lock().unwrap();
        let user = json!({
            "id": users.len() + 1,
            "username": username,
            "language": "tr",
            "preferred_therapy_approach": "cbt",
            "voice_enabled": false,
            "dark_mode": false,
            "created_at": "2025-03-05T09:00:00.123456",
        });
        users.push(user.clone());
        user
    }

    pub fn bare_lists(&self, bare: bool) {
        self.bare_session_lists.store(bare, Ordering::SeqCst);
    }
}

type Shared = Arc<MockBackend>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn id_matches(value: &Value, id: &str) -> bool {
    match &value["id"] {
        Value::Number(number) => number.to_string() == id,
        Value::String(text) => text == id,
        _ => false,
    }
}

/// Start the mock on an ephemeral port; returns its API base URL.
pub async fn spawn_backend() -> (String, Shared) {
    let state: Shared = Arc::new(MockBackend::default());

    let app = Router::new()
        .route("/api/v1/users", post(create_user).get(list_users))
        .route("/api/v1/users/:id", get(get_user).put(update_user))
        .route("/api/v1/sessions", post(create_session).get(list_sessions))
        .route(
            "/api/v1/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/api/v1/sessions/:id/end", put(end_session))
        .route("/api/v1/chat/send", post(chat_send))
        .route("/api/v1/voice/send", post(voice_send))
        .route("/api/v1/voice/transcribe", post(voice_transcribe))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend");
    });

    (format!("http://{}/api/v1", addr), state)
}

async fn create_user(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let mut users = state.users.lock().unwrap();
    if users.iter().any(|user| user["username"] == username.as_str()) {
        return detail(StatusCode::BAD_REQUEST, "Username already registered");
    }

    let mut user = body.clone();
    user["id"] = json!(users.len() + 1);
    user["created_at"] = json!("2025-03-05T09:00:00.123456");
    users.push(user.clone());
    Json(user).into_response()
}

async fn list_users(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let skip: usize = params.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(100);
    let users = state.users.lock().unwrap();
    let page: Vec<Value> = users.iter().skip(skip).take(limit).cloned().collect();
    Json(page).into_response()
}

async fn get_user(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let users = state.users.lock().unwrap();
    match users.iter().find(|user| id_matches(user, &id)) {
        Some(user) => Json(user.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut users = state.users.lock().unwrap();
    let Some(user) = users.iter_mut().find(|user| id_matches(user, &id)) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if let (Some(target), Some(changes)) = (user.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(user.clone()).into_response()
}

async fn create_session(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["title"].as_str().unwrap_or_default().trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "title"], "msg": "field required" }] })),
        )
            .into_response();
    }

    let mut sessions = state.sessions.lock().unwrap();
    let mut session = body.clone();
    session["id"] = json!(100 + sessions.len());
    session["created_at"] = json!("2025-03-05T09:07:00");
    session["ended_at"] = Value::Null;
    session["messages"] = json!([]);
    sessions.push(session.clone());
    Json(session).into_response()
}

async fn list_sessions(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let skip: usize = params.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
    let user_id = params.get("user_id").cloned().unwrap_or_default();

    let sessions = state.sessions.lock().unwrap();
    let owned: Vec<Value> = sessions
        .iter()
        .filter(|session| session["user_id"].as_str() == Some(user_id.as_str()))
        .cloned()
        .collect();
    let page: Vec<Value> = owned.iter().skip(skip).take(limit).cloned().collect();

    if state.bare_session_lists.load(Ordering::SeqCst) {
        Json(page).into_response()
    } else {
        Json(json!({ "items": page, "total": owned.len() })).into_response()
    }
}

async fn get_session(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    if id == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    let sessions = state.sessions.lock().unwrap();
    match sessions.iter().find(|session| id_matches(session, &id)) {
        Some(session) => Json(session.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Session not found"),
    }
}

async fn update_session(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut sessions = state.sessions.lock().unwrap();
    let Some(session) = sessions.iter_mut().find(|session| id_matches(session, &id)) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };
    if let (Some(target), Some(changes)) = (session.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(session.clone()).into_response()
}

async fn delete_session(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut sessions = state.sessions.lock().unwrap();
    let before = sessions.len();
    sessions.retain(|session| !id_matches(session, &id));
    if sessions.len() == before {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn end_session(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut sessions = state.sessions.lock().unwrap();
    let Some(session) = sessions.iter_mut().find(|session| id_matches(session, &id)) else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };
    if !session["ended_at"].is_null() {
        return detail(StatusCode::BAD_REQUEST, "Session already ended");
    }
    session["ended_at"] = json!("2025-03-05T10:30:00Z");
    Json(session.clone()).into_response()
}

async fn chat_send(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.chat_requests.lock().unwrap().push(body.clone());

    let session_id = body["session_id"].as_str().unwrap_or_default().to_string();
    let message = body["message"].as_str().unwrap_or_default().to_string();

    let mut sessions = state.sessions.lock().unwrap();
    let Some(session) = sessions
        .iter_mut()
        .find(|session| id_matches(session, &session_id))
    else {
        return detail(StatusCode::NOT_FOUND, "Session not found");
    };

    let response = format!("You said: {}", message);
    if let Some(messages) = session["messages"].as_array_mut() {
        messages.push(json!({ "role": "user", "content": message, "is_voice": body["is_voice"] }));
        messages.push(json!({ "role": "assistant", "content": response }));
    }

    if message.contains("hopeless") {
        return Json(json!({
            "response": response,
            "crisis_detected": true,
            "emergency_info": { "hotline": "183", "emergency": 112 },
        }))
        .into_response();
    }
    Json(json!({ "response": response, "crisis_detected": false })).into_response()
}

async fn read_upload(
    query: HashMap<String, String>,
    mut multipart: Multipart,
) -> Result<VoiceUpload, Response> {
    let mut upload = VoiceUpload {
        query,
        ..VoiceUpload::default()
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(detail(StatusCode::BAD_REQUEST, &e.to_string())),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.to_string()))?;
            upload.file_size = bytes.len();
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| detail(StatusCode::BAD_REQUEST, &e.to_string()))?;
            upload.fields.insert(name, text);
        }
    }

    if upload.file_size == 0 {
        return Err(detail(StatusCode::BAD_REQUEST, "Empty audio file"));
    }
    Ok(upload)
}

async fn voice_send(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    multipart: Multipart,
) -> Response {
    let upload = match read_upload(query, multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };
    state.voice_uploads.lock().unwrap().push(upload);

    Json(json!({
        "transcribed_text": "Bugün biraz gerginim",
        "response": "Seni geren şey ne?",
        "crisis_detected": false,
        "emergency_info": null,
    }))
    .into_response()
}

async fn voice_transcribe(State(state): State<Shared>, multipart: Multipart) -> Response {
    let upload = match read_upload(HashMap::new(), multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };
    state.voice_uploads.lock().unwrap().push(upload);

    Json(json!({ "text": "merhaba" })).into_response()
}
