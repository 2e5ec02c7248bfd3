//! Stub backend for integration tests.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stratsync::{ArtifactManager, BackendClient, ChatSession};
use tempfile::TempDir;

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct Canned {
    status: StatusCode,
    content_type: String,
    body: String,
}

impl Canned {
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    pub fn text(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: body.to_string(),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Shared state of the stub: canned replies and recorded summary requests.
#[derive(Clone, Default)]
pub struct StubBackend {
    queries: Arc<Mutex<HashMap<String, Canned>>>,
    summary: Arc<Mutex<Option<Canned>>>,
    summary_requests: Arc<Mutex<Vec<Value>>>,
}

impl StubBackend {
    /// Reply to `query` with `canned`.
    pub fn on_query(&self, query: &str, canned: Canned) {
        self.queries
            .lock()
            .unwrap()
            .insert(query.to_string(), canned);
    }

    /// Reply to every summary request with `canned`.
    pub fn on_summary(&self, canned: Canned) {
        *self.summary.lock().unwrap() = Some(canned);
    }

    /// Bodies of all summary requests received so far.
    pub fn summary_requests(&self) -> Vec<Value> {
        self.summary_requests.lock().unwrap().clone()
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/process_user_query/", post(process_query))
            .route("/generate_summary/", post(generate_summary))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn process_query(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Canned {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    stub.queries
        .lock()
        .unwrap()
        .get(&query)
        .cloned()
        .unwrap_or_else(|| Canned::json(json!({"reply": format!("echo: {query}")})))
}

async fn generate_summary(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Canned {
    stub.summary_requests.lock().unwrap().push(body);
    stub.summary
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| Canned::text("<p>summary</p>"))
}

/// A chat session talking to a freshly started stub.
pub async fn test_session(stub: &StubBackend) -> (ChatSession, TempDir) {
    let base_url = stub.serve().await;
    let dir = TempDir::new().unwrap();
    let client = BackendClient::new(base_url).unwrap();
    let session = ChatSession::new(Arc::new(client), ArtifactManager::new(dir.path()));
    (session, dir)
}
