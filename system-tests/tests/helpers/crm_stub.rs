// system-tests/tests/helpers/crm_stub.rs
// ============================================================================
// Module: CRM Stub
// Description: In-memory CRM API served over HTTP for system-tests.
// Purpose: Run the harness suites without a live deployment.
// Dependencies: axum, crm-harness, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! The stub serves the CRM REST surface under `/api` and a form-encoded token
//! endpoint at `/auth/token`. Records live in memory with sequential integer
//! ids shared across collections. `PUT` merges fields; deleting a customer
//! removes its sub-resources. Fault switches make negative paths testable.

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use axum::Form;
use axum::Json;
use axum::Router;
use axum::extract::OriginalUri;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use crm_harness::AuthConfig;
use crm_harness::ChildKind;
use crm_harness::ResourceKind;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tracing::info;

/// Token issued by the stub's auth endpoint.
pub const STUB_TOKEN: &str = "stub-session-token";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Runtime fault switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubFaults {
    /// `DELETE` answers 500 and keeps the record.
    pub fail_deletes: bool,
    /// `PUT` answers 500 and leaves the record unchanged.
    pub fail_updates: bool,
    /// `POST` stores the record but omits `id` from the response.
    pub omit_create_id: bool,
    /// The auth endpoint answers 200 without a token.
    pub omit_token: bool,
    /// Write-only fields are stored as [`STORED_SECRET`] and returned on read.
    pub echo_write_only: bool,
}

/// Value stored for write-only fields when `echo_write_only` is set.
pub const STORED_SECRET: &str = "stored-secret-hash";

/// Stub startup options.
#[derive(Debug, Clone)]
pub struct StubOptions {
    /// Reject `/api` requests without the issued token.
    pub require_token: bool,
    /// Accepted username.
    pub username: String,
    /// Accepted password.
    pub password: String,
    /// Initial fault switches.
    pub faults: StubFaults,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            require_token: false,
            username: "admin".to_string(),
            password: "secret".to_string(),
            faults: StubFaults::default(),
        }
    }
}

impl StubOptions {
    /// Options for a stub that enforces token authentication.
    pub fn with_auth() -> Self {
        Self {
            require_token: true,
            ..Self::default()
        }
    }
}

/// Request seen by the stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StubRequest {
    /// HTTP method.
    pub method: String,
    /// Request path including the `/api` prefix.
    pub path: String,
}

// ============================================================================
// SECTION: State
// ============================================================================

#[derive(Default)]
struct StubStore {
    next_id: i64,
    collections: BTreeMap<String, BTreeMap<i64, Map<String, Value>>>,
}

impl StubStore {
    fn insert(&mut self, collection: String, mut fields: Map<String, Value>) -> Map<String, Value> {
        self.next_id += 1;
        let id = self.next_id;
        fields.insert("id".to_string(), json!(id));
        self.collections.entry(collection).or_default().insert(id, fields.clone());
        fields
    }

    fn get(&self, collection: &str, id: i64) -> Option<&Map<String, Value>> {
        self.collections.get(collection).and_then(|records| records.get(&id))
    }

    fn list(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|records| records.values().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn merge(&mut self, collection: &str, id: i64, fields: Map<String, Value>) -> Option<Map<String, Value>> {
        let record = self.collections.get_mut(collection)?.get_mut(&id)?;
        for (key, value) in fields {
            if key != "id" {
                record.insert(key, value);
            }
        }
        Some(record.clone())
    }

    fn remove(&mut self, collection: &str, id: i64) -> bool {
        let removed =
            self.collections.get_mut(collection).and_then(|records| records.remove(&id)).is_some();
        if removed {
            let prefix = format!("{}/", child_collection_prefix(collection, id));
            self.collections.retain(|name, _| !name.starts_with(&prefix));
        }
        removed
    }

    fn count(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }
}

fn child_collection_prefix(collection: &str, id: i64) -> String {
    format!("{collection}/{id}")
}

fn child_collection(parent: i64, child: ChildKind) -> String {
    format!("{}/{}", child_collection_prefix(ResourceKind::Customer.collection(), parent), child.segment())
}

struct StubState {
    options: StubOptions,
    store: Mutex<StubStore>,
    faults: Mutex<StubFaults>,
    requests: Mutex<Vec<StubRequest>>,
}

impl StubState {
    fn with_store<T>(&self, action: impl FnOnce(&mut StubStore) -> T) -> Option<T> {
        self.store.lock().ok().map(|mut store| action(&mut store))
    }

    fn faults(&self) -> StubFaults {
        self.faults.lock().map(|faults| faults.clone()).unwrap_or_default()
    }
}

type Shared = Arc<StubState>;

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Handle for the stub CRM server; shuts the server down on drop.
pub struct CrmStubHandle {
    origin: String,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl CrmStubHandle {
    /// Returns the API base URL.
    pub fn base_url(&self) -> String {
        format!("{}/api", self.origin)
    }

    /// Returns true when `/api` requests must carry the issued token.
    pub fn requires_token(&self) -> bool {
        self.state.options.require_token
    }

    /// Returns auth settings that the stub accepts.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            url: format!("{}/auth/token", self.origin),
            username: self.state.options.username.clone(),
            password: self.state.options.password.clone(),
        }
    }

    /// Returns the number of stored records, sub-resources included.
    pub fn entity_count(&self) -> usize {
        self.state.with_store(|store| store.count()).unwrap_or_default()
    }

    /// Returns captured requests in arrival order.
    pub fn requests(&self) -> Vec<StubRequest> {
        self.state.requests.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Replaces the fault switches.
    pub fn set_faults(&self, faults: StubFaults) {
        if let Ok(mut current) = self.state.faults.lock() {
            *current = faults;
        }
    }
}

impl Drop for CrmStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns the stub on an ephemeral loopback port.
pub fn spawn_crm_stub(options: StubOptions) -> Result<CrmStubHandle, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("crm stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("crm stub listener nonblocking failed: {err}"))?;
    let addr = listener.local_addr().map_err(|err| format!("crm stub local addr failed: {err}"))?;

    let state = Arc::new(StubState {
        store: Mutex::new(StubStore::default()),
        faults: Mutex::new(options.faults.clone()),
        requests: Mutex::new(Vec::new()),
        options,
    });
    let app = router(Arc::clone(&state));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    info!(%addr, require_token = state.options.require_token, "crm stub listening");
    Ok(CrmStubHandle {
        origin: format!("http://{addr}"),
        state,
        shutdown: Some(shutdown_tx),
        join: Some(join),
    })
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/{collection}", get(list_records).post(create_record))
        .route("/{collection}/{id}", get(fetch_record).put(update_record).delete(delete_record))
        .route("/{collection}/{id}/status", patch(update_status))
        .route("/{collection}/{id}/{segment}", get(list_children).post(create_child))
        .route("/{collection}/{id}/{segment}/{child_id}", get(fetch_child))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), require_token));
    Router::new()
        .nest("/api", api)
        .route("/auth/token", post(issue_token))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record_request))
        .with_state(state)
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    if let Ok(mut requests) = state.requests.lock() {
        let uri = request
            .extensions()
            .get::<OriginalUri>()
            .map_or_else(|| request.uri().clone(), |original| original.0.clone());
        requests.push(StubRequest {
            method: request.method().to_string(),
            path: uri.path().to_string(),
        });
    }
    next.run(request).await
}

async fn require_token(State(state): State<Shared>, request: Request, next: Next) -> Response {
    if state.options.require_token && !has_valid_token(request.headers()) {
        return error(StatusCode::UNAUTHORIZED, "missing or invalid token");
    }
    next.run(request).await
}

fn has_valid_token(headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {STUB_TOKEN}");
    let header_is = |name: &str, expected: &str| {
        headers.get(name).and_then(|value| value.to_str().ok()).is_some_and(|value| value == expected)
    };
    header_is("token", STUB_TOKEN) || header_is("authorization", &bearer)
}

// ============================================================================
// SECTION: Auth
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenForm {
    username: String,
    password: String,
}

async fn issue_token(State(state): State<Shared>, Form(form): Form<TokenForm>) -> Response {
    if form.username != state.options.username || form.password != state.options.password {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }
    if state.faults().omit_token {
        return (StatusCode::OK, Json(json!({"message": "authenticated"}))).into_response();
    }
    (StatusCode::OK, Json(json!({"token": STUB_TOKEN}))).into_response()
}

// ============================================================================
// SECTION: Top-Level Resources
// ============================================================================

async fn create_record(
    State(state): State<Shared>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(kind) = ResourceKind::from_collection(&collection) else {
        return error(StatusCode::NOT_FOUND, "unknown collection");
    };
    let Value::Object(mut fields) = body else {
        return error(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    let echo_write_only = state.faults().echo_write_only;
    for field in kind.write_only_fields() {
        if fields.remove(*field).is_some() && echo_write_only {
            fields.insert((*field).to_string(), Value::from(STORED_SECRET));
        }
    }
    created(&state, collection, fields)
}

async fn list_records(State(state): State<Shared>, Path(collection): Path<String>) -> Response {
    if ResourceKind::from_collection(&collection).is_none() {
        return error(StatusCode::NOT_FOUND, "unknown collection");
    }
    match state.with_store(|store| store.list(&collection)) {
        Some(records) => (StatusCode::OK, Json(Value::Array(records))).into_response(),
        None => internal_error(),
    }
}

async fn fetch_record(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, i64)>,
) -> Response {
    match state.with_store(|store| store.get(&collection, id).cloned()) {
        Some(Some(record)) => (StatusCode::OK, Json(Value::Object(record))).into_response(),
        Some(None) => error(StatusCode::NOT_FOUND, "not found"),
        None => internal_error(),
    }
}

async fn update_record(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> Response {
    if state.faults().fail_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "update failed");
    }
    merged(&state, &collection, id, body)
}

async fn update_status(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> Response {
    if !body.get("status").is_some_and(Value::is_string) {
        return error(StatusCode::BAD_REQUEST, "status must be a string");
    }
    merged(&state, &collection, id, body)
}

async fn delete_record(
    State(state): State<Shared>,
    Path((collection, id)): Path<(String, i64)>,
) -> Response {
    if state.faults().fail_deletes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "delete failed");
    }
    match state.with_store(|store| store.remove(&collection, id)) {
        Some(true) => StatusCode::NO_CONTENT.into_response(),
        Some(false) => error(StatusCode::NOT_FOUND, "not found"),
        None => internal_error(),
    }
}

// ============================================================================
// SECTION: Customer Sub-Resources
// ============================================================================

async fn create_child(
    State(state): State<Shared>,
    Path((collection, parent, segment)): Path<(String, i64, String)>,
    Json(body): Json<Value>,
) -> Response {
    let child_collection = match resolve_child(&state, &collection, parent, &segment) {
        Ok(child_collection) => child_collection,
        Err(response) => return response,
    };
    let Value::Object(fields) = body else {
        return error(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    created(&state, child_collection, fields)
}

async fn list_children(
    State(state): State<Shared>,
    Path((collection, parent, segment)): Path<(String, i64, String)>,
) -> Response {
    let child_collection = match resolve_child(&state, &collection, parent, &segment) {
        Ok(child_collection) => child_collection,
        Err(response) => return response,
    };
    match state.with_store(|store| store.list(&child_collection)) {
        Some(records) => (StatusCode::OK, Json(Value::Array(records))).into_response(),
        None => internal_error(),
    }
}

async fn fetch_child(
    State(state): State<Shared>,
    Path((collection, parent, segment, child_id)): Path<(String, i64, String, i64)>,
) -> Response {
    let child_collection = match resolve_child(&state, &collection, parent, &segment) {
        Ok(child_collection) => child_collection,
        Err(response) => return response,
    };
    match state.with_store(|store| store.get(&child_collection, child_id).cloned()) {
        Some(Some(record)) => (StatusCode::OK, Json(Value::Object(record))).into_response(),
        Some(None) => error(StatusCode::NOT_FOUND, "not found"),
        None => internal_error(),
    }
}

/// Validates the parent and segment and returns the child collection key.
fn resolve_child(
    state: &StubState,
    collection: &str,
    parent: i64,
    segment: &str,
) -> Result<String, Response> {
    if collection != ResourceKind::Customer.collection() {
        return Err(error(StatusCode::NOT_FOUND, "sub-resources exist only under customers"));
    }
    let Some(child) = ChildKind::from_segment(segment) else {
        return Err(error(StatusCode::NOT_FOUND, "unknown sub-resource"));
    };
    match state.with_store(|store| store.get(collection, parent).is_some()) {
        Some(true) => Ok(child_collection(parent, child)),
        Some(false) => Err(error(StatusCode::NOT_FOUND, "customer not found")),
        None => Err(internal_error()),
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

fn created(state: &StubState, collection: String, fields: Map<String, Value>) -> Response {
    let omit_id = state.faults().omit_create_id;
    match state.with_store(|store| store.insert(collection, fields)) {
        Some(mut record) => {
            if omit_id {
                record.remove("id");
            }
            (StatusCode::CREATED, Json(Value::Object(record))).into_response()
        }
        None => internal_error(),
    }
}

fn merged(state: &StubState, collection: &str, id: i64, body: Value) -> Response {
    let Value::Object(fields) = body else {
        return error(StatusCode::BAD_REQUEST, "body must be a JSON object");
    };
    match state.with_store(|store| store.merge(collection, id, fields)) {
        Some(Some(record)) => (StatusCode::OK, Json(Value::Object(record))).into_response(),
        Some(None) => error(StatusCode::NOT_FOUND, "not found"),
        None => internal_error(),
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn internal_error() -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, "stub state unavailable")
}
