//! In-process stand-in for the Supabase Storage and PostgREST endpoints the publisher calls.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;
use url::Url;
use uuid::Uuid;

pub const SERVICE_KEY: &str = "service-role-test-key";

#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: Uuid,
    pub email: String,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub struct FakeRole {
    pub user_id: Uuid,
    pub role: String,
    pub scope: String,
    pub deleted: bool,
}

#[derive(Debug, Default)]
pub struct Backend {
    /// Bucket name to its `public` flag.
    pub buckets: BTreeMap<String, bool>,
    /// `<bucket>/<path>` to object bytes.
    pub objects: BTreeMap<String, Vec<u8>>,
    pub firmware_rows: Vec<Value>,
    pub users: Vec<FakeUser>,
    pub roles: Vec<FakeRole>,
    pub fail_users: bool,
    pub fail_insert: bool,
    /// Body returned by a successful insert instead of the stored row.
    pub insert_echo: Option<Value>,
    pub reqs: Vec<Captured>,
}

#[derive(Clone, Default)]
pub struct FakeSupabase {
    pub inner: Arc<Mutex<Backend>>,
}

impl FakeSupabase {
    pub fn with(f: impl FnOnce(&mut Backend)) -> Self {
        let fake = Self::default();
        f(&mut fake.inner.lock().unwrap());
        fake
    }

    pub fn reqs(&self) -> Vec<Captured> {
        self.inner.lock().unwrap().reqs.clone()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.reqs()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/storage/v1/bucket", get(list_buckets).post(create_bucket))
            .route("/storage/v1/object/{bucket}/{*path}", post(upload_object))
            .route("/rest/v1/users", get(query_users))
            .route("/rest/v1/user_roles", get(query_user_roles))
            .route("/rest/v1/firmware", post(insert_firmware))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> Url {
        spawn_test_server(self.router()).await
    }

    fn capture(
        &self,
        method: Method,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), Response> {
        self.inner.lock().unwrap().reqs.push(Captured {
            method,
            path,
            query,
            headers: headers.clone(),
            body: body.to_vec(),
        });

        let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let expected_bearer = format!("Bearer {SERVICE_KEY}");
        if apikey != Some(SERVICE_KEY) || bearer != Some(expected_bearer.as_str()) {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid API key" })),
            )
                .into_response());
        }
        Ok(())
    }
}

pub async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{}", addr)).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

/// Fresh directory under the system temp dir, unique per call.
pub fn unique_temp_dir(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "firmware-publisher-{prefix}-{}-{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Strips the PostgREST `eq.` operator from a filter value.
fn eq_filter<'a>(query: &'a HashMap<String, String>, column: &str) -> Option<&'a str> {
    query.get(column).and_then(|v| v.strip_prefix("eq."))
}

fn excludes_deleted(query: &HashMap<String, String>) -> bool {
    query.get("deleted_at").map(String::as_str) == Some("is.null")
}

async fn list_buckets(State(fake): State<FakeSupabase>, headers: HeaderMap) -> Response {
    if let Err(resp) = fake.capture(
        Method::GET,
        "/storage/v1/bucket".to_string(),
        HashMap::new(),
        &headers,
        &[],
    ) {
        return resp;
    }

    let buckets: Vec<Value> = fake
        .inner
        .lock()
        .unwrap()
        .buckets
        .iter()
        .map(|(name, public)| {
            json!({
                "id": name,
                "name": name,
                "owner": "",
                "public": public,
                "created_at": "2024-05-01T10:00:00.000Z",
                "updated_at": "2024-05-01T10:00:00.000Z"
            })
        })
        .collect();
    Json(buckets).into_response()
}

async fn create_bucket(
    State(fake): State<FakeSupabase>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Err(resp) = fake.capture(
        Method::POST,
        "/storage/v1/bucket".to_string(),
        HashMap::new(),
        &headers,
        &body,
    ) {
        return resp;
    }

    let Ok(req) = serde_json::from_slice::<Value>(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "statusCode": "400", "error": "Invalid", "message": "bad json" })),
        )
            .into_response();
    };
    let name = req["name"].as_str().unwrap_or_default().to_string();
    let public = req["public"].as_bool().unwrap_or(false);

    let mut backend = fake.inner.lock().unwrap();
    if backend.buckets.contains_key(&name) {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })),
        )
            .into_response();
    }
    backend.buckets.insert(name.clone(), public);
    Json(json!({ "name": name })).into_response()
}

async fn upload_object(
    State(fake): State<FakeSupabase>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Err(resp) = fake.capture(
        Method::POST,
        format!("/storage/v1/object/{bucket}/{path}"),
        HashMap::new(),
        &headers,
        &body,
    ) {
        return resp;
    }

    let upsert = headers.get("x-upsert").and_then(|v| v.to_str().ok()) == Some("true");
    let key = format!("{bucket}/{path}");

    let mut backend = fake.inner.lock().unwrap();
    if !backend.buckets.contains_key(&bucket) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "statusCode": "404",
                "error": "Bucket not found",
                "message": "Bucket not found"
            })),
        )
            .into_response();
    }
    if backend.objects.contains_key(&key) && !upsert {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })),
        )
            .into_response();
    }
    backend.objects.insert(key.clone(), body.to_vec());
    Json(json!({ "Key": key, "Id": Uuid::new_v4() })).into_response()
}

async fn query_users(
    State(fake): State<FakeSupabase>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = fake.capture(
        Method::GET,
        "/rest/v1/users".to_string(),
        query.clone(),
        &headers,
        &[],
    ) {
        return resp;
    }

    let backend = fake.inner.lock().unwrap();
    if backend.fail_users {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "XX000", "message": "lookup exploded" })),
        )
            .into_response();
    }

    let email = eq_filter(&query, "email");
    let skip_deleted = excludes_deleted(&query);
    let rows: Vec<Value> = backend
        .users
        .iter()
        .filter(|u| Some(u.email.as_str()) == email)
        .filter(|u| !(skip_deleted && u.deleted))
        .map(|u| json!({ "id": u.id }))
        .collect();
    Json(rows).into_response()
}

async fn query_user_roles(
    State(fake): State<FakeSupabase>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = fake.capture(
        Method::GET,
        "/rest/v1/user_roles".to_string(),
        query.clone(),
        &headers,
        &[],
    ) {
        return resp;
    }

    let backend = fake.inner.lock().unwrap();
    let role = eq_filter(&query, "role");
    let scope = eq_filter(&query, "scope");
    let skip_deleted = excludes_deleted(&query);
    let rows: Vec<Value> = backend
        .roles
        .iter()
        .filter(|r| Some(r.role.as_str()) == role && Some(r.scope.as_str()) == scope)
        .filter(|r| !(skip_deleted && r.deleted))
        .map(|r| json!({ "user_id": r.user_id }))
        .collect();
    Json(rows).into_response()
}

async fn insert_firmware(
    State(fake): State<FakeSupabase>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Err(resp) = fake.capture(
        Method::POST,
        "/rest/v1/firmware".to_string(),
        HashMap::new(),
        &headers,
        &body,
    ) {
        return resp;
    }

    let mut backend = fake.inner.lock().unwrap();
    if backend.fail_insert {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "23503",
                "details": "Key (modified_by) is not present in table \"users\".",
                "hint": null,
                "message": "insert or update on table \"firmware\" violates foreign key constraint"
            })),
        )
            .into_response();
    }

    let Ok(Value::Object(mut row)) = serde_json::from_slice::<Value>(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": "PGRST102", "message": "Empty or invalid json" })),
        )
            .into_response();
    };
    row.insert(
        "id".to_string(),
        json!(backend.firmware_rows.len() as u64 + 1),
    );
    row.insert(
        "created_at".to_string(),
        json!("2024-05-01T10:00:00.123456+00:00"),
    );
    let row = Value::Object(row);
    backend.firmware_rows.push(row.clone());

    let representation = headers.get("prefer").and_then(|v| v.to_str().ok())
        == Some("return=representation");
    if let Some(echo) = backend.insert_echo.clone() {
        (StatusCode::CREATED, Json(echo)).into_response()
    } else if representation {
        (StatusCode::CREATED, Json(json!([row]))).into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}
