use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crusoe_cloud_controller::api::{self, AppState};
use crusoe_cloud_controller::config::CrusoeConfig;
use crusoe_cloud_controller::directory::CrusoeApiClient;
use crusoe_cloud_controller::instances::{Instances, LivenessTracker};

pub const PROJECT_ID: &str = "1841af90-a4f6-4412-8b23-b7035a6c72ae";
pub const INSTANCE_ID: &str = "2480b2f8-d63a-401e-90ff-0d79b5b3e007";
pub const LOCATION: &str = "us-easttesting1-a";

/// Grace period no test run gets anywhere near
pub const LONG_GRACE_PERIOD: Duration = Duration::from_secs(3600);

/// Instance JSON in the shape the Crusoe API returns
pub fn instance_json(id: &str, name: &str, state: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "a100.8x",
        "state": state,
        "location": LOCATION,
        "project_id": PROJECT_ID,
        "instance_group_id": "group-1",
        "instance_template_id": "template-1",
        "network_interfaces": [{
            "id": "nic-1",
            "ips": [{
                "private_ipv4": { "address": "10.0.0.1" },
                "public_ipv4": { "address": "192.168.0.1", "id": "ip-1", "type": "dynamic" }
            }]
        }],
        "host_channel_adapters": []
    })
}

#[derive(Default)]
struct MockState {
    instances: Mutex<HashMap<String, Value>>,
    partitions: Mutex<HashMap<String, Value>>,
    /// When set, every instance request fails with this status
    failure: Mutex<Option<StatusCode>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub timestamp: Option<String>,
}

/// In-process stand-in for the Crusoe v1alpha5 API
pub struct MockCrusoeApi {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockCrusoeApi {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route(
                "/v1alpha5/projects/:project/compute/vms/instances",
                get(list_instances),
            )
            .route(
                "/v1alpha5/projects/:project/compute/vms/instances/:id",
                get(get_instance),
            )
            .route(
                "/v1alpha5/projects/:project/networking/ib-partitions/:id",
                get(get_partition),
            )
            .with_state(state.clone());

        let (addr, server) = serve(app).await;
        Self {
            addr,
            state,
            server,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/v1alpha5", self.addr)
    }

    pub fn put_instance(&self, instance: Value) {
        let id = instance["id"].as_str().expect("instance id").to_string();
        self.state.instances.lock().unwrap().insert(id, instance);
    }

    pub fn delete_instance(&self, id: &str) {
        self.state.instances.lock().unwrap().remove(id);
    }

    pub fn put_partition(&self, partition: Value) {
        let id = partition["id"].as_str().expect("partition id").to_string();
        self.state.partitions.lock().unwrap().insert(id, partition);
    }

    pub fn fail_with(&self, status: Option<StatusCode>) {
        *self.state.failure.lock().unwrap() = status;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockCrusoeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn record(state: &MockState, path: String, headers: &HeaderMap) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        path,
        authorization: header("authorization"),
        timestamp: header("x-crusoe-timestamp"),
    });
}

fn check_failure(state: &MockState) -> Result<(), (StatusCode, String)> {
    match *state.failure.lock().unwrap() {
        Some(status) => Err((status, "injected failure".to_string())),
        None => Ok(()),
    }
}

async fn list_instances(
    State(state): State<Arc<MockState>>,
    Path(project): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, String)> {
    record(&state, format!("list:{}", project), &headers);
    check_failure(&state)?;

    let name = query.get("names").cloned().unwrap_or_default();
    let items: Vec<Value> = state
        .instances
        .lock()
        .unwrap()
        .values()
        .filter(|i| i["name"] == name.as_str())
        .cloned()
        .collect();
    Ok(Json(json!({ "items": items })))
}

async fn get_instance(
    State(state): State<Arc<MockState>>,
    Path((project, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, String)> {
    record(&state, format!("get:{}:{}", project, id), &headers);
    check_failure(&state)?;

    state
        .instances
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("instance {} not found", id)))
}

async fn get_partition(
    State(state): State<Arc<MockState>>,
    Path((project, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, String)> {
    record(&state, format!("partition:{}:{}", project, id), &headers);

    state
        .partitions
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("partition {} not found", id)))
}

async fn serve(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });
    (addr, server)
}

/// The provider API wired to a mock Crusoe API through the real REST client
pub struct TestController {
    pub api: MockCrusoeApi,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestController {
    pub async fn start() -> Self {
        Self::start_with_grace_period(LONG_GRACE_PERIOD).await
    }

    /// A zero grace period reports a missing instance as deleted on the
    /// first miss.
    pub async fn start_with_grace_period(grace_period: Duration) -> Self {
        let api = MockCrusoeApi::start().await;

        let config = CrusoeConfig {
            api_endpoint: api.endpoint(),
            access_key: "test-access-key".to_string(),
            secret_key: "test-secret-key".to_string(),
            project_id: PROJECT_ID.to_string(),
            request_timeout_secs: 5,
        };
        config.validate().expect("valid config");

        let client = CrusoeApiClient::new(&config).expect("Failed to create client");
        let state = Arc::new(AppState {
            instances: Instances::new(
                Arc::new(client),
                Arc::new(LivenessTracker::new(grace_period)),
            ),
        });

        let (addr, server) = serve(api::create_router(state)).await;
        Self { api, addr, server }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = reqwest::get(self.url(path)).await.expect("request failed");
        into_parts(resp).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = reqwest::Client::new()
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        into_parts(resp).await
    }

    pub async fn exists(&self, provider_id: &str) -> (StatusCode, Value) {
        self.get(&format!(
            "/api/v1/instances/exists?provider_id={}",
            provider_id.replace(':', "%3A").replace('/', "%2F")
        ))
        .await
    }
}

impl Drop for TestController {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn into_parts(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, body)
}
