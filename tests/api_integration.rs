//! API Integration Tests for Rosterd
//!
//! Drives a real listener through the full HTTP surface: employee reads,
//! skill search, health probes, and the index-builder round trip.

use rosterd::health::HealthMonitor;
use rosterd::indexer::{SKILL_VOCABULARY, SkillIndexer};
use rosterd::query::QueryService;
use rosterd::server::{AppState, create_router};
use rosterd::store::{MemoryStore, Store};
use serde_json::{Value, json};
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

/// Create test app state over a fresh in-memory store.
fn create_test_state() -> (AppState, MemoryStore, Store) {
    let mem = MemoryStore::new();
    let store = Store::new(mem.clone());
    let state = AppState {
        query: QueryService::new(store.clone()),
        health: HealthMonitor::new(store.clone()),
    };
    (state, mem, store)
}

/// Start test server and return base URL plus store handles.
async fn start_test_server() -> (String, MemoryStore, Store) {
    let (state, mem, store) = create_test_state();
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), mem, store)
}

async fn get_json(client: &reqwest::Client, url: &str) -> (u16, Value) {
    let resp = client.get(url).send().await.expect("Failed to send request");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("Failed to parse response body");
    (status, body)
}

// =============================================================================
// Employee API Tests
// =============================================================================

#[tokio::test]
async fn test_employee_endpoints() {
    let (base_url, mem, _store) = start_test_server().await;
    let client = reqwest::Client::new();

    mem.insert_document("user:id:1", json!({"id": "1", "display_name": "Ada Lovelace"}));
    mem.insert_raw("user:id:2", r#"{"id":"2","display_name":"Grace Hopper"}"#);

    // Listing spans both storage encodings
    let (status, body) = get_json(&client, &format!("{base_url}/v1/employees")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], 200);
    assert_eq!(body["count"], 2);

    // Single lookup matches the listing
    let (status, body) = get_json(&client, &format!("{base_url}/v1/employees/1")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["display_name"], "Ada Lovelace");

    // Unknown id yields the 404 envelope
    let (status, body) = get_json(&client, &format!("{base_url}/v1/employees/999")).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["message"], "Employee with ID 999 not found");
}

#[tokio::test]
async fn test_list_empty_store() {
    let (base_url, _mem, _store) = start_test_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, &format!("{base_url}/v1/employees")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["count"], 0);
}

// =============================================================================
// Skill Search Tests
// =============================================================================

#[tokio::test]
async fn test_search_intersection_scenario() {
    let (base_url, mem, store) = start_test_server().await;
    let client = reqwest::Client::new();

    mem.insert_document("user:id:1", json!({"id": "1"}));
    mem.insert_document("user:id:2", json!({"id": "2"}));
    store
        .set_add("skill:aws:employees", &["1".to_string(), "2".to_string()])
        .await
        .unwrap();
    store
        .set_add("skill:docker:employees", &["1".to_string()])
        .await
        .unwrap();

    // Only employee 1 has both skills
    let (status, body) = get_json(
        &client,
        &format!("{base_url}/v1/employees/search/by-skills?skills=aws,docker"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    assert_eq!(body["requested_skills"], json!(["aws", "docker"]));
    assert_eq!(body["data"][0]["employee_id"], "1");
    assert_eq!(body["data"][0]["employee_data"]["id"], "1");
    assert_eq!(body["data"][0]["matching_skills"], json!(["aws", "docker"]));

    // Argument order does not change the result set
    let (_, reversed) = get_json(
        &client,
        &format!("{base_url}/v1/employees/search/by-skills?skills=docker,aws"),
    )
    .await;
    assert_eq!(reversed["count"], 1);
    assert_eq!(reversed["data"][0]["employee_id"], "1");

    // Single skill matches both employees, sorted ascending
    let (_, aws) = get_json(
        &client,
        &format!("{base_url}/v1/employees/search/by-skills?skills=aws"),
    )
    .await;
    assert_eq!(aws["count"], 2);
    assert_eq!(aws["data"][0]["employee_id"], "1");
    assert_eq!(aws["data"][1]["employee_id"], "2");
}

#[tokio::test]
async fn test_search_boundaries() {
    let (base_url, mem, _store) = start_test_server().await;
    let client = reqwest::Client::new();
    mem.insert_document("user:id:1", json!({"id": "1"}));

    // Missing parameter
    let (status, body) = get_json(
        &client,
        &format!("{base_url}/v1/employees/search/by-skills"),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "BAD_REQUEST");

    // Empty parameter
    let (status, _) = get_json(
        &client,
        &format!("{base_url}/v1/employees/search/by-skills?skills="),
    )
    .await;
    assert_eq!(status, 400);

    // Unknown skill behaves as an empty set
    let (status, body) = get_json(
        &client,
        &format!("{base_url}/v1/employees/search/by-skills?skills=unknownskill"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["count"], 0);
}

// =============================================================================
// Builder Round-Trip Tests
// =============================================================================

#[tokio::test]
async fn test_index_build_then_search_round_trip() {
    let (base_url, mem, store) = start_test_server().await;
    let client = reqwest::Client::new();

    for i in 1..=12 {
        mem.insert_document(&format!("user:id:{i}"), json!({"id": i.to_string()}));
    }

    let report = SkillIndexer::new(store.clone())
        .with_seed(99)
        .run()
        .await
        .expect("index build failed");
    assert_eq!(report.indexed, 12);

    // Every member of every skill set is reachable through search
    for skill in SKILL_VOCABULARY {
        let members = store
            .set_members(&format!("skill:{skill}:employees"))
            .await
            .unwrap();
        let (status, body) = get_json(
            &client,
            &format!("{base_url}/v1/employees/search/by-skills?skills={skill}"),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["count"], members.len());

        let returned: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|hit| hit["employee_id"].as_str().unwrap())
            .collect();
        for member in &members {
            assert!(
                returned.contains(&member.as_str()),
                "member {member} of skill {skill} missing from search"
            );
        }
    }
}

// =============================================================================
// Health Probe Tests
// =============================================================================

#[tokio::test]
async fn test_health_probes() {
    let (base_url, mem, store) = start_test_server().await;
    let client = reqwest::Client::new();

    // Empty store: alive and connected, but not ready
    let (status, body) = get_json(&client, &format!("{base_url}/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");

    let (status, body) = get_json(&client, &format!("{base_url}/health/live")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "alive");

    let (status, body) = get_json(&client, &format!("{base_url}/health/ready")).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "not_ready");

    // With data: ready, and detailed reports component counts
    mem.insert_document("user:id:1", json!({"id": "1"}));
    store
        .set_add("skill:sql:employees", &["1".to_string()])
        .await
        .unwrap();

    let (status, body) = get_json(&client, &format!("{base_url}/health/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["employees_available"], 1);

    let (status, body) = get_json(&client, &format!("{base_url}/health/detailed")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["store"]["status"], "connected");
    assert_eq!(body["components"]["employees"]["count"], 1);
    assert_eq!(body["components"]["skill_sets"]["count"], 1);
}

#[tokio::test]
async fn test_health_probes_offline_store() {
    let (base_url, mem, _store) = start_test_server().await;
    let client = reqwest::Client::new();
    mem.set_offline(true);

    let (status, body) = get_json(&client, &format!("{base_url}/health")).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["store"], "disconnected");

    let (status, body) = get_json(&client, &format!("{base_url}/health/live")).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "dead");

    let (status, body) = get_json(&client, &format!("{base_url}/health/detailed")).await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["components"]["employees"]["status"], "error");

    let (status, _) = get_json(&client, &format!("{base_url}/v1/employees")).await;
    assert_eq!(status, 500);
}

// =============================================================================
// Routing Tests
// =============================================================================

#[tokio::test]
async fn test_unmatched_route() {
    let (base_url, _mem, _store) = start_test_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, &format!("{base_url}/v1/missing")).await;
    assert_eq!(status, 404);
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "NOT_FOUND");
}
