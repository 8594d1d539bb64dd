//! Integration tests for the skill graph HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use skillgraph::api::{
    AppState, ErrorResponse, HealthResponse, RubricResponse, ValidateResponse, create_router,
};
use skillgraph::config::ServerConfig;
use skillgraph_core::{Grade, SkillGraph};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn test_config() -> ServerConfig {
    ServerConfig {
        global_rps: 0,
        ..ServerConfig::default()
    }
}

/// Create a test server with the default limits.
fn create_test_server() -> TestServer {
    create_server_with(test_config())
}

fn create_server_with(config: ServerConfig) -> TestServer {
    TestServer::new(create_router(AppState::new(config))).unwrap()
}

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

/// A MOC with one child: a perfect graph.
fn perfect_graph() -> Value {
    json!({
        "id": "graph-1",
        "kind": "skill",
        "nodes": [
            {"id": "a", "type": "moc", "description": "hub", "domain": "focus"},
            {"id": "b", "type": "skill", "description": "leaf", "domain": "focus"}
        ],
        "edges": [
            {"id": "edge-1", "type": "CLUSTERS", "source": "a", "target": "b"}
        ]
    })
}

// =============================================================================
// HEALTH TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_health_returns_correct_version() {
    let server = create_test_server();

    let health: HealthResponse = server.get("/health").await.json();
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// VALIDATE TESTS
// =============================================================================

#[tokio::test]
async fn test_validate_wrapped_graph() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({ "graph": perfect_graph() }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    assert_eq!(body.graph_id, Some(json!("graph-1")));
    assert_eq!(body.kind, "skill");
    assert_eq!(body.report.score, 100);
    assert_eq!(body.report.grade, Grade::A);
    assert_eq!(body.report.bonuses.moc_coverage.value, 10);
}

#[tokio::test]
async fn test_validate_bare_graph_without_id() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{"id": "a", "type": "skill", "description": "d", "domain": "x"}],
            "edges": []
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["graphId"], Value::Null);
    assert_eq!(body["maxScore"], 100);
    assert_eq!(body["issues"]["orphans"].as_array().unwrap().len(), 1);
    assert_eq!(body["score"], 97);
    assert_eq!(body["grade"], "A");
}

#[tokio::test]
async fn test_validate_response_is_not_cached() {
    let server = create_test_server();

    let response = server.post("/validate").json(&perfect_graph()).await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL),
        Some(&HeaderValue::from_static("no-store"))
    );
}

#[tokio::test]
async fn test_validate_recomputes_degrees() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [
                {"id": "a", "type": "skill", "metadata": {"inDegree": 50, "outDegree": 50}},
                {"id": "b", "type": "skill"}
            ],
            "edges": [{"source": "a", "target": "b", "type": "REFERENCES"}]
        }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    assert_eq!(body.report.metrics.max_out_degree.node_id, "a");
    assert_eq!(body.report.metrics.max_out_degree.value, 1);
}

#[tokio::test]
async fn test_validate_dangling_edge_is_broken_link() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{"id": "a", "type": "skill", "description": "d", "domain": "x"}],
            "edges": [{"source": "a", "target": "ghost", "context": "See ghost."}]
        }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    let broken = &body.report.issues.broken_links;
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].target, "ghost");
    assert_eq!(broken[0].context, "See ghost.");
}

#[tokio::test]
async fn test_validate_invalid_json_body() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "Invalid JSON body.");
}

#[tokio::test]
async fn test_validate_requires_graph_object() {
    let server = create_test_server();

    let response = server.post("/validate").json(&json!([1, 2, 3])).await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "Request must include a graph object.");
}

#[tokio::test]
async fn test_validate_rejects_foreign_kind() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({"graph": {"kind": "recipe", "nodes": [], "edges": []}}))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(
        error.error,
        "Validation is for skill graphs only. Received kind: \"recipe\"."
    );
}

#[tokio::test]
async fn test_validate_nodes_must_be_array() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({"nodes": {"a": 1}, "edges": []}))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "graph.nodes must be an array.");
}

#[tokio::test]
async fn test_validate_edges_must_be_array() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({"nodes": [], "edges": "none"}))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "graph.edges must be an array.");
}

#[tokio::test]
async fn test_validate_node_ceiling() {
    let server = create_server_with(ServerConfig {
        max_nodes: 2,
        ..test_config()
    });

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
            "edges": []
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 413);
    let error: ErrorResponse = response.json();
    assert_eq!(
        error.error,
        "Graph too large for validation endpoint. Max 2 nodes, received 3."
    );
}

#[tokio::test]
async fn test_validate_node_without_id() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({"nodes": [{"name": "no id"}], "edges": []}))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(
        error.error,
        "graph.nodes contains an invalid node: element 0 has no id."
    );
}

#[tokio::test]
async fn test_validate_non_object_edge() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({"nodes": [{"id": "a"}], "edges": ["a->a"]}))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(
        error.error,
        "graph.edges contains an invalid edge: element 0 is not an object."
    );
}

#[tokio::test]
async fn test_validate_non_string_type_is_reported() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{"id": "a", "type": 7, "description": "d", "domain": "x"}],
            "edges": []
        }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    let missing = &body.report.issues.missing_types;
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].node_id, "a");
    assert_eq!(missing[0].node_type.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_validate_scalar_tags_and_aliases() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{
                "id": "a",
                "type": "skill",
                "description": "d",
                "domain": "x",
                "tags": "focus",
                "metadata": {"aliases": "deep work", "wordCount": "many"}
            }],
            "edges": []
        }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    assert!(body.report.issues.missing_types.is_empty());
    assert!(body.report.issues.missing_descriptions.is_empty());
}

#[tokio::test]
async fn test_validate_mismatched_fields_fall_back() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{"id": "a", "type": "skill", "description": {"text": "d"}, "domain": 3}],
            "edges": []
        }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    assert_eq!(body.report.issues.missing_descriptions.len(), 1);
    assert_eq!(body.report.issues.missing_domains.len(), 1);
}

#[tokio::test]
async fn test_validate_edge_without_target_is_broken_link() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&json!({
            "nodes": [{"id": "a", "type": "skill", "description": "d", "domain": "x"}],
            "edges": [{"source": "a", "weight": "heavy"}]
        }))
        .await;

    response.assert_status_ok();
    let body: ValidateResponse = response.json();
    let broken = &body.report.issues.broken_links;
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].source, "a");
    assert_eq!(broken[0].target, "");
}

// =============================================================================
// RUBRIC TESTS
// =============================================================================

#[tokio::test]
async fn test_rubric_endpoint() {
    let server = create_test_server();

    let response = server.get("/validate").await;

    response.assert_status_ok();
    let rubric: RubricResponse = response.json();
    assert_eq!(rubric.endpoint, "POST /validate");
    assert_eq!(rubric.limits.max_nodes, 5000);
    assert_eq!(rubric.limits.rate_limit, "100 requests per minute per IP");
    assert_eq!(rubric.rubric.penalties.len(), 6);
    assert_eq!(rubric.rubric.grades.len(), 4);
}

#[tokio::test]
async fn test_rubric_is_not_rate_limited() {
    let server = create_server_with(ServerConfig {
        rate_limit: 1,
        ..test_config()
    });

    for _ in 0..3 {
        server.get("/validate").await.assert_status_ok();
    }
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_per_client() {
    let server = create_server_with(ServerConfig {
        rate_limit: 2,
        ..test_config()
    });
    let (name, value) = forwarded_for("203.0.113.5");

    for _ in 0..2 {
        server
            .post("/validate")
            .add_header(name.clone(), value.clone())
            .json(&perfect_graph())
            .await
            .assert_status_ok();
    }

    let response = server
        .post("/validate")
        .add_header(name.clone(), value.clone())
        .json(&perfect_graph())
        .await;

    assert_eq!(response.status_code().as_u16(), 429);
    let error: ErrorResponse = response.json();
    assert_eq!(
        error.error,
        "Rate limit exceeded. Max 2 requests per minute."
    );
    assert!(response.headers().get(header::RETRY_AFTER).is_some());

    // Another client still has its own budget.
    let (name, value) = forwarded_for("198.51.100.1");
    server
        .post("/validate")
        .add_header(name, value)
        .json(&perfect_graph())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_rate_limit_counts_rejected_bodies() {
    let server = create_server_with(ServerConfig {
        rate_limit: 1,
        ..test_config()
    });

    let first = server
        .post("/validate")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;
    assert_eq!(first.status_code().as_u16(), 400);

    let second = server.post("/validate").json(&perfect_graph()).await;
    assert_eq!(second.status_code().as_u16(), 429);
}

#[tokio::test]
async fn test_health_is_not_client_rate_limited() {
    let server = create_server_with(ServerConfig {
        rate_limit: 0,
        ..test_config()
    });

    server.get("/health").await.assert_status_ok();
    let response = server.post("/validate").json(&perfect_graph()).await;
    assert_eq!(response.status_code().as_u16(), 429);
}

#[tokio::test]
async fn test_rate_limit_falls_back_to_peer_address() {
    use axum::{body::Body, extract::ConnectInfo, http::Request};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    let router = create_router(AppState::new(ServerConfig {
        rate_limit: 1,
        ..test_config()
    }));
    let request = |ip: [u8; 4]| {
        let mut request = Request::builder()
            .method("POST")
            .uri("/validate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(perfect_graph().to_string()))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 4000))));
        request
    };

    let first = router.clone().oneshot(request([10, 0, 0, 1])).await.unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = router.clone().oneshot(request([10, 0, 0, 1])).await.unwrap();
    assert_eq!(second.status().as_u16(), 429);

    let other = router.oneshot(request([10, 0, 0, 2])).await.unwrap();
    assert_eq!(other.status().as_u16(), 200);
}

// =============================================================================
// BUILD TESTS
// =============================================================================

#[tokio::test]
async fn test_build_endpoint() {
    let server = create_test_server();

    let response = server
        .post("/build")
        .json(&json!({
            "documents": [
                {"path": "hub.md", "content": "---\ntype: moc\ndescription: hub\ndomain: focus\n---\nSee [[leaf]]."},
                {"path": "leaf.md", "content": "---\ntype: skill\ndescription: leaf\ndomain: focus\n---\nA leaf."},
                {"path": "notes.txt", "content": "ignored"}
            ]
        }))
        .await;

    response.assert_status_ok();
    let graph: SkillGraph = response.json();
    assert_eq!(graph.kind, "skill");
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].source, "skill:hub");
    assert_eq!(graph.validation.score, 100);
}

#[tokio::test]
async fn test_build_without_markdown() {
    let server = create_test_server();

    let response = server
        .post("/build")
        .json(&json!({"documents": [{"path": "a.txt", "content": "x"}]}))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "No .md files found.");
}

#[tokio::test]
async fn test_build_too_many_documents() {
    let server = create_test_server();
    let documents: Vec<Value> = (0..501)
        .map(|i| json!({"path": format!("doc-{i}.md"), "content": ""}))
        .collect();

    let response = server
        .post("/build")
        .json(&json!({ "documents": documents }))
        .await;

    assert_eq!(response.status_code().as_u16(), 413);
    let error: ErrorResponse = response.json();
    assert_eq!(error.error, "Too many files (501). Max is 500.");
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}
