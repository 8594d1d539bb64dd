//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::{Value, json};
use skillgraph::api::{
    BuildRequest, ErrorResponse, HealthResponse, Limits, RubricResponse, ValidateRequest,
    ValidateResponse,
};
use skillgraph_core::{SkillGraphError, Validator};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_error_response_shape() {
    let json = serde_json::to_value(ErrorResponse::new("No .md files found.")).unwrap();
    assert_eq!(json, json!({"error": "No .md files found."}));
}

// =============================================================================
// VALIDATE REQUEST TESTS
// =============================================================================

#[test]
fn test_validate_request_prefers_graph_field() {
    let body = json!({
        "graph": {"id": "g", "nodes": [{"id": "a"}], "edges": []},
        "nodes": "ignored"
    });

    let request = ValidateRequest::from_json(body, 10).unwrap();
    assert_eq!(request.graph_id, Some(json!("g")));
    assert_eq!(request.nodes.len(), 1);
}

#[test]
fn test_validate_request_falsy_graph_uses_body() {
    let body = json!({"graph": null, "nodes": [], "edges": []});

    let request = ValidateRequest::from_json(body, 10).unwrap();
    assert!(request.nodes.is_empty());
    assert_eq!(request.graph_id, None);
}

#[test]
fn test_validate_request_accepts_matching_or_missing_kind() {
    for kind in [json!("skill"), json!(""), Value::Null] {
        let body = json!({"kind": kind, "nodes": [], "edges": []});
        assert!(ValidateRequest::from_json(body, 10).is_ok());
    }
}

#[test]
fn test_validate_request_non_string_kind() {
    let body = json!({"kind": 7, "nodes": [], "edges": []});

    let err = ValidateRequest::from_json(body, 10).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation is for skill graphs only. Received kind: \"7\"."
    );
}

#[test]
fn test_validate_request_rejects_scalar_body() {
    let err = ValidateRequest::from_json(json!("graph"), 10).unwrap_err();
    assert!(matches!(err, SkillGraphError::InvalidGraph(_)));
}

#[test]
fn test_validate_request_checks_nodes_before_size() {
    let body = json!({"nodes": [{"id": "a"}, {"id": "b"}]});

    let err = ValidateRequest::from_json(body, 1).unwrap_err();
    assert_eq!(err.to_string(), "graph.edges must be an array.");
}

#[test]
fn test_validate_request_null_fields_default() {
    let body = json!({
        "nodes": [{"id": "a", "name": null, "description": null, "tags": null}],
        "edges": [{"source": "a", "target": "a", "label": null, "weight": null}]
    });

    let request = ValidateRequest::from_json(body, 10).unwrap();
    assert_eq!(request.nodes[0].description, "");
    assert!(request.nodes[0].tags.is_empty());
    assert_eq!(request.edges[0].label, "");
}

#[test]
fn test_validate_request_coerces_loose_shapes() {
    let body = json!({
        "nodes": [{
            "id": 12,
            "type": ["skill"],
            "name": false,
            "tags": ["focus", 3, null],
            "source": "notes/a.md",
            "metadata": {"aliases": "a", "inDegree": -1}
        }],
        "edges": [{"target": "12", "type": 4, "label": 9}]
    });

    let request = ValidateRequest::from_json(body, 10).unwrap();
    let node = &request.nodes[0];
    assert_eq!(node.id, "12");
    assert_eq!(node.node_type.as_ref().map(|t| t.as_str()), Some("[\"skill\"]"));
    assert_eq!(node.name, "false");
    assert_eq!(
        node.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["3", "focus"]
    );
    assert_eq!(node.source.file_path, "");
    assert_eq!(node.metadata.aliases, vec!["a".to_string()]);
    assert_eq!(node.metadata.in_degree, 0);

    let edge = &request.edges[0];
    assert_eq!(edge.source, "");
    assert_eq!(edge.edge_type.as_ref().map(|t| t.as_str()), Some("4"));
    assert_eq!(edge.label, "9");
}

#[test]
fn test_validate_request_rejects_non_object_node() {
    let body = json!({"nodes": [{"id": "a"}, 5], "edges": []});

    let err = ValidateRequest::from_json(body, 10).unwrap_err();
    assert_eq!(
        err.to_string(),
        "graph.nodes contains an invalid node: element 1 is not an object."
    );
}

// =============================================================================
// VALIDATE RESPONSE TESTS
// =============================================================================

#[test]
fn test_validate_response_flattens_report() {
    let report = Validator::new().validate(&[], &[]);
    let response = ValidateResponse::new(Some(json!("g-1")), report);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["graphId"], "g-1");
    assert_eq!(json["kind"], "skill");
    assert_eq!(json["score"], 100);
    assert_eq!(json["maxScore"], 100);
    assert_eq!(json["grade"], "A");
    assert!(json["issues"]["brokenLinks"].is_array());
    assert!(json["bonuses"]["mocCoverage"].is_object());
    assert_eq!(
        json["summary"],
        "Perfect score! Graph has no structural issues."
    );
}

#[test]
fn test_validate_response_roundtrip() {
    let report = Validator::new().validate(&[], &[]);
    let response = ValidateResponse::new(None, report);

    let json = serde_json::to_string(&response).unwrap();
    let parsed: ValidateResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}

// =============================================================================
// RUBRIC RESPONSE TESTS
// =============================================================================

#[test]
fn test_rubric_response_field_names() {
    let response = RubricResponse {
        endpoint: "POST /validate".to_string(),
        description: "d".to_string(),
        rubric: Validator::new().rubric().describe(),
        limits: Limits {
            max_nodes: 5000,
            rate_limit: "100 requests per minute per IP".to_string(),
        },
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["limits"]["maxNodes"], 5000);
    assert_eq!(json["limits"]["rateLimit"], "100 requests per minute per IP");
    assert_eq!(json["rubric"]["maxScore"], 100);
}

// =============================================================================
// BUILD REQUEST TESTS
// =============================================================================

#[test]
fn test_build_request_deserialization() {
    let request: BuildRequest = serde_json::from_value(json!({
        "documents": [{"path": "a.md", "content": "# A"}]
    }))
    .unwrap();

    assert_eq!(request.documents.len(), 1);
    assert_eq!(request.documents[0].path, "a.md");
}

#[test]
fn test_build_request_missing_documents() {
    let result: Result<BuildRequest, _> = serde_json::from_value(json!({}));
    assert!(result.is_err());
}
