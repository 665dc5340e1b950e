#![allow(clippy::unwrap_used)]
// Integration tests for tags, deployment modes and OpenAPI discovery using wiremock.

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ignition_api::models::{ModeDraft, ProjectDraft, TagWrite};
use ignition_api::{
    CollisionPolicy, Credential, ErrorKind, GatewayClient, ResolvedConnection, TagFormat,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;
    let connection = ResolvedConnection::new(&server.uri(), true, 5.0).unwrap();
    let client = GatewayClient::new(connection, Credential::token("k:s")).unwrap();
    (server, client)
}

// ── Tags ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tag_import_defaults_to_merge_overwrite() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tags.json");
    std::fs::write(&file, br#"{"tags": []}"#).unwrap();

    Mock::given(method("POST"))
        .and(path("/data/api/v1/tags/import"))
        .and(query_param("provider", "default"))
        .and(query_param("type", "json"))
        .and(query_param("collisionPolicy", "MergeOverwrite"))
        .and(query_param_is_missing("path"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .import_tags(&file, "default", None, None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, br#"{"tags": []}"#);
}

#[tokio::test]
async fn test_tag_import_explicit_policy_and_csv() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tags.csv");
    std::fs::write(&file, "Path,Value\nMotor/Speed,1\n").unwrap();

    Mock::given(method("POST"))
        .and(path("/data/api/v1/tags/import"))
        .and(query_param("type", "csv"))
        .and(query_param("collisionPolicy", "Rename"))
        .and(query_param("path", "Imports"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .import_tags(&file, "edge", Some("Imports"), Some(CollisionPolicy::Rename))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_tag_export_returns_body() {
    let (server, client) = setup().await;
    let exported = json!({"name": "", "tagType": "Provider", "tags": []});

    Mock::given(method("GET"))
        .and(path("/data/api/v1/tags/export"))
        .and(query_param("provider", "default"))
        .and(query_param("type", "json"))
        .and(query_param("path", "Motors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&exported))
        .mount(&server)
        .await;

    let body = client
        .export_tags("default", Some("Motors"), TagFormat::Json)
        .await
        .unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), exported);
}

#[tokio::test]
async fn test_tag_read_and_write() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/data/api/v1/tags/read"))
        .and(query_param("provider", "default"))
        .and(body_json(json!(["Motor/Speed", "Motor/Running"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "Motor/Speed", "value": 1200},
            {"path": "Motor/Running", "value": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/data/api/v1/tags/write"))
        .and(query_param("provider", "default"))
        .and(body_json(json!([
            {"path": "Motor/Speed", "value": 900},
            {"path": "Motor/Label", "value": "north"}
        ])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let values = client
        .read_tags("default", &["Motor/Speed", "Motor/Running"])
        .await
        .unwrap();
    assert_eq!(values[0]["value"], json!(1200));

    let writes = [
        TagWrite::parse("Motor/Speed", "900"),
        TagWrite::parse("Motor/Label", "north"),
    ];
    client.write_tags("default", &writes).await.unwrap();
}

#[tokio::test]
async fn test_tag_read_without_endpoint_is_not_found() {
    let (_server, client) = setup().await;

    let err = client.read_tags("default", &["A"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ── Deployment modes ────────────────────────────────────────────────

#[tokio::test]
async fn test_mode_create_update_delete() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/data/api/v1/mode"))
        .and(body_json(json!({"name": "dev", "title": "Development"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/data/api/v1/mode/dev"))
        .and(body_json(json!({"description": "Local testing"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/data/api/v1/mode/dev"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .create_mode(&ModeDraft::named("dev").title("Development"))
        .await
        .unwrap();
    client
        .update_mode("dev", &ModeDraft::default().description("Local testing"))
        .await
        .unwrap();
    client.delete_mode("dev").await.unwrap();
}

#[tokio::test]
async fn test_mode_create_requires_name() {
    let (server, client) = setup().await;

    let err = client.create_mode(&ModeDraft::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mode_delete_in_use_is_conflict() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/data/api/v1/mode/prod"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "Mode has resources"})),
        )
        .mount(&server)
        .await;

    let err = client.delete_mode("prod").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

// ── Projects, modules and logs ──────────────────────────────────────

#[tokio::test]
async fn test_project_lifecycle_calls() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/data/api/v1/projects"))
        .and(body_json(json!({"name": "Plant", "title": "Plant HMI"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/data/api/v1/projects/copy"))
        .and(body_json(json!({"fromName": "Plant", "toName": "Plant Copy"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/data/api/v1/projects/rename/Plant%20Copy"))
        .and(body_json(json!({"name": "Line2"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/api/v1/projects/find/Line2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "Line2", "enabled": true, "inheritable": false})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/data/api/v1/projects/Line2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .create_project(&ProjectDraft::named("Plant").title("Plant HMI"))
        .await
        .unwrap();
    client.copy_project("Plant", "Plant Copy").await.unwrap();
    client.rename_project("Plant Copy", "Line2").await.unwrap();
    let found = client.find_project("Line2").await.unwrap();
    assert_eq!(found.enabled, Some(true));
    assert_eq!(found.extra.get("inheritable"), Some(&json!(false)));
    client.delete_project("Line2").await.unwrap();
}

#[tokio::test]
async fn test_project_create_requires_name() {
    let (server, client) = setup().await;

    let err = client
        .create_project(&ProjectDraft::named(" "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_modules_accept_named_list_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/api/v1/modules/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modules": [{"name": "OPC UA", "id": "com.inductiveautomation.opcua", "version": "8.3.0", "state": "RUNNING"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/api/v1/modules/quarantined"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let healthy = client.list_modules(false).await.unwrap();
    assert_eq!(healthy.len(), 1);
    assert_eq!(healthy[0].state.as_deref(), Some("RUNNING"));
    assert!(client.list_modules(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_log_query_and_loggers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/api/v1/logs"))
        .and(query_param("limit", "2"))
        .and(query_param("level", "WARN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [
                {"timestamp": 1_700_000_000_000_i64, "level": "WARN", "loggerName": "gateway", "message": "slow"},
                {"timestamp": 1_700_000_000_500_i64, "level": "ERROR", "loggerName": "db", "message": "down"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/api/v1/logs/loggers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"name": "gateway", "level": "INFO"}])),
        )
        .mount(&server)
        .await;

    let entries = client.query_logs(2, Some("WARN")).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].logger_name.as_deref(), Some("db"));

    let loggers = client.loggers().await.unwrap();
    assert_eq!(loggers[0].level.as_deref(), Some("INFO"));
}

// ── OpenAPI discovery ───────────────────────────────────────────────

async fn mount_openapi(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openapi": "3.0.1",
            "paths": {
                "/data/api/v1/gateway-info": {
                    "get": {"summary": "Gateway information"}
                },
                "/data/api/v1/resources/list/ignition/database-connection": {
                    "get": {"summary": "List database connections"}
                },
                "/data/api/v1/resources/ignition/database-connection": {
                    "post": {"summary": "Create"},
                    "put": {"description": "Update"}
                }
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discover_filters_by_path_and_method() {
    let (server, client) = setup().await;
    mount_openapi(&server).await;

    let puts = client
        .discover(Some("DATABASE-connection"), Some("put"))
        .await
        .unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].method, "PUT");
    assert_eq!(puts[0].summary, "Update");

    let none = client.discover(Some("perspective"), None).await.unwrap();
    assert!(none.is_empty());

    let all = client.discover(None, None).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_resource_types_from_live_document() {
    let (server, client) = setup().await;
    mount_openapi(&server).await;

    assert_eq!(
        client.resource_types().await.unwrap(),
        vec!["ignition/database-connection"]
    );
}
