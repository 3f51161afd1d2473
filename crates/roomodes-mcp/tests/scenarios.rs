//! End-to-end scenarios driving the server through `handle_message`,
//! exactly as a stdio client would line by line.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use roomodes_core::{
    builtin_modes, ModeRegistry, SessionManager, TaskOrchestrator, ToolCatalog,
    DEFAULT_CLEANUP_INTERVAL, DEFAULT_SESSION_TIMEOUT,
};
use roomodes_mcp::{McpServer, ModesHandler, RequestId, Response};

fn build_server(timeout: Duration) -> (McpServer<ModesHandler>, Arc<SessionManager>) {
    let registry = Arc::new(ModeRegistry::from_modes(builtin_modes()));
    let orchestrator = Arc::new(TaskOrchestrator::new(
        Arc::clone(&registry),
        ToolCatalog::standard(),
    ));
    let sessions = Arc::new(SessionManager::new(
        orchestrator,
        timeout,
        DEFAULT_CLEANUP_INTERVAL,
    ));
    let handler = ModesHandler::new(registry, Arc::clone(&sessions));
    (McpServer::new(handler), sessions)
}

fn server() -> McpServer<ModesHandler> {
    build_server(DEFAULT_SESSION_TIMEOUT).0
}

async fn request(server: &mut McpServer<ModesHandler>, id: i64, method: &str, params: Value) -> Response {
    let line = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
    .to_string();
    server.handle_message(&line).await.expect("request must produce a response")
}

async fn call_tool(
    server: &mut McpServer<ModesHandler>,
    id: i64,
    name: &str,
    arguments: Value,
) -> Response {
    request(
        server,
        id,
        "tools/call",
        json!({ "name": name, "arguments": arguments }),
    )
    .await
}

fn tool_text(response: &Response) -> &str {
    response.result.as_ref().unwrap()["content"][0]["text"]
        .as_str()
        .unwrap()
}

fn tool_metadata(response: &Response) -> &Value {
    &response.result.as_ref().unwrap()["metadata"]
}

async fn create_session(server: &mut McpServer<ModesHandler>, mode: &str) -> String {
    let response = call_tool(server, 90, "create_task", json!({ "mode_slug": mode })).await;
    tool_metadata(&response)["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn s1_list_then_inspect() {
    let mut server = server();

    let response = request(&mut server, 1, "resources/list", json!({})).await;
    let resources = response.result.unwrap()["resources"]
        .as_array()
        .unwrap()
        .clone();
    let uris: Vec<&str> = resources
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert!(uris.contains(&"mode://code"));
    assert!(uris.contains(&"mode://code/config"));
    assert!(uris.contains(&"mode://code/system_prompt"));

    let response = request(
        &mut server,
        2,
        "resources/read",
        json!({ "uri": "mode://code/config" }),
    )
    .await;
    let text = response.result.unwrap()["contents"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["slug"], "code");
    assert!(parsed["groups"].as_array().unwrap().iter().any(|g| g == "edit"));
}

#[tokio::test]
async fn s2_task_creation_and_info() {
    let mut server = server();

    let response = call_tool(&mut server, 1, "create_task", json!({ "mode_slug": "code" })).await;
    let metadata = tool_metadata(&response);
    let session_id = metadata["session_id"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());
    assert_eq!(metadata["mode_slug"], "code");

    let response = call_tool(
        &mut server,
        2,
        "get_task_info",
        json!({ "session_id": session_id }),
    )
    .await;
    let text = tool_text(&response);
    assert!(text.contains("Mode: 💻 Code (code)"));
    assert!(text.contains("State: active"));
}

#[tokio::test]
async fn s3_restriction_enforcement() {
    let mut server = server();
    let session_id = create_session(&mut server, "architect").await;

    let denied = call_tool(
        &mut server,
        1,
        "validate_tool_use",
        json!({
            "session_id": session_id,
            "tool_name": "write_to_file",
            "file_path": "main.py"
        }),
    )
    .await;
    let metadata = tool_metadata(&denied);
    assert_eq!(metadata["allowed"], false);
    assert!(metadata["reason"].as_str().unwrap().contains("\\.md$"));

    let allowed = call_tool(
        &mut server,
        2,
        "validate_tool_use",
        json!({
            "session_id": session_id,
            "tool_name": "write_to_file",
            "file_path": "README.md"
        }),
    )
    .await;
    assert_eq!(tool_metadata(&allowed)["allowed"], true);
}

#[tokio::test]
async fn s4_mode_switch_changes_capability() {
    let mut server = server();
    let session_id = create_session(&mut server, "architect").await;

    let response = call_tool(
        &mut server,
        1,
        "switch_mode",
        json!({ "session_id": session_id, "new_mode_slug": "code" }),
    )
    .await;
    assert!(response.error.is_none());

    let allowed = call_tool(
        &mut server,
        2,
        "validate_tool_use",
        json!({
            "session_id": session_id,
            "tool_name": "write_to_file",
            "file_path": "main.py"
        }),
    )
    .await;
    assert_eq!(tool_metadata(&allowed)["allowed"], true);
}

#[tokio::test]
async fn s5_session_expiry() {
    let (mut server, sessions) = build_server(Duration::ZERO);
    let session_id = create_session(&mut server, "code").await;
    std::thread::sleep(Duration::from_millis(10));

    sessions.sweep_expired();

    let response = call_tool(
        &mut server,
        1,
        "get_task_info",
        json!({ "session_id": session_id }),
    )
    .await;
    let error = response.error.unwrap();
    assert!(error.code == -32002 || error.code == -32003);
}

#[tokio::test]
async fn s6_parent_child() {
    let mut server = server();

    let parent = call_tool(
        &mut server,
        1,
        "create_task",
        json!({ "mode_slug": "orchestrator" }),
    )
    .await;
    let parent_session = tool_metadata(&parent)["session_id"]
        .as_str()
        .unwrap()
        .to_string();
    let parent_task = tool_metadata(&parent)["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let child = call_tool(
        &mut server,
        2,
        "create_task",
        json!({ "mode_slug": "code", "parent_session_id": parent_session }),
    )
    .await;
    let child_session = tool_metadata(&child)["session_id"]
        .as_str()
        .unwrap()
        .to_string();
    let child_task = tool_metadata(&child)["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let parent_info = call_tool(
        &mut server,
        3,
        "get_task_info",
        json!({ "session_id": parent_session, "include_hierarchy": true }),
    )
    .await;
    assert!(tool_text(&parent_info).contains(&child_task));

    let child_info = call_tool(
        &mut server,
        4,
        "get_task_info",
        json!({ "session_id": child_session, "include_hierarchy": true }),
    )
    .await;
    assert!(tool_text(&child_info).contains(&parent_task));

    // Completing the parent does not auto-complete the child.
    call_tool(
        &mut server,
        5,
        "complete_task",
        json!({ "session_id": parent_session, "status": "completed" }),
    )
    .await;
    let child_info = call_tool(
        &mut server,
        6,
        "get_task_info",
        json!({ "session_id": child_session }),
    )
    .await;
    assert_eq!(tool_metadata(&child_info)["state"], "active");
}

#[tokio::test]
async fn boundary_errors() {
    let mut server = server();

    // Unknown URI scheme.
    let response = request(
        &mut server,
        1,
        "resources/read",
        json!({ "uri": "file://something" }),
    )
    .await;
    assert_eq!(response.error.unwrap().code, -32004);

    // Unknown slug in URI.
    let response = request(
        &mut server,
        2,
        "resources/read",
        json!({ "uri": "mode://nonexistent" }),
    )
    .await;
    assert_eq!(response.error.unwrap().code, -32001);

    // create_task with unknown mode.
    let response = call_tool(
        &mut server,
        3,
        "create_task",
        json!({ "mode_slug": "nonexistent" }),
    )
    .await;
    assert_eq!(response.error.unwrap().code, -32001);

    // switch_mode after completion: the session is removed together with
    // the completion response, so the id resolves to TASK_NOT_FOUND. The
    // terminal-state conflict itself is covered by the orchestrator tests.
    let session_id = create_session(&mut server, "code").await;
    let response = call_tool(
        &mut server,
        4,
        "complete_task",
        json!({ "session_id": session_id, "status": "completed" }),
    )
    .await;
    assert!(response.error.is_none());
    let response = call_tool(
        &mut server,
        5,
        "switch_mode",
        json!({ "session_id": session_id, "new_mode_slug": "ask" }),
    )
    .await;
    // The session was removed with the response, so the id is unknown now.
    assert_eq!(response.error.unwrap().code, -32002);

    // complete_task with a status outside the enum.
    let session_id = create_session(&mut server, "code").await;
    let response = call_tool(
        &mut server,
        6,
        "complete_task",
        json!({ "session_id": session_id, "status": "finished" }),
    )
    .await;
    assert_eq!(response.error.unwrap().code, -32004);
}

#[tokio::test]
async fn round_trip_list_then_get() {
    let mut server = server();
    let response = call_tool(&mut server, 1, "list_modes", json!({ "source": "all" })).await;
    let slugs: Vec<String> = tool_metadata(&response)["slugs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect();
    assert!(!slugs.is_empty());

    for (i, slug) in slugs.iter().enumerate() {
        let response = call_tool(
            &mut server,
            10 + i as i64,
            "get_mode_info",
            json!({ "mode_slug": slug }),
        )
        .await;
        assert!(response.error.is_none(), "get_mode_info failed for {}", slug);
    }
}

#[tokio::test]
async fn response_ids_match_requests() {
    let mut server = server();

    let response = request(&mut server, 42, "tools/list", json!({})).await;
    assert_eq!(response.id, RequestId::Number(42));

    let line = json!({
        "jsonrpc": "2.0",
        "id": "string-id",
        "method": "ping",
    })
    .to_string();
    let response = server.handle_message(&line).await.unwrap();
    assert_eq!(response.id, RequestId::String("string-id".to_string()));

    // Notifications produce no response.
    let line = json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized",
    })
    .to_string();
    assert!(server.handle_message(&line).await.is_none());
}

#[tokio::test]
async fn initialize_handshake() {
    let mut server = server();
    let response = request(
        &mut server,
        1,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": { "name": "scenario-client", "version": "1.0" }
        }),
    )
    .await;
    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["capabilities"]["resources"]["listChanged"], false);
    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
}
