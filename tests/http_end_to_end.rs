//! End-to-end tests driving the real axum router, a real `PtyConversation`,
//! and a `FakeTerminal` together — no mocks, unlike the module-level tests
//! under `src/http/`. Each test name cross-references the scenario it
//! exercises.

use std::sync::Arc;
use std::time::Duration;

use agentapi::agent_type::AgentType;
use agentapi::conversation::clock::RealClock;
use agentapi::conversation::pty::PtyConversation;
use agentapi::conversation::{Config, Conversation, StatePersistence};
use agentapi::emitter::EventEmitter;
use agentapi::http::{build_router, AppState};
use agentapi::pty::fake::FakeTerminal;
use tokio_util::sync::CancellationToken;

fn conversation_config() -> Config {
    Config {
        agent_type: AgentType::Custom,
        clock: Arc::new(RealClock),
        snapshot_interval: Duration::from_millis(10),
        screen_stability_length: Duration::from_millis(30),
        initial_prompt: Vec::new(),
        state_persistence: StatePersistence::default(),
    }
}

fn test_server(conversation: Arc<dyn Conversation>) -> axum_test::TestServer {
    let state = Arc::new(AppState {
        conversation,
        emitter: Arc::new(EventEmitter::new(Box::new(RealClock))),
        agent_type: AgentType::Custom,
        transport: "pty",
        chat_base_path: "/chat".into(),
        allowed_hosts: vec!["*".into()],
        auth_token: None,
    });
    axum_test::TestServer::new(build_router(state, &["*".into()])).unwrap()
}

async fn wait_for_stable(server: &axum_test::TestServer) {
    for _ in 0..200 {
        let resp = server.get("/status").await;
        let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
        if body["status"] == "stable" {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("conversation never reached stable");
}

/// S1: a stable prompt, a user message, and the exact bracketed-paste bytes
/// written to the terminal.
#[tokio::test]
async fn happy_path_send_reaches_history_and_writes_bracketed_paste() {
    let terminal = Arc::new(FakeTerminal::new(80, 24));
    terminal.push_output(b"> ");

    let emitter = Arc::new(EventEmitter::new(Box::new(RealClock)));
    let shutdown = CancellationToken::new();
    let conversation: Arc<dyn Conversation> =
        Arc::new(PtyConversation::new(conversation_config(), terminal.clone(), emitter, shutdown.clone()));

    let bg = tokio::spawn({
        let conversation = conversation.clone();
        async move { conversation.start().await }
    });

    let server = test_server(conversation.clone());
    wait_for_stable(&server).await;

    let resp = server.post("/message").json(&serde_json::json!({"type": "user", "content": "hello"})).await;
    resp.assert_status(axum::http::StatusCode::NO_CONTENT);

    wait_for_stable(&server).await;

    let resp = server.get("/messages").await;
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    let msgs = body["messages"].as_array().unwrap();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0]["role"], "agent");
    assert_eq!(msgs[1]["role"], "user");
    assert_eq!(msgs[1]["content"], "hello");

    let writes = terminal.writes();
    let written: Vec<u8> = writes.iter().flat_map(|b| b.to_vec()).collect();
    let written = String::from_utf8_lossy(&written);
    assert!(written.starts_with("x\u{8}\u{1b}[200~hello\u{1b}[201~"), "got: {written:?}");

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), bg).await;
}

/// S4: a diff between two stable screens becomes `{user}` then `{agent}`
/// history entries once the terminal settles again.
#[tokio::test]
async fn screen_diff_extracts_user_and_agent_messages() {
    let terminal = Arc::new(FakeTerminal::new(80, 24));
    terminal.push_output(b"A\n> ");

    let emitter = Arc::new(EventEmitter::new(Box::new(RealClock)));
    let shutdown = CancellationToken::new();
    let conversation: Arc<dyn Conversation> =
        Arc::new(PtyConversation::new(conversation_config(), terminal.clone(), emitter, shutdown.clone()));

    let bg = tokio::spawn({
        let conversation = conversation.clone();
        async move { conversation.start().await }
    });

    let server = test_server(conversation.clone());
    wait_for_stable(&server).await;

    terminal.push_output(b"\r2");
    tokio::time::sleep(Duration::from_millis(60)).await;
    terminal.push_output(b"\nreply");

    wait_for_stable(&server).await;

    let resp = server.get("/messages").await;
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    let msgs = body["messages"].as_array().unwrap();
    let last_two: Vec<_> = msgs.iter().rev().take(2).collect();
    assert_eq!(last_two[1]["role"], "user");
    assert_eq!(last_two[1]["content"], "2");
    assert_eq!(last_two[0]["role"], "agent");
    assert_eq!(last_two[0]["content"], "reply");

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), bg).await;
}

/// S2: a send while the screen is continually changing is rejected and
/// leaves history untouched.
#[tokio::test]
async fn send_while_changing_is_rejected() {
    let terminal = Arc::new(FakeTerminal::new(80, 24));
    terminal.push_output(b"> ");

    let emitter = Arc::new(EventEmitter::new(Box::new(RealClock)));
    let shutdown = CancellationToken::new();
    let conversation: Arc<dyn Conversation> =
        Arc::new(PtyConversation::new(conversation_config(), terminal.clone(), emitter, shutdown.clone()));

    let bg = tokio::spawn({
        let conversation = conversation.clone();
        async move { conversation.start().await }
    });

    let server = test_server(conversation.clone());
    wait_for_stable(&server).await;

    let flapper = {
        let terminal = terminal.clone();
        tokio::spawn(async move {
            for i in 0..50u32 {
                terminal.push_output(format!("{i}").as_bytes());
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let before = server.get("/messages").await;
    let resp = server.post("/message").json(&serde_json::json!({"type": "user", "content": "x"})).await;
    resp.assert_status(axum::http::StatusCode::CONFLICT);
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["error"], "changing");

    let after = server.get("/messages").await;
    assert_eq!(before.text(), after.text());

    flapper.abort();
    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(1), bg).await;
}

/// S7: the host guard runs in front of the real router, not just the
/// middleware in isolation.
#[tokio::test]
async fn host_guard_rejects_mismatched_host_on_the_full_router() {
    let terminal = Arc::new(FakeTerminal::new(80, 24));
    terminal.push_output(b"> ");
    let emitter = Arc::new(EventEmitter::new(Box::new(RealClock)));
    let shutdown = CancellationToken::new();
    let conversation: Arc<dyn Conversation> =
        Arc::new(PtyConversation::new(conversation_config(), terminal, emitter, shutdown));

    let state = Arc::new(AppState {
        conversation,
        emitter: Arc::new(EventEmitter::new(Box::new(RealClock))),
        agent_type: AgentType::Custom,
        transport: "pty",
        chat_base_path: "/chat".into(),
        allowed_hosts: vec!["localhost".into()],
        auth_token: None,
    });
    let server = axum_test::TestServer::new(build_router(state, &["*".into()])).unwrap();

    let resp = server.get("/status").add_header("host", "malicious.example").await;
    resp.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let resp = server.get("/status").add_header("host", "LOCALHOST:8080").await;
    resp.assert_status(axum::http::StatusCode::OK);
}
