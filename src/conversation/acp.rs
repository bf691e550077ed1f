// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ACP-backed [`Conversation`]: drives an agent over a streaming
//! JSON-RPC connection instead of a pseudo-terminal. See spec.md §4.5.
//!
//! The `agent-client-protocol` connection and its futures are `!Send` (the
//! transport holds `Rc` internals), so all protocol I/O runs on a
//! dedicated OS thread with its own single-threaded Tokio runtime and a
//! [`tokio::task::LocalSet`]. The rest of the process only ever exchanges
//! plain `Send` data with that thread over an unbounded channel.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::future::Future;
use std::pin::Pin;

use agent_client_protocol::{
    Agent, AuthenticateRequest, Client, ClientCapabilities, ClientSideConnection, ContentBlock,
    FileSystemCapability, Implementation, InitializeRequest, NewSessionRequest,
    PermissionOptionId, PromptRequest, ProtocolVersion, RequestPermissionOutcome,
    RequestPermissionRequest, RequestPermissionResponse, SelectedPermissionOutcome,
    SessionNotification, SessionUpdate, StopReason, TextContent,
};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::LocalSet;
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::clock::Clock;
use super::{Config, Conversation, ConversationStatus};
use crate::emitter::{ErrorLevel, EventEmitter};
use crate::error::{ApiError, ErrorCode};
use crate::message::{raw_parts, render_parts, ConversationMessage, MessagePart, Role};

/// State shared between the public handle and the worker thread. Plain
/// `Send` data only — the `!Send` connection itself never crosses this
/// boundary.
struct Shared {
    messages: Vec<ConversationMessage>,
    /// Accumulated streaming buffer; doubles as this variant's "screen".
    buffer: String,
    turn_in_flight: bool,
    ready: bool,
}

struct PromptCommand {
    text: String,
    respond: oneshot::Sender<Result<(), ApiError>>,
}

enum WorkerCommand {
    Prompt(PromptCommand),
    Shutdown,
}

/// Drives one ACP agent subprocess from initialize through repeated
/// prompt turns.
pub struct AcpConversation {
    clock: Arc<dyn Clock>,
    shared: Arc<SyncMutex<Shared>>,
    command_tx: mpsc::UnboundedSender<WorkerCommand>,
    worker: SyncMutex<Option<std::thread::JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl AcpConversation {
    pub fn new(
        command: Vec<String>,
        project_root: PathBuf,
        config: Config,
        emitter: Arc<EventEmitter>,
        shutdown: CancellationToken,
    ) -> Self {
        let now = config.clock.now();
        let shared = Arc::new(SyncMutex::new(Shared {
            messages: vec![ConversationMessage::new(0, Role::Agent, "", now)],
            buffer: String::new(),
            turn_in_flight: false,
            ready: false,
        }));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let worker_shared = shared.clone();
        let worker_emitter = emitter.clone();
        let worker_shutdown = shutdown.clone();

        let worker = match std::thread::Builder::new()
            .name("acp-worker".into())
            .spawn(move || run_worker(command, project_root, worker_shared, worker_emitter, command_rx, worker_shutdown))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                emitter.emit_error(format!("failed to spawn ACP worker thread: {e}"), ErrorLevel::Error);
                None
            }
        };

        Self { clock: config.clock, shared, command_tx, worker: SyncMutex::new(worker), shutdown }
    }

    async fn send_impl(&self, parts: Vec<MessagePart>) -> Result<(), ApiError> {
        let rendered = render_parts(&parts);
        if rendered != rendered.trim() {
            return Err(ApiError::new(ErrorCode::Whitespace, "message content must be trimmed"));
        }
        if rendered.is_empty() {
            return Err(ApiError::new(ErrorCode::Empty, "message content must not be empty"));
        }
        if self.status() != ConversationStatus::Stable {
            return Err(ApiError::new(ErrorCode::Changing, "conversation is not stable"));
        }

        let now = self.clock.now();
        {
            let mut shared = self.shared.lock();
            if shared.turn_in_flight || !shared.ready {
                return Err(ApiError::new(ErrorCode::Changing, "conversation is not stable"));
            }
            shared.turn_in_flight = true;
            let user_id = shared.messages.len() as u64;
            shared.messages.push(ConversationMessage::new(user_id, Role::User, rendered, now));
            let agent_id = shared.messages.len() as u64;
            shared.messages.push(ConversationMessage::new(agent_id, Role::Agent, "", now));
        }

        let (tx, rx) = oneshot::channel();
        let raw = raw_parts(&parts);
        if self.command_tx.send(WorkerCommand::Prompt(PromptCommand { text: raw, respond: tx })).is_err() {
            self.mark_connection_dead();
            return Err(ApiError::new(ErrorCode::TerminalIo, "agent connection has shut down"));
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => {
                self.mark_connection_dead();
                Err(ApiError::new(ErrorCode::TerminalIo, "agent connection dropped the request"))
            }
        }
    }

    /// The worker thread is gone; undo the optimistic turn bookkeeping and
    /// stop accepting further sends.
    fn mark_connection_dead(&self) {
        let mut shared = self.shared.lock();
        shared.turn_in_flight = false;
        shared.ready = false;
        shared.messages.truncate(shared.messages.len().saturating_sub(2));
    }
}

impl Conversation for AcpConversation {
    fn send<'a>(&'a self, parts: Vec<MessagePart>) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(self.send_impl(parts))
    }

    fn write_raw<'a>(&'a self, _bytes: Vec<u8>) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(async {
            Err(ApiError::new(ErrorCode::BadRequest, "raw message delivery is not supported over ACP"))
        })
    }

    fn messages(&self) -> Vec<ConversationMessage> {
        self.shared.lock().messages.clone()
    }

    fn status(&self) -> ConversationStatus {
        let shared = self.shared.lock();
        if !shared.ready {
            ConversationStatus::Initializing
        } else if shared.turn_in_flight {
            ConversationStatus::Changing
        } else {
            ConversationStatus::Stable
        }
    }

    fn screen(&self) -> String {
        self.shared.lock().buffer.clone()
    }

    fn start<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { self.shutdown.cancelled().await })
    }

    /// No-op: this variant has no PTY-resumable screen state to persist.
    /// See DESIGN.md's Open Question decision on ACP state persistence.
    fn save_state<'a>(&'a self, _reason: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}

impl Drop for AcpConversation {
    fn drop(&mut self) {
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    command: Vec<String>,
    project_root: PathBuf,
    shared: Arc<SyncMutex<Shared>>,
    emitter: Arc<EventEmitter>,
    command_rx: mpsc::UnboundedReceiver<WorkerCommand>,
    shutdown: CancellationToken,
) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            error!(error = %err, "failed to build acp worker runtime");
            emitter.emit_error(format!("failed to start agent connection: {err}"), ErrorLevel::Error);
            return;
        }
    };
    let local = LocalSet::new();
    local.block_on(&rt, drive_connection(command, project_root, shared, emitter, command_rx, shutdown));
}

async fn drive_connection(
    command: Vec<String>,
    project_root: PathBuf,
    shared: Arc<SyncMutex<Shared>>,
    emitter: Arc<EventEmitter>,
    mut command_rx: mpsc::UnboundedReceiver<WorkerCommand>,
    shutdown: CancellationToken,
) {
    let Some((program, args)) = command.split_first() else {
        emitter.emit_error("agent command is empty", ErrorLevel::Error);
        return;
    };

    let mut child = match tokio::process::Command::new(program)
        .args(args)
        .current_dir(&project_root)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            emitter.emit_error(format!("failed to spawn agent '{program}': {err}"), ErrorLevel::Error);
            return;
        }
    };

    let Some(stdin) = child.stdin.take() else {
        emitter.emit_error("agent child process has no piped stdin", ErrorLevel::Error);
        return;
    };
    let Some(stdout) = child.stdout.take() else {
        emitter.emit_error("agent child process has no piped stdout", ErrorLevel::Error);
        return;
    };
    let outgoing = stdin.compat_write();
    let incoming = stdout.compat();

    let client = Rc::new(AcpClient::new(shared.clone(), emitter.clone()));
    let (conn, io_future) = ClientSideConnection::new(client, outgoing, incoming, |fut| {
        tokio::task::spawn_local(fut);
    });
    let io_handle = tokio::task::spawn_local(async move {
        let _ = io_future.await;
    });

    let init_req = InitializeRequest::new(ProtocolVersion::LATEST)
        .client_capabilities(ClientCapabilities::new().fs(FileSystemCapability::new().read_text_file(false).write_text_file(false)).terminal(false))
        .client_info(Implementation::new("agentapi", env!("CARGO_PKG_VERSION")));

    let init_resp = match conn.initialize(init_req).await {
        Ok(resp) => resp,
        Err(err) => {
            emitter.emit_error(format!("ACP initialize failed: {err}"), ErrorLevel::Error);
            let _ = child.kill().await;
            return;
        }
    };

    for method in &init_resp.auth_methods {
        let _ = conn.authenticate(AuthenticateRequest::new(method.id.clone())).await;
    }

    let session_resp = match conn.new_session(NewSessionRequest::new(project_root.clone())).await {
        Ok(resp) => resp,
        Err(err) => {
            emitter.emit_error(format!("ACP new_session failed: {err}"), ErrorLevel::Error);
            let _ = child.kill().await;
            return;
        }
    };
    let session_id = session_resp.session_id;

    {
        let mut s = shared.lock();
        s.ready = true;
    }
    emitter.emit_status(ConversationStatus::Stable);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            cmd = command_rx.recv() => {
                match cmd {
                    Some(WorkerCommand::Prompt(PromptCommand { text, respond })) => {
                        let prompt_req = PromptRequest::new(
                            session_id.clone(),
                            vec![ContentBlock::Text(TextContent::new(text))],
                        );
                        let result = match conn.prompt(prompt_req).await {
                            Ok(resp) => match resp.stop_reason {
                                StopReason::EndTurn => Ok(()),
                                other => {
                                    Err(ApiError::new(
                                        ErrorCode::Internal,
                                        format!("agent turn stopped without completing: {other:?}"),
                                    ))
                                }
                            },
                            Err(err) => Err(ApiError::new(ErrorCode::TerminalIo, format!("ACP prompt failed: {err}"))),
                        };

                        {
                            let mut s = shared.lock();
                            s.turn_in_flight = false;
                        }
                        emitter.emit_messages(&shared.lock().messages.clone());
                        emitter.emit_status(ConversationStatus::Stable);
                        let _ = respond.send(result);
                    }
                    Some(WorkerCommand::Shutdown) | None => break,
                }
            }
        }
    }

    io_handle.abort();
    let _ = child.kill().await;
}

/// Implements the handful of `Client` callbacks this core needs; every
/// other capability (file system, terminal creation) is left to the
/// crate's default "unsupported" implementations since both are
/// advertised as disabled in `ClientCapabilities`.
struct AcpClient {
    shared: Arc<SyncMutex<Shared>>,
    emitter: Arc<EventEmitter>,
}

impl AcpClient {
    fn new(shared: Arc<SyncMutex<Shared>>, emitter: Arc<EventEmitter>) -> Self {
        Self { shared, emitter }
    }

    fn append_to_current_turn(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let snapshot = {
            let mut shared = self.shared.lock();
            if let Some(last) = shared.messages.last_mut() {
                if last.role == Role::Agent {
                    last.message.push_str(text);
                }
            }
            shared.buffer.push_str(text);
            shared.messages.clone()
        };
        self.emitter.emit_messages(&snapshot);
        self.emitter.emit_screen(&self.shared.lock().buffer);
    }
}

#[async_trait::async_trait(?Send)]
impl Client for AcpClient {
    async fn request_permission(
        &self,
        args: RequestPermissionRequest,
    ) -> agent_client_protocol::Result<RequestPermissionResponse> {
        debug!("auto-approving agent permission request");
        let option_id = args
            .options
            .first()
            .map(|opt| opt.option_id.clone())
            .unwrap_or_else(|| PermissionOptionId::new("allow_once"));
        Ok(RequestPermissionResponse::new(RequestPermissionOutcome::Selected(SelectedPermissionOutcome::new(
            option_id,
        ))))
    }

    async fn session_notification(&self, args: SessionNotification) -> agent_client_protocol::Result<()> {
        match args.update {
            SessionUpdate::AgentMessageChunk(chunk) => {
                if let ContentBlock::Text(text) = chunk.content {
                    self.append_to_current_turn(&text.text);
                }
            }
            SessionUpdate::ToolCall(tool_call) => {
                let kind = format!("{:?}", tool_call.kind).to_lowercase();
                self.append_to_current_turn(&format_tool_call(&kind, &tool_call.title));
            }
            SessionUpdate::ToolCallUpdate(update) => {
                if let Some(status) = update.fields.status {
                    let status = format!("{status:?}").to_lowercase();
                    self.append_to_current_turn(&format_tool_status(&status));
                }
            }
            other => {
                warn!(update = ?other, "unhandled ACP session update");
            }
        }
        Ok(())
    }
}

/// `"\n[Tool: <kind>] <title>\n"` per spec.md §4.5.
fn format_tool_call(kind: &str, title: &str) -> String {
    format!("\n[Tool: {kind}] {title}\n")
}

/// `"[Tool Status: <s>]\n"` per spec.md §4.5.
fn format_tool_status(status: &str) -> String {
    format!("[Tool Status: {status}]\n")
}

#[cfg(test)]
#[path = "acp_tests.rs"]
mod tests;
