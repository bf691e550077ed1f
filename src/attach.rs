// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agentapi attach` — a companion terminal client for a running server.
//! Prints the current conversation, streams `/events` to stdout, and reads
//! lines from stdin to post as user messages. Deliberately a line-oriented
//! REPL rather than a raw-mode TTY proxy — the server already owns the
//! agent's real terminal; this is plumbing for humans watching over HTTP.

use std::io::{BufRead, Write};

use eventsource_client::{Client, SSE};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::warn;

use crate::config::AttachArgs;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    agent_type: String,
    transport: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<RemoteMessage>,
}

#[derive(Debug, Deserialize)]
struct RemoteMessage {
    id: u64,
    role: String,
    content: String,
}

/// Run the attach client to completion; the return value is the process
/// exit code (0 clean, 1 on any connection or I/O failure).
pub async fn run(args: AttachArgs) -> i32 {
    match run_inner(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

/// Strip a trailing slash so joined paths never end up with `//`.
fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

async fn run_inner(args: AttachArgs) -> anyhow::Result<()> {
    let base = normalize_base(&args.url);
    let http = reqwest::Client::new();

    print_snapshot(&http, &base).await?;

    let mut events_task = tokio::spawn(stream_events(format!("{base}/events")));
    let mut input_rx = spawn_stdin_reader();

    prompt();
    loop {
        tokio::select! {
            result = &mut events_task => {
                match result {
                    Ok(Err(e)) => warn!(error = %e, "event stream ended with an error"),
                    Err(e) => warn!(error = %e, "event stream task ended unexpectedly"),
                    Ok(Ok(())) => {}
                }
                return Ok(());
            }
            line = input_rx.recv() => {
                let Some(line) = line else { return Ok(()) };
                let content = line.trim();
                if content.is_empty() {
                    prompt();
                    continue;
                }
                if content == "/quit" {
                    return Ok(());
                }
                if let Err(e) = post_message(&http, &base, content).await {
                    eprintln!("send failed: {e:#}");
                }
                prompt();
            }
        }
    }
}

/// Reads stdin line-by-line on a dedicated blocking thread, forwarding
/// each line over a channel so it can be raced against the event stream.
fn spawn_stdin_reader() -> tokio::sync::mpsc::Receiver<String> {
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt() {
    print!("> ");
    std::io::stdout().flush().ok();
}

async fn print_snapshot(http: &reqwest::Client, base: &str) -> anyhow::Result<()> {
    let status: StatusResponse = http.get(format!("{base}/status")).send().await?.json().await?;
    println!("connected: agent_type={} transport={} status={}", status.agent_type, status.transport, status.status);

    let messages: MessagesResponse = http.get(format!("{base}/messages")).send().await?.json().await?;
    for msg in messages.messages {
        println!("[{}] {}: {}", msg.id, msg.role, msg.content);
    }
    Ok(())
}

async fn post_message(http: &reqwest::Client, base: &str, content: &str) -> anyhow::Result<()> {
    let resp = http
        .post(format!("{base}/message"))
        .json(&serde_json::json!({ "type": "user", "content": content }))
        .send()
        .await?;
    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("server rejected message: {body}");
    }
    Ok(())
}

/// Stream `/events`, printing `message_update`/`status_change`/`error`
/// frames to stdout as they arrive. Runs until the connection ends.
async fn stream_events(url: String) -> anyhow::Result<()> {
    let client = eventsource_client::ClientBuilder::for_url(&url)?.build();
    let mut stream = client.stream();

    while let Some(event) = stream.next().await {
        match event {
            Ok(SSE::Event(ev)) => render_event(&ev.event_type, &ev.data),
            Ok(SSE::Comment(_)) => {}
            Err(e) => warn!(error = %e, "event stream error"),
        }
    }
    Ok(())
}

fn render_event(event_type: &str, data: &str) {
    match event_type {
        "message_update" => {
            if let Ok(msg) = serde_json::from_str::<RemoteMessage>(data) {
                println!("\n[{}] {}: {}", msg.id, msg.role, msg.content);
                prompt();
            }
        }
        "status_change" => {
            println!("\n(status: {data})");
            prompt();
        }
        "error" => {
            println!("\n(error: {data})");
            prompt();
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "attach_tests.rs"]
mod tests;
