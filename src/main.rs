//! Terminal client for the support chat
//!
//! `chat-session [SESSION_ID]` resumes a session, or starts a new one when no
//! id is given. Lines read from stdin are sent as user messages.

use chat_session::input_gate::PLACEHOLDER_HANDED_OFF;
use chat_session::render::Row;
use chat_session::{
    mount, ChatBackend, ClientConfig, HttpChatBackend, LoggingBackend, SessionId, SessionView,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, "Starting chat session client");

    let backend = Arc::new(LoggingBackend::new(Arc::new(HttpChatBackend::new(&config)?)));

    let session_id = match std::env::args().nth(1) {
        Some(id) => SessionId::new(id),
        None => {
            let id = backend.create_session().await?;
            tracing::info!(session_id = %id, "Created new session");
            id
        }
    };
    println!("Session {session_id}");

    let mut handle = mount(session_id, Arc::clone(&backend));
    let mut views = handle.subscribe_view();
    let printer = tokio::spawn(print_transcript(handle.subscribe_view()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = views.wait_for(|v| v.complete) => {
                println!("{PLACEHOLDER_HANDED_OFF}");
                break;
            }

            notice = handle.notices().recv() => match notice {
                Ok(notice) => eprintln!("! {}", notice.message()),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },

            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let view = handle.view();
                if view.locked {
                    eprintln!("{}", view.placeholder);
                    continue;
                }
                match classify_line(line) {
                    LineInput::SubmitDraft => handle.submit().await?,
                    LineInput::Replace(text) => {
                        handle.edit_draft(text).await?;
                        handle.submit().await?;
                    }
                }
            }
        }
    }

    tracing::info!(session_id = %handle.session_id(), "Closing session");
    handle.unmount().await;
    printer.await?;
    Ok(())
}

/// What a line typed at the prompt does
#[derive(Debug, PartialEq, Eq)]
enum LineInput {
    /// Send whatever the draft holds, e.g. text restored after a failed send
    SubmitDraft,
    Replace(String),
}

fn classify_line(line: String) -> LineInput {
    if line.trim().is_empty() {
        LineInput::SubmitDraft
    } else {
        LineInput::Replace(line)
    }
}

/// Prompt shown whenever input unlocks. A restored draft is echoed so the
/// user can resend it with Enter.
fn prompt(view: &SessionView) -> String {
    if view.input_value.is_empty() {
        format!("{}\n> ", view.placeholder)
    } else {
        format!(
            "{}\n[draft] {} (Enter to send, or type a replacement)\n> ",
            view.placeholder, view.input_value
        )
    }
}

fn init_tracing() {
    let json = std::env::var("CHAT_LOG_FORMAT").is_ok_and(|format| format == "json");

    // Logs go to stderr; stdout carries the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_session=info".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Print rows as they arrive, plus a typing indicator and a prompt whenever
/// input unlocks.
async fn print_transcript(mut views: watch::Receiver<SessionView>) {
    let mut printed = 0;
    let mut typing = false;
    let mut focus_requests = 0;

    loop {
        {
            let view = views.borrow_and_update();
            let lines: Vec<_> = view
                .rows
                .iter()
                .filter_map(|row| match row {
                    Row::Line(line) => Some(line),
                    Row::Typing => None,
                })
                .collect();

            for line in lines.iter().skip(printed) {
                println!("[{}] {}", line.sender, line.text);
            }
            printed = lines.len();

            if view.bot_typing && !typing {
                println!("[bot] ...");
            }
            typing = view.bot_typing;

            if view.focus_requests > focus_requests && !view.locked {
                print!("{}", prompt(&view));
                if let Err(e) = std::io::stdout().flush() {
                    tracing::debug!(error = %e, "Failed to flush prompt");
                }
            }
            focus_requests = view.focus_requests;
        }

        if views.changed().await.is_err() {
            break;
        }
    }
}
