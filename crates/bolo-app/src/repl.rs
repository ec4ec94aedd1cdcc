//! Interactive terminal conversation.
//!
//! Lines are read from stdin. Each message is sent on its own task so a slow
//! answer never blocks further input; the answer is printed when it lands.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use bolo_chat::{ConversationOrchestrator, TurnOutcome};
use bolo_core::error::Result;
use bolo_session::FileKeyValueStore;
use bolo_speech::CaptureState;

use crate::commands::{parse_line, Input, HELP};

pub type Orchestrator = ConversationOrchestrator<FileKeyValueStore>;

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

pub fn print_outcome(outcome: &TurnOutcome) {
    if let Some(bot) = &outcome.bot_turn {
        println!("bolo> {}", bot.text);
    }
}

fn spawn_send(orchestrator: &Arc<Orchestrator>, text: Option<String>) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        let outcome = match text {
            Some(text) => orchestrator.send_message(&text).await,
            None => orchestrator.send_pending().await,
        };
        if outcome.is_skipped() {
            println!("(nothing to send)");
        } else {
            print_outcome(&outcome);
        }
        prompt();
    });
}

fn print_languages(orchestrator: &Orchestrator) {
    let active = orchestrator.languages().active();
    for option in orchestrator.languages().options() {
        let marker = if option.code == active { "*" } else { " " };
        println!("{} {:<4} {}", marker, option.code, option.name);
    }
}

fn print_history(orchestrator: &Orchestrator) {
    let records = orchestrator.history().records();
    if records.is_empty() {
        println!("No past sessions.");
        return;
    }
    for record in records {
        println!("session {}", record.session_id);
        for turn in record.turns() {
            let who = if turn.is_user { "you" } else { "bolo" };
            println!("  {}> {}", who, turn.text);
        }
    }
}

async fn handle(orchestrator: &Arc<Orchestrator>, input: Input) -> bool {
    match input {
        Input::Empty => {}
        Input::Message(text) => spawn_send(orchestrator, Some(text)),
        Input::Send => spawn_send(orchestrator, None),
        Input::Login(user) => match orchestrator.login(&user).await {
            Ok(identity) => println!(
                "Logged in as {} (session {}), {} past session(s).",
                identity.user_id,
                identity.session_id,
                orchestrator.history().len()
            ),
            Err(e) => println!("Login failed: {}", e),
        },
        Input::Logout => match orchestrator.logout().await {
            Ok(()) => println!("Logged out."),
            Err(e) => println!("Logout failed: {}", e),
        },
        Input::Lang(arg) if arg.is_empty() => println!(
            "Language: {} ({})",
            orchestrator.languages().active_name(),
            orchestrator.languages().active()
        ),
        Input::Lang(arg) => match orchestrator.languages().select_fuzzy(&arg) {
            Ok(code) => println!(
                "Language set to {} ({}).",
                orchestrator.languages().active_name(),
                code
            ),
            Err(e) => println!("{}", e),
        },
        Input::Languages => print_languages(orchestrator),
        Input::Listen => match orchestrator.toggle_listening().await {
            Ok(CaptureState::Listening) => println!(
                "Listening in {}. /listen to stop, /send to send.",
                orchestrator.languages().active_name()
            ),
            Ok(CaptureState::Idle) => println!("Stopped listening. Heard: {}", orchestrator.pending()),
            Err(e) => println!("Capture failed: {}", e),
        },
        Input::History => print_history(orchestrator),
        Input::WhoAmI => match orchestrator.identity() {
            Some(identity) => println!("{} (session {})", identity.user_id, identity.session_id),
            None => println!("Not logged in."),
        },
        Input::Help => println!("{}", HELP),
        Input::Unknown(name) => println!("Unknown command /{}. Try /help.", name),
        Input::Quit => return false,
    }
    true
}

/// Run the conversation until `/quit` or end of input.
pub async fn run(orchestrator: Arc<Orchestrator>) -> Result<()> {
    let sync = orchestrator.spawn_transcript_sync();

    let mut heard = orchestrator.subscribe_pending();
    let echo = tokio::spawn(async move {
        while heard.changed().await.is_ok() {
            let text = heard.borrow_and_update().clone();
            if !text.is_empty() {
                println!("  (heard) {}", text);
            }
        }
    });

    match orchestrator.identity() {
        Some(identity) => println!("Welcome back, {}.", identity.user_id),
        None => println!("Not logged in. Use /login <user> to keep your history."),
    }
    println!(
        "Language: {}. Type /help for commands.",
        orchestrator.languages().active_name()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if !handle(&orchestrator, parse_line(&line)).await {
            break;
        }
    }

    if orchestrator.capture().is_listening() {
        if let Err(e) = orchestrator.capture().stop() {
            tracing::debug!(error = %e, "Capture stop on exit failed");
        }
    }
    orchestrator.playback().stop().await;
    echo.abort();
    sync.abort();
    tracing::info!("Conversation ended");
    Ok(())
}
