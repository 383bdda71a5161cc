//! noctiluca — headless driver for watching the avatar engine think.
//!
//! Boots the engine as a tokio task, feeds stdin lines in as queries and
//! voice commands, and logs state changes plus a periodic entity census.
//! No rendering happens here; this is a harness, not a frontend.

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use noctiluca_core::config::EngineConfig;
use noctiluca_core::engine::{Engine, EngineHandle};
use noctiluca_core::events::EngineEvent;

/// Snapshot census every ~5 seconds at the default tick rate.
const CENSUS_EVERY: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = EngineConfig::load_from_dir(&project_root).unwrap_or_default();

    let engine = Engine::new(config);
    let handle = engine.handle();
    let events = engine.subscribe();

    let engine_task = tokio::spawn(async move {
        let mut engine = engine;
        engine.run().await;
    });

    tokio::spawn(watch_events(events));

    eprintln!("\n  noctiluca is glowing. Type to talk to it.");
    eprintln!("  /voice <text>      feed a recognized utterance");
    eprintln!("  /pointer <x> <y>   move the pointer");
    eprintln!("  /chat on|off       open or close the chat panel");
    eprintln!("  /quit              stop\n");

    read_input(handle.clone()).await;

    let _ = handle.stop().await;
    let _ = engine_task.await;
    info!("goodbye");
    Ok(())
}

/// Log interesting events; summarize snapshots at a low cadence.
async fn watch_events(mut rx: tokio::sync::broadcast::Receiver<EngineEvent>) {
    loop {
        match rx.recv().await {
            Ok(EngineEvent::Snapshot(snap)) => {
                if snap.tick % CENSUS_EVERY == 0 {
                    info!(
                        "tick {} [{}] orbs={} thoughts={} dreams={} particles={} connections={}",
                        snap.tick,
                        snap.state,
                        snap.functional_orbs.len() + 1,
                        snap.thought_orbs.len(),
                        snap.dream_orbs.len(),
                        snap.particles.len(),
                        snap.connections.len(),
                    );
                }
            }
            Ok(EngineEvent::State(change)) => {
                info!("state: {} -> {} ({})", change.from, change.to, change.reason);
            }
            Ok(EngineEvent::Conversation(turn)) => {
                let mode = turn.mode.as_deref().unwrap_or("-");
                println!("[{} | {}] {}", turn.sender, mode, turn.text);
            }
            Ok(EngineEvent::Notice(notice)) => {
                info!("notice ({}): {}", notice.level, notice.text);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                info!("event stream lagged {} events", n);
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Drive the engine from stdin until /quit or Ctrl+C.
async fn read_input(handle: EngineHandle) {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if !dispatch(&handle, &line).await {
                    break;
                }
            }
        }
    }
}

/// Returns false when the session should end.
async fn dispatch(handle: &EngineHandle, line: &str) -> bool {
    let result = if line == "/quit" {
        return false;
    } else if let Some(text) = line.strip_prefix("/voice ") {
        handle.recognized_speech(text).await
    } else if let Some(rest) = line.strip_prefix("/pointer ") {
        let coords: Vec<f64> = rest
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        match coords.as_slice() {
            [x, y] => handle.pointer_position(*x, *y).await,
            _ => {
                eprintln!("usage: /pointer <x> <y>");
                Ok(())
            }
        }
    } else if let Some(arg) = line.strip_prefix("/chat ") {
        handle.set_chat_open(arg.trim() == "on").await
    } else {
        handle.submit_query(line).await
    };

    if let Err(e) = result {
        eprintln!("engine unreachable: {}", e);
        return false;
    }
    true
}
