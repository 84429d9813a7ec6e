use clap::Parser;
use dotenv::dotenv;
use jarvis::cli::ConsoleArgs;
use jarvis::config::prompt::SUGGESTIONS;
use jarvis::console::transport::HttpRelayTransport;
use jarvis::console::voice::VoiceCapabilities;
use jarvis::console::{ Console, ConsoleEvent, TransmitOutcome };
use jarvis::models::chat::Role;
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "Commands: /abort  /mute  /suggest <1-3>  /quit";

/// Prints streamed replies as they grow.
async fn render_events(mut events: tokio::sync::broadcast::Receiver<ConsoleEvent>) {
    let mut printed: HashMap<String, String> = HashMap::new();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                info!("Console renderer skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let mut out = std::io::stdout();
        match event {
            ConsoleEvent::MessageAppended(msg) if msg.role == Role::Assistant => {
                let _ = write!(out, "jarvis> ");
                printed.insert(msg.id, String::new());
            }
            ConsoleEvent::MessageUpdated { id, content } => {
                let shown = printed.entry(id).or_default();
                if let Some(delta) = content.strip_prefix(shown.as_str()) {
                    let _ = write!(out, "{}", delta);
                    *shown = content;
                }
            }
            ConsoleEvent::MessageFinalized(msg) => {
                let shown = printed.remove(&msg.id).unwrap_or_default();
                match msg.content.strip_prefix(shown.as_str()) {
                    Some(rest) => {
                        let _ = writeln!(out, "{}", rest);
                    }
                    None => {
                        let _ = writeln!(out, "\n{}", msg.content);
                    }
                }
            }
            ConsoleEvent::StatusChanged(status) => info!("{}", status),
            ConsoleEvent::Error(error) => {
                let _ = writeln!(out, "\n[error] {}", error);
            }
            _ => {}
        }
        let _ = out.flush();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = ConsoleArgs::parse();

    let transport = HttpRelayTransport::new(args.relay_url.clone())?;
    info!("Console relay: {}", transport.url());
    let console = Console::new(Arc::new(transport), VoiceCapabilities::disabled());
    if args.muted {
        console.toggle_mute();
    }

    for msg in console.operational_messages() {
        println!("jarvis> {}", msg.content);
    }
    println!("{}", HELP);
    println!(
        "Voice {}",
        if console.voice().output_online() { "online" } else { "offline" }
    );

    let renderer = tokio::spawn(render_events(console.subscribe()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                if console.abort() {
                    continue;
                }
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        let command = line.trim();

        match command {
            "" => continue,
            "/quit" => break,
            "/abort" => {
                if !console.abort() {
                    println!("Nothing to abort.");
                }
            }
            "/mute" => {
                let muted = console.toggle_mute();
                println!("Speech {}", if muted { "muted" } else { "enabled" });
            }
            _ if command.starts_with("/suggest") => {
                let index = command
                    .trim_start_matches("/suggest")
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .filter(|i| *i < SUGGESTIONS.len());
                match index {
                    Some(index) => {
                        if console.is_transmitting() {
                            println!("Jarvis is still transmitting. Use /abort to cancel.");
                            continue;
                        }
                        println!("you> {}", SUGGESTIONS[index].body);
                        let console = console.clone();
                        tokio::spawn(async move { console.submit_suggestion(index).await });
                    }
                    None => {
                        for (i, s) in SUGGESTIONS.iter().enumerate() {
                            println!("  {}. {}: {}", i + 1, s.title, s.body);
                        }
                    }
                }
            }
            _ if command.starts_with('/') => println!("{}", HELP),
            _ => {
                if console.is_transmitting() {
                    println!("Jarvis is still transmitting. Use /abort to cancel.");
                    continue;
                }
                let console = console.clone();
                let prompt = command.to_string();
                tokio::spawn(async move {
                    if let TransmitOutcome::Busy = console.transmit(&prompt).await {
                        println!("Jarvis is still transmitting. Use /abort to cancel.");
                    }
                });
            }
        }
    }

    console.abort();
    renderer.abort();
    Ok(())
}
