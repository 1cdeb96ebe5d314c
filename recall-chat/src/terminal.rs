//! `recall-chat chat` REPL
//!
//! Line editing and history come from rustyline; plain lines go to the
//! orchestrator and `!` commands inspect memory and the session.

use colored::Colorize;
use recall_memory::facade::preview;
use recall_memory::HttpMemoryStore;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::Result;
use crate::orchestrator::{ChatOrchestrator, ChatReply, PersistOutcome};
use crate::session::SessionStats;

/// Results listed by `!memory`
const MEMORY_COMMAND_LIMIT: usize = 5;
/// Turns listed by `!history`
const HISTORY_LEN: usize = 5;
const HISTORY_ANSWER_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    Clear,
    Help,
    Stats,
    History,
    Memories,
    /// `!memory <query>`; the query may be empty
    Memory(String),
    Chat(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let lower = line.to_lowercase();

        match lower.as_str() {
            "" => Command::Empty,
            "exit" | "quit" => Command::Exit,
            "clear" | "!clear" => Command::Clear,
            "!help" => Command::Help,
            "!stats" => Command::Stats,
            "!history" => Command::History,
            "!memories" => Command::Memories,
            "!memory" => Command::Memory(String::new()),
            _ if lower.starts_with("!memory ") => {
                Command::Memory(line.get("!memory ".len()..).unwrap_or("").trim().to_string())
            }
            _ => Command::Chat(line.to_string()),
        }
    }
}

/// Health-check a memory service, printing the outcome. Failure is only a warning.
pub async fn check_memory_service(store: &HttpMemoryStore) -> bool {
    println!("{}", format!("Checking memory service at {}...", store.base_url()).yellow());

    match store.health().await {
        Ok(health) => {
            println!("{} {}", "Memory service is up:".green(), health.message);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, url = %store.base_url(), "Memory service health check failed");
            println!(
                "{} {e}\n{}",
                "Memory service not reachable:".yellow(),
                "Continuing; answers will not use stored memories.".dimmed()
            );
            false
        }
    }
}

pub fn print_welcome(model: &str, backend: &str) {
    println!("{}", "recall chat".bold().green());
    println!("{}", "AI assistant with long-term memory".blue());
    println!("{}", format!("model: {model}  memory: {backend}").dimmed());
}

pub fn print_help() {
    println!("\n{}", "Available commands".bold().cyan());
    let rows = [
        ("!memory <query>", "Search memory directly"),
        ("!memories", "List every stored memory"),
        ("!history", "Show recent conversation history"),
        ("!stats", "Session statistics"),
        ("clear", "Clear the screen"),
        ("!help", "Show this help"),
        ("exit / quit", "Exit the program"),
    ];
    for (command, description) in rows {
        println!("  {:<20} {}", command.cyan(), description);
    }
}

pub fn print_stats(stats: &SessionStats) {
    println!("\n{}", "Session statistics".bold().blue());
    for (label, value) in stats.rows() {
        println!("  {:<24} {}", label.cyan(), value);
    }
}

fn print_summary(stats: &SessionStats) {
    println!("\n{}", "Session summary:".green());
    println!("   Questions asked: {}", stats.total_questions);
    println!("   Duration: {}", stats.session_duration);
    println!("   Context usage: {}", stats.context_usage_rate);
    println!("\n{}", "Goodbye!".yellow());
}

fn print_reply(model: &str, reply: &ChatReply) {
    println!("\n{}", format!("{model}:").bold().green());
    println!("{}", reply.answer);

    let memories = match reply.context.len() {
        0 => "no memories used".to_string(),
        1 => "1 memory used".to_string(),
        n => format!("{n} memories used"),
    };
    let persisted = match &reply.persisted {
        PersistOutcome::Saved => "saved to memory".to_string(),
        PersistOutcome::Skipped => "not saved".to_string(),
        PersistOutcome::Failed(e) => format!("save failed: {e}"),
    };
    println!("{}", format!("[{memories}, {persisted}]").dimmed());

    for warning in &reply.warnings {
        println!("{} {warning}", "warning:".yellow());
    }
}

fn print_memories(heading: &str, memories: &[String]) {
    println!("\n{}", heading.green());
    for (i, memory) in memories.iter().enumerate() {
        println!("{}. {}", i + 1, memory.dimmed());
    }
}

async fn handle(orchestrator: &mut ChatOrchestrator, command: Command) {
    match command {
        Command::Empty | Command::Exit | Command::Clear => {}
        Command::Help => print_help(),
        Command::Stats => print_stats(&orchestrator.stats()),
        Command::Memory(query) if query.is_empty() => {
            println!("{}", "Please provide a search query".red());
        }
        Command::Memory(query) => {
            match orchestrator.search_memories(&query, MEMORY_COMMAND_LIMIT).await {
                Ok(found) if found.is_empty() => {
                    println!("\n{}", "No relevant memories found".yellow());
                }
                Ok(found) => {
                    print_memories(&format!("Found {} relevant memories:", found.len()), &found);
                }
                Err(e) => println!("{}: {e}", "error".red()),
            }
        }
        Command::Memories => match orchestrator.all_memories().await {
            Ok(all) if all.is_empty() => println!("\n{}", "No memories stored yet".yellow()),
            Ok(all) => print_memories(&format!("Total memories: {}", all.len()), &all),
            Err(e) => println!("{}: {e}", "error".red()),
        },
        Command::History => {
            let recent = orchestrator.history(HISTORY_LEN);
            if recent.is_empty() {
                println!("\n{}", "No conversation history yet".yellow());
                return;
            }

            println!(
                "\n{}",
                format!("Recent conversation history ({} entries):", recent.len()).green()
            );
            for (i, turn) in recent.iter().enumerate() {
                let indicator = if turn.used_context { "[memory]" } else { "[fresh]" };
                println!(
                    "\n{}",
                    format!("{}. [{}] {}", i + 1, turn.timestamp.format("%H:%M"), indicator).bold()
                );
                println!("{} {}", "Q:".blue(), turn.user_utterance);
                println!(
                    "{} {}",
                    "A:".green(),
                    preview(&turn.assistant_response, HISTORY_ANSWER_CHARS)
                );
            }
        }
        Command::Chat(utterance) => {
            let reply = orchestrator.chat(&utterance).await;
            print_reply(orchestrator.model_name(), &reply);
        }
    }
}

/// Run the REPL until exit, then print the session summary
pub async fn run_chat(mut orchestrator: ChatOrchestrator, backend: &str) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    print_welcome(orchestrator.model_name(), backend);
    println!(
        "Type {} for commands or just start asking. {} leaves.\n",
        "!help".cyan(),
        "exit".yellow()
    );

    let prompt = format!("{}> ", "you".blue().bold());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let command = Command::parse(&line);
                match command {
                    Command::Empty => continue,
                    Command::Exit => break,
                    Command::Clear => {
                        rl.clear_screen()?;
                        print_welcome(orchestrator.model_name(), backend);
                        continue;
                    }
                    _ => {}
                }

                let _ = rl.add_history_entry(line.as_str());
                handle(&mut orchestrator, command).await;
            }
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    print_summary(&orchestrator.stats());
    Ok(())
}
