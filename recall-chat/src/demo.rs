//! Memory-only clients: the `demo` loop and the `check` smoke run

use colored::Colorize;
use recall_memory::{HttpMemoryStore, MemoryFacade};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::Result;

/// Results shown for a recall
const RECALL_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoCommand {
    Empty,
    Quit,
    ShowAll,
    Remember(String),
    Recall(String),
}

impl DemoCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let lower = line.to_lowercase();

        if lower.is_empty() {
            DemoCommand::Empty
        } else if lower == "quit" {
            DemoCommand::Quit
        } else if lower == "show all" {
            DemoCommand::ShowAll
        } else if lower.starts_with("remember ") {
            DemoCommand::Remember(line.get("remember ".len()..).unwrap_or("").trim().to_string())
        } else if lower.starts_with("recall ") {
            DemoCommand::Recall(line.get("recall ".len()..).unwrap_or("").trim().to_string())
        } else {
            DemoCommand::Recall(line.to_string())
        }
    }
}

async fn show_all(memory: &MemoryFacade) -> recall_memory::Result<Vec<String>> {
    let all = memory.get_all().await?;
    println!("Total memories: {}", all.len());
    for (i, text) in all.iter().enumerate() {
        println!("   {}. {}", i + 1, text);
    }
    Ok(all)
}

async fn recall(memory: &MemoryFacade, query: &str) -> recall_memory::Result<Vec<String>> {
    let found = memory.search(query, RECALL_LIMIT).await?;
    if found.is_empty() {
        println!("{}", "I don't have any memories about that.".yellow());
    } else {
        println!("{}", "I remember:".green());
        for text in &found {
            println!("   - {text}");
        }
    }
    Ok(found)
}

/// Interactive save/search loop without an LLM
pub async fn run_demo(memory: MemoryFacade) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("{}", "recall memory demo".bold().green());
    println!("{}", "=".repeat(50));
    println!("Commands:");
    println!("  {:<18} Save a memory", "remember <text>".cyan());
    println!("  {:<18} Search memories", "recall <query>".cyan());
    println!("  {:<18} Show all memories", "show all".cyan());
    println!("  {:<18} Exit", "quit".cyan());
    println!("{}", "=".repeat(50));

    let prompt = format!("{}> ", "you".blue().bold());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let _ = rl.add_history_entry(line.as_str());

        let outcome = match DemoCommand::parse(&line) {
            DemoCommand::Empty => continue,
            DemoCommand::Quit => break,
            DemoCommand::ShowAll => show_all(&memory).await.map(|_| ()),
            DemoCommand::Remember(text) => memory
                .save(&text)
                .await
                .map(|ack| println!("{} {}", "Memory saved:".green(), ack.message)),
            DemoCommand::Recall(query) => recall(&memory, &query).await.map(|_| ()),
        };

        if let Err(e) = outcome {
            println!("{}: {e}", "error".red());
        }
    }

    println!("{}", "Goodbye!".yellow());
    Ok(())
}

/// One pass over every memory operation; stops at the first failure
pub async fn run_check(memory: MemoryFacade, remote: Option<&HttpMemoryStore>) -> Result<()> {
    if let Some(store) = remote {
        println!("{}", format!("[health] {}", store.base_url()).bold());
        let health = store.health().await?;
        println!("  {} {}", "ok:".green(), health.message);
    }

    println!("{}", "[save] I like pasta".bold());
    let ack = memory.save("I like pasta").await?;
    println!("  {} {}", "ok:".green(), ack.message);

    println!("{}", "[search] What food does the user like?".bold());
    recall(&memory, "What food does the user like?").await?;

    println!("{}", "[list]".bold());
    show_all(&memory).await?;

    println!("\n{}", "All memory operations succeeded".green());
    Ok(())
}
