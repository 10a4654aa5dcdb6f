//! TabDB interactive client
//!
//! An in-process REPL over the same catalog and executor the server uses,
//! for working with a database directory without starting a server.

use std::env;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use tabdb::catalog::{Catalog, DEFAULT_STORAGE_ROOT};
use tabdb::executor::Executor;

/// Print welcome banner
fn print_banner() {
    println!(
        r#"
TabDB - a minimal relational command engine
Type '.help' for help, '.quit' to exit
"#
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit TabDB
  .tables            List tables of the current database
  .clear             Clear screen

Query language:
  USE markbook;
  CREATE DATABASE markbook;
  CREATE TABLE marks (name, mark);
  INSERT INTO marks VALUES ('Sam', 70);
  SELECT * FROM marks WHERE mark >= 40;
  UPDATE marks SET mark = 38 WHERE name == 'Clive';
  DELETE FROM marks WHERE name == 'Clive';
  JOIN coursework AND marks ON submission AND id;
  ALTER TABLE marks ADD age;
  DROP TABLE marks;
"#
    );
}

/// Handle special dot commands; returns false when the REPL should exit
fn handle_special_command(command: &str, catalog: &Catalog) -> bool {
    match command {
        ".help" => print_help(),
        ".quit" | ".exit" => return false,
        ".tables" => match catalog.current_database() {
            Ok(database) => {
                let tables = database.table_names();
                if tables.is_empty() {
                    println!("No tables found.");
                } else {
                    println!("Tables:");
                    for table in tables {
                        println!("  {}", table);
                    }
                }
            }
            Err(error) => eprintln!("Error: {}", error),
        },
        ".clear" => print!("\x1B[2J\x1B[1;1H"),
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Type '.help' for available commands.");
        }
    }
    true
}

/// Main REPL loop
fn run_repl(storage_root: String) -> Result<()> {
    let mut catalog = Catalog::new(storage_root);
    let mut editor = DefaultEditor::new()?;

    print_banner();

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "tabdb> " } else { "...> " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        };

        let trimmed = line.trim();
        if buffer.is_empty() && trimmed.starts_with('.') {
            editor.add_history_entry(trimmed)?;
            if !handle_special_command(trimmed, &catalog) {
                break;
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        // Commands may span lines; execute once the terminator arrives.
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(trimmed);
        if !trimmed.ends_with(';') {
            continue;
        }

        let command = std::mem::take(&mut buffer);
        editor.add_history_entry(&command)?;
        let response = Executor::new(&mut catalog).handle_command(&command);
        println!("{}", response);
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut storage_root = DEFAULT_STORAGE_ROOT.to_string();
    for i in 1..args.len() {
        if args[i] == "--data-dir" {
            if let Some(dir) = args.get(i + 1) {
                storage_root = dir.clone();
            }
        }
    }

    run_repl(storage_root)
}
