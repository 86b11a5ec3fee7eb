// src/repl/mod.rs
// Interactive terminal chat: readline input, replies, and the goal table

mod colors;
mod helper;
mod table;

use anyhow::Result;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::path::PathBuf;

use crate::goals::GoalName;
use crate::session::{GoalSession, WELCOME_MESSAGE};
use crate::store::GoalOutcome;

use helper::{GoalHelper, SLASH_COMMANDS};

/// A slash command typed at the prompt
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Goals,
    Reopen(String),
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let (word, arg) = match line.split_once(' ') {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };
        match word {
            "/goals" => Command::Goals,
            "/reopen" => Command::Reopen(arg.to_string()),
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

pub struct Repl {
    editor: Editor<GoalHelper, DefaultHistory>,
    session: GoalSession,
    history_path: PathBuf,
}

impl Repl {
    pub fn new(session: GoalSession, history_path: PathBuf) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(GoalHelper::new()));

        Ok(Self {
            editor,
            session,
            history_path,
        })
    }

    fn load_history(&mut self) {
        if self.history_path.exists() {
            let _ = self.editor.load_history(&self.history_path);
        }
    }

    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = self.editor.save_history(&self.history_path);
    }

    pub async fn run(&mut self) -> Result<()> {
        self.load_history();

        println!("{}", colors::reply(WELCOME_MESSAGE));
        println!();
        self.print_goals().await;
        println!();
        println!("{}", colors::status("Type a message (Ctrl+D to exit, /help for commands)"));

        loop {
            let line = match self.editor.readline(&colors::prompt()) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("{}", colors::error(&format!("Error: {err}")));
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.editor.add_history_entry(trimmed)?;

            if trimmed.starts_with('/') {
                if !self.handle_command(Command::parse(trimmed)).await {
                    break;
                }
                continue;
            }

            println!("{}", colors::status("thinking..."));
            let (reply, table) = self.session.submit(trimmed).await;
            println!("{}", colors::reply(&reply));
            if let Some((rows, headers)) = table {
                println!();
                self.show_table(&rows, &headers);
            }
            println!();
        }

        println!("Goodbye!");
        self.save_history();
        Ok(())
    }

    /// Returns false when the REPL should exit.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Goals => self.print_goals().await,
            Command::Reopen(raw) => match GoalName::parse(&raw) {
                Ok(name) => {
                    let outcome = self.session.store().reopen_goal(&name).await;
                    let text = outcome.to_string();
                    match outcome {
                        GoalOutcome::Reopened { .. } => {
                            println!("{}", colors::success(&text));
                            self.print_goals().await;
                        }
                        _ => println!("{}", colors::warning(&text)),
                    }
                }
                Err(_) => println!("{}", colors::warning("Usage: /reopen <goal>")),
            },
            Command::Help => {
                println!("Commands:");
                for (command, description) in SLASH_COMMANDS {
                    let usage = match *command {
                        "/reopen" => "/reopen <goal>",
                        other => other,
                    };
                    println!("  {usage:<18} - {description}");
                }
            }
            Command::Quit => return false,
            Command::Unknown(word) => {
                println!("{}", colors::warning(&format!("Unknown command: {word} (try /help)")));
            }
        }
        true
    }

    async fn print_goals(&mut self) {
        let (rows, headers) = self.session.current_table().await;
        self.show_table(&rows, &headers);
    }

    /// Print a listing and let `/reopen` complete against it.
    fn show_table(&mut self, rows: &[Vec<String>], headers: &[String]) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.remember_completed(rows);
        }
        println!("{}", table::render(rows, headers, true));
    }
}
