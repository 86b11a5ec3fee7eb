// src/repl/helper.rs
// Line-editor support: slash commands and goal names for /reopen

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

use crate::goals::{GoalField, GoalStatus};

/// Slash commands with their `/help` descriptions
pub const SLASH_COMMANDS: &[(&str, &str)] = &[
    ("/goals", "Show the goal table"),
    ("/reopen", "Move a completed goal back to Pending"),
    ("/help", "Show this help"),
    ("/quit", "Exit"),
    ("/exit", "Exit"),
];

const REOPEN: &str = "/reopen";

pub struct GoalHelper {
    history: HistoryHinter,
    /// Display names `/reopen` can target, refreshed whenever the table is read
    completed_goals: Vec<String>,
}

impl GoalHelper {
    pub fn new() -> Self {
        Self {
            history: HistoryHinter::new(),
            completed_goals: Vec::new(),
        }
    }

    /// Pick the Completed goals out of a listing.
    pub fn remember_completed(&mut self, rows: &[Vec<String>]) {
        let status = GoalStatus::Completed.to_string();
        self.completed_goals = rows
            .iter()
            .filter(|row| row.get(GoalField::Status.column()) == Some(&status))
            .filter_map(|row| row.get(GoalField::Goal.column()).cloned())
            .collect();
    }

    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let typed = &line[..pos];
        if !typed.starts_with('/') {
            return (pos, Vec::new());
        }

        match typed.split_once(' ') {
            None => (
                0,
                SLASH_COMMANDS
                    .iter()
                    .map(|(cmd, _)| *cmd)
                    .filter(|cmd| cmd.starts_with(typed))
                    .map(str::to_string)
                    .collect(),
            ),
            Some((REOPEN, arg)) => {
                let partial = arg.trim_start();
                let start = pos - partial.len();
                let partial = partial.to_lowercase();
                let names = self
                    .completed_goals
                    .iter()
                    .filter(|name| name.to_lowercase().starts_with(&partial))
                    .cloned()
                    .collect();
                (start, names)
            }
            Some(_) => (pos, Vec::new()),
        }
    }
}

impl Completer for GoalHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, names) = self.candidates(line, pos);
        let pairs = names
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for GoalHelper {
    type Hint = String;

    /// A single matching goal after `/reopen ` is hinted inline; plain chat
    /// falls back to history.
    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        if !line.starts_with('/') {
            return self.history.hint(line, pos, ctx);
        }
        if pos < line.len() || !line.starts_with(&format!("{REOPEN} ")) {
            return None;
        }

        match self.candidates(line, pos) {
            (start, names) if names.len() == 1 => {
                let typed = line.len() - start;
                names[0].get(typed..).map(str::to_string)
            }
            _ => None,
        }
    }
}

impl Highlighter for GoalHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(super::colors::dim(hint))
    }
}

impl Validator for GoalHelper {}

impl Helper for GoalHelper {}
