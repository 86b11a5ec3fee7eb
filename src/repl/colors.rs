// src/repl/colors.rs
// ANSI color helpers for terminal output

pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

use ansi::*;

pub fn success(msg: &str) -> String {
    format!("{}{}{}", GREEN, msg, RESET)
}

pub fn error(msg: &str) -> String {
    format!("{}{}{}", RED, msg, RESET)
}

pub fn warning(msg: &str) -> String {
    format!("{}{}{}", YELLOW, msg, RESET)
}

/// Gray status line
pub fn status(msg: &str) -> String {
    format!("{}{}{}", GRAY, msg, RESET)
}

pub fn header(msg: &str) -> String {
    format!("{}{}{}", BOLD, msg, RESET)
}

/// Assistant reply text
pub fn reply(msg: &str) -> String {
    format!("{}{}{}", CYAN, msg, RESET)
}

pub fn dim(msg: &str) -> String {
    format!("{}{}{}", DIM, msg, RESET)
}

pub fn prompt() -> String {
    format!("{}{}>>> {}", BOLD, MAGENTA, RESET)
}

/// Color a Status cell by value
pub fn goal_status(status: &str) -> String {
    match status {
        "Completed" => success(status),
        "Pending" => warning(status),
        other => other.to_string(),
    }
}
