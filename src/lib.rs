// src/lib.rs
// Squad Goals: a conversational goal tracker

pub mod config;
pub mod error;
pub mod goals;
pub mod llm;
pub mod orchestrator;
pub mod repl;
pub mod session;
pub mod store;
pub mod testing;
pub mod tools;

pub use error::{GoalError, Result};
pub use session::GoalSession;
pub use store::{CsvTable, GoalOutcome, GoalStore, GoalView, SheetsTable};
