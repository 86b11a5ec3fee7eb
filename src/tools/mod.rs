// src/tools/mod.rs
// Tool dispatch: decode a model's tool call into a typed operation and run it
// against the goal store
//
// Decoding is the only place a tool name is matched as a string. Anything
// that decodes is one of the five operations, so the store never sees an
// unknown name.

mod definitions;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info};

pub use definitions::goal_tools;

use crate::goals::GoalName;
use crate::store::{GoalOutcome, GoalStore};

/// Why a tool call could not be turned into an operation
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("Error: Unknown operation '{0}'.")]
    UnknownOperation(String),

    #[error("Error: Invalid arguments for {operation}: {reason}")]
    InvalidArguments {
        operation: &'static str,
        reason: String,
    },
}

/// One of the five goal operations with its typed arguments
#[derive(Debug, Clone, PartialEq)]
pub enum GoalTool {
    LogGoal { goal: String },
    ViewGoals,
    MarkGoalComplete { goal: String },
    DeleteGoal { goal: String },
    UpdateGoalFields {
        goal: String,
        updates: Vec<(String, String)>,
    },
}

#[derive(Deserialize)]
struct GoalArgs {
    goal: String,
}

#[derive(Deserialize)]
struct UpdateArgs {
    goal: String,
    updates: Map<String, Value>,
}

impl GoalTool {
    /// Decode a tool call. `arguments` is the raw JSON text from the model.
    pub fn decode(name: &str, arguments: &str) -> Result<Self, DispatchError> {
        let arguments = match arguments.trim() {
            "" => "{}",
            trimmed => trimmed,
        };

        match name {
            "log_goal" => parse::<GoalArgs>("log_goal", arguments)
                .map(|a| GoalTool::LogGoal { goal: a.goal }),
            "view_goals" => Ok(GoalTool::ViewGoals),
            "mark_goal_complete" => parse::<GoalArgs>("mark_goal_complete", arguments)
                .map(|a| GoalTool::MarkGoalComplete { goal: a.goal }),
            "delete_goal" => parse::<GoalArgs>("delete_goal", arguments)
                .map(|a| GoalTool::DeleteGoal { goal: a.goal }),
            "update_goal_fields" => parse::<UpdateArgs>("update_goal_fields", arguments).map(|a| {
                GoalTool::UpdateGoalFields {
                    goal: a.goal,
                    updates: a
                        .updates
                        .into_iter()
                        .map(|(field, value)| (field, value_text(value)))
                        .collect(),
                }
            }),
            other => Err(DispatchError::UnknownOperation(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GoalTool::LogGoal { .. } => "log_goal",
            GoalTool::ViewGoals => "view_goals",
            GoalTool::MarkGoalComplete { .. } => "mark_goal_complete",
            GoalTool::DeleteGoal { .. } => "delete_goal",
            GoalTool::UpdateGoalFields { .. } => "update_goal_fields",
        }
    }

    /// True for every operation except view_goals
    pub fn is_mutating(&self) -> bool {
        !matches!(self, GoalTool::ViewGoals)
    }
}

fn parse<'de, T: Deserialize<'de>>(
    operation: &'static str,
    arguments: &'de str,
) -> Result<T, DispatchError> {
    serde_json::from_str(arguments).map_err(|e| DispatchError::InvalidArguments {
        operation,
        reason: e.to_string(),
    })
}

/// Strings are stored as-is, anything else as its JSON text.
fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Run a decoded operation. Never fails: every outcome is text for the model.
/// `view_goals` yields only the delimited rendering.
pub async fn dispatch(store: &GoalStore, tool: GoalTool) -> String {
    info!(tool = tool.name(), backend = store.backend_name(), "Dispatching goal tool");

    let with_name = |raw: &str| GoalName::parse(raw).map_err(GoalOutcome::from);

    let outcome = match tool {
        GoalTool::ViewGoals => return store.view_goals_formatted().await.text(),
        GoalTool::LogGoal { goal } => match with_name(&goal) {
            Ok(name) => store.log_goal(&name).await,
            Err(rejected) => rejected,
        },
        GoalTool::MarkGoalComplete { goal } => match with_name(&goal) {
            Ok(name) => store.mark_goal_complete(&name).await,
            Err(rejected) => rejected,
        },
        GoalTool::DeleteGoal { goal } => match with_name(&goal) {
            Ok(name) => store.delete_goal(&name).await,
            Err(rejected) => rejected,
        },
        GoalTool::UpdateGoalFields { goal, updates } => match with_name(&goal) {
            Ok(name) => store.update_goal_fields(&name, &updates).await,
            Err(rejected) => rejected,
        },
    };

    outcome.to_string()
}

/// Result of executing one requested tool call
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub text: String,
    /// The call named a mutating operation (whether or not it succeeded)
    pub mutating: bool,
}

/// Decode and run a tool call by name. Undecodable calls are logged loudly and
/// reported back as text; they never reach the store.
pub async fn execute(store: &GoalStore, name: &str, arguments: &str) -> Executed {
    match GoalTool::decode(name, arguments) {
        Ok(tool) => {
            let mutating = tool.is_mutating();
            Executed {
                text: dispatch(store, tool).await,
                mutating,
            }
        }
        Err(e) => {
            error!(tool = %name, arguments = %arguments, error = %e, "Rejected tool call");
            Executed {
                text: e.to_string(),
                mutating: false,
            }
        }
    }
}
