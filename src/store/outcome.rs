// src/store/outcome.rs
// Results of goal store operations and their textual form

use std::fmt;

use crate::goals::{GoalField, GoalRecord};

const NO_GOALS: &str = "No goals found.";
const FETCH_FAILED: &str = "An unexpected error occurred while fetching goals.";

/// What a goal operation did. `Display` gives the text relayed to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalOutcome {
    Logged { goal: String },
    AlreadyExists { goal: String },
    Completed { goal: String, duration: String },
    NotFoundOrCompleted { goal: String },
    Reopened { goal: String },
    NotFoundOrPending { goal: String },
    Deleted { goal: String },
    NotFound { goal: String },
    Updated { goal: String, changes: Vec<(GoalField, String)> },
    EmptyUpdate { goal: String },
    InvalidFields { invalid: Vec<String> },
    ReadOnlyFields { fields: Vec<GoalField> },
    /// Input refused before reaching the store (e.g. empty goal name)
    Rejected { reason: String },
    /// The backend could not be reached or read
    Unavailable { action: &'static str, goal: String },
}

impl GoalOutcome {
    /// True when the store changed
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            GoalOutcome::Logged { .. }
                | GoalOutcome::Completed { .. }
                | GoalOutcome::Reopened { .. }
                | GoalOutcome::Deleted { .. }
                | GoalOutcome::Updated { .. }
        )
    }
}

impl fmt::Display for GoalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalOutcome::Logged { goal } => write!(f, "Goal '{goal}' logged successfully!"),
            GoalOutcome::AlreadyExists { goal } => write!(f, "Goal '{goal}' already exists!"),
            GoalOutcome::Completed { goal, duration } if duration.is_empty() => {
                write!(f, "Goal '{goal}' marked as completed!")
            }
            GoalOutcome::Completed { goal, duration } => {
                write!(f, "Goal '{goal}' marked as completed! Duration: {duration}")
            }
            GoalOutcome::NotFoundOrCompleted { goal } => {
                write!(f, "Goal '{goal}' not found or already completed.")
            }
            GoalOutcome::Reopened { goal } => {
                write!(f, "Goal '{goal}' reopened and marked as Pending.")
            }
            GoalOutcome::NotFoundOrPending { goal } => {
                write!(f, "Goal '{goal}' not found or not completed.")
            }
            GoalOutcome::Deleted { goal } => {
                write!(f, "Goal '{goal}' has been deleted successfully.")
            }
            GoalOutcome::NotFound { goal } => write!(f, "Goal '{goal}' not found."),
            GoalOutcome::Updated { goal, changes } => {
                let changes: Vec<String> = changes
                    .iter()
                    .map(|(field, value)| format!("{field} → {value}"))
                    .collect();
                write!(f, "Goal '{goal}' updated: {}", changes.join(", "))
            }
            GoalOutcome::EmptyUpdate { goal } => {
                write!(f, "No fields given to update for goal '{goal}'.")
            }
            GoalOutcome::InvalidFields { invalid } => write!(
                f,
                "Invalid fields: {}. Allowed fields: {}",
                invalid.join(", "),
                GoalField::headers().join(", ")
            ),
            GoalOutcome::ReadOnlyFields { fields } => {
                let names: Vec<&str> = fields.iter().map(|f| f.as_ref()).collect();
                write!(
                    f,
                    "Fields cannot be updated directly: {}. Editable fields: {}, {}",
                    names.join(", "),
                    GoalField::ExpectedDuration,
                    GoalField::Notes
                )
            }
            GoalOutcome::Rejected { reason } => write!(f, "Error: {reason}"),
            GoalOutcome::Unavailable { action, goal } => write!(
                f,
                "Storage backend unavailable while trying to {action} '{goal}'. Please try again later."
            ),
        }
    }
}

/// Listing of all goals.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalView {
    Table {
        rows: Vec<Vec<String>>,
        headers: Vec<String>,
        text: String,
    },
    /// The store holds no goals
    Empty,
    /// The backend could not be read
    Failed,
}

impl GoalView {
    /// Build the listing. Goal cells show the display name, never the stored key.
    pub fn from_records(records: &[GoalRecord]) -> Self {
        let headers = GoalField::headers();
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| {
                let mut cells = record.to_cells();
                cells[GoalField::Goal.column()] = record.display_name().to_string();
                cells
            })
            .collect();
        let text = render_delimited(&headers, &rows);

        GoalView::Table {
            rows,
            headers,
            text,
        }
    }

    /// The delimited rendering, or the sentinel for an empty/failed listing.
    pub fn text(&self) -> String {
        match self {
            GoalView::Table { text, .. } => text.clone(),
            GoalView::Empty => NO_GOALS.to_string(),
            GoalView::Failed => FETCH_FAILED.to_string(),
        }
    }

    /// (rows, headers, text); rows and headers are empty unless there are goals.
    pub fn into_parts(self) -> (Vec<Vec<String>>, Vec<String>, String) {
        match self {
            GoalView::Table {
                rows,
                headers,
                text,
            } => (rows, headers, text),
            other => {
                let text = other.text();
                (Vec::new(), Vec::new(), text)
            }
        }
    }
}

/// CSV text of the listing, quoting cells only where needed.
fn render_delimited(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let written = std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .try_for_each(|line| writer.write_record(line));

    match (written, writer.into_inner()) {
        (Ok(()), Ok(bytes)) => String::from_utf8_lossy(&bytes).trim_end().to_string(),
        _ => std::iter::once(headers.join(","))
            .chain(rows.iter().map(|r| r.join(",")))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
