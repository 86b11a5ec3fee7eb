// src/store/mod.rs
// Goal storage: one contract, two tables (flat file and Google Sheets)
//
// Backends only know how to read the whole table and apply a single row
// change. Everything a goal operation means (duplicate detection, first-match
// lookup, completion rules, field validation) lives in GoalStore, so both
// backends behave identically.

pub mod csv_table;
mod outcome;
pub mod sheets;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{GoalError, Result};
use crate::goals::{CanonicalKey, GoalField, GoalName, GoalRecord, record};

pub use csv_table::CsvTable;
pub use outcome::{GoalOutcome, GoalView};
pub use sheets::{SheetsEndpoints, SheetsTable};

/// A stored row and its zero-based position among the data rows of the medium.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub position: usize,
    pub record: GoalRecord,
}

/// The single mutation a goal operation performs.
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    Append(GoalRecord),
    Replace { position: usize, record: GoalRecord },
    Remove { position: usize },
}

/// Persistence capability behind a GoalStore.
#[async_trait]
pub trait GoalTable: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Read every live row, in stored order.
    async fn load(&self) -> Result<Vec<Row>>;

    /// Persist one change. `rows` is the snapshot the change was computed from.
    async fn apply(&self, rows: Vec<Row>, change: RowChange) -> Result<()>;
}

/// The goal store every caller talks to. Cheap to clone.
#[derive(Clone)]
pub struct GoalStore {
    table: Arc<dyn GoalTable>,
}

impl GoalStore {
    pub fn new(table: impl GoalTable + 'static) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.table.name()
    }

    /// Create a Pending goal unless one with the same key already exists.
    pub async fn log_goal(&self, name: &GoalName) -> GoalOutcome {
        self.guard("log", name, self.try_log_goal(name)).await
    }

    /// All goals as (rows, headers, delimited text), or the "no goals" sentinel.
    pub async fn view_goals_formatted(&self) -> GoalView {
        match self.table.load().await {
            Ok(rows) if rows.is_empty() => GoalView::Empty,
            Ok(rows) => {
                let records: Vec<GoalRecord> = rows.into_iter().map(|r| r.record).collect();
                let view = GoalView::from_records(&records);
                debug!(backend = self.backend_name(), goals = records.len(), "Fetched goals");
                view
            }
            Err(e) => {
                error!(backend = self.backend_name(), error = %e, "Error fetching formatted goals");
                GoalView::Failed
            }
        }
    }

    /// Complete the first Pending goal with this key.
    pub async fn mark_goal_complete(&self, name: &GoalName) -> GoalOutcome {
        self.guard("complete", name, self.try_mark_goal_complete(name))
            .await
    }

    /// Remove the first goal with this key.
    pub async fn delete_goal(&self, name: &GoalName) -> GoalOutcome {
        self.guard("delete", name, self.try_delete_goal(name)).await
    }

    /// Apply every `(field, value)` pair to the first goal with this key, or
    /// nothing at all if any field name is rejected.
    pub async fn update_goal_fields(
        &self,
        name: &GoalName,
        updates: &[(String, String)],
    ) -> GoalOutcome {
        let fields = match validate_updates(name, updates) {
            Ok(fields) => fields,
            Err(outcome) => return outcome,
        };
        self.guard("update", name, self.try_update_goal_fields(name, fields))
            .await
    }

    /// Move the first Completed goal with this key back to Pending.
    pub async fn reopen_goal(&self, name: &GoalName) -> GoalOutcome {
        self.guard("reopen", name, self.try_reopen_goal(name)).await
    }

    /// Rows and headers for the UI listing. Empty on failure or empty store.
    pub async fn current_table(&self) -> (Vec<Vec<String>>, Vec<String>) {
        let (rows, headers, _) = self.view_goals_formatted().await.into_parts();
        (rows, headers)
    }

    // ========================================================================
    // Operations proper
    // ========================================================================

    async fn try_log_goal(&self, name: &GoalName) -> Result<GoalOutcome> {
        let rows = self.table.load().await?;

        if find_first(&rows, name.key(), |_| true).is_some() {
            return Ok(GoalOutcome::AlreadyExists {
                goal: name.display_name().to_string(),
            });
        }

        let record = GoalRecord::new_pending(name);
        self.table.apply(rows, RowChange::Append(record)).await?;

        info!(backend = self.backend_name(), goal = %name.key(), "Goal logged");
        Ok(GoalOutcome::Logged {
            goal: name.display_name().to_string(),
        })
    }

    async fn try_mark_goal_complete(&self, name: &GoalName) -> Result<GoalOutcome> {
        let rows = self.table.load().await?;

        let Some(row) = find_first(&rows, name.key(), GoalRecord::is_pending) else {
            return Ok(GoalOutcome::NotFoundOrCompleted {
                goal: name.display_name().to_string(),
            });
        };

        let mut updated = row.record.clone();
        updated.complete_at(record::now());
        let duration = updated.duration.clone();
        let change = RowChange::Replace {
            position: row.position,
            record: updated,
        };
        self.table.apply(rows, change).await?;

        info!(backend = self.backend_name(), goal = %name.key(), duration = %duration, "Goal completed");
        Ok(GoalOutcome::Completed {
            goal: name.display_name().to_string(),
            duration,
        })
    }

    async fn try_delete_goal(&self, name: &GoalName) -> Result<GoalOutcome> {
        let rows = self.table.load().await?;

        let Some(position) = find_first(&rows, name.key(), |_| true).map(|r| r.position) else {
            return Ok(GoalOutcome::NotFound {
                goal: name.display_name().to_string(),
            });
        };

        self.table.apply(rows, RowChange::Remove { position }).await?;

        info!(backend = self.backend_name(), goal = %name.key(), "Goal deleted");
        Ok(GoalOutcome::Deleted {
            goal: name.display_name().to_string(),
        })
    }

    async fn try_update_goal_fields(
        &self,
        name: &GoalName,
        fields: Vec<(GoalField, String)>,
    ) -> Result<GoalOutcome> {
        let rows = self.table.load().await?;

        let Some(row) = find_first(&rows, name.key(), |_| true) else {
            return Ok(GoalOutcome::NotFound {
                goal: name.display_name().to_string(),
            });
        };

        let mut updated = row.record.clone();
        for (field, value) in &fields {
            updated.set(*field, value.clone());
        }
        let change = RowChange::Replace {
            position: row.position,
            record: updated,
        };
        self.table.apply(rows, change).await?;

        info!(
            backend = self.backend_name(),
            goal = %name.key(),
            fields = ?fields.iter().map(|(f, _)| f.as_ref()).collect::<Vec<_>>(),
            "Goal fields updated"
        );
        Ok(GoalOutcome::Updated {
            goal: name.display_name().to_string(),
            changes: fields,
        })
    }

    async fn try_reopen_goal(&self, name: &GoalName) -> Result<GoalOutcome> {
        let rows = self.table.load().await?;

        let Some(row) = find_first(&rows, name.key(), |r| !r.is_pending()) else {
            return Ok(GoalOutcome::NotFoundOrPending {
                goal: name.display_name().to_string(),
            });
        };

        let mut updated = row.record.clone();
        updated.reopen();
        let change = RowChange::Replace {
            position: row.position,
            record: updated,
        };
        self.table.apply(rows, change).await?;

        info!(backend = self.backend_name(), goal = %name.key(), "Goal reopened");
        Ok(GoalOutcome::Reopened {
            goal: name.display_name().to_string(),
        })
    }

    /// Turn backend failures into an outcome the model can relay, distinct
    /// from "not found".
    async fn guard(
        &self,
        action: &'static str,
        name: &GoalName,
        op: impl std::future::Future<Output = Result<GoalOutcome>>,
    ) -> GoalOutcome {
        match op.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    backend = self.backend_name(),
                    action,
                    goal = %name.key(),
                    error = %e,
                    unavailable = e.is_unavailable(),
                    "Goal store operation failed"
                );
                GoalOutcome::Unavailable {
                    action,
                    goal: name.display_name().to_string(),
                }
            }
        }
    }
}

/// First row in stored order whose key matches and which satisfies `pred`.
fn find_first<'a>(
    rows: &'a [Row],
    key: &CanonicalKey,
    pred: impl Fn(&GoalRecord) -> bool,
) -> Option<&'a Row> {
    rows.iter()
        .find(|row| key.matches(&row.record.goal) && pred(&row.record))
}

/// Resolve field names, rejecting the whole payload on any unknown or
/// read-only name.
fn validate_updates(
    name: &GoalName,
    updates: &[(String, String)],
) -> std::result::Result<Vec<(GoalField, String)>, GoalOutcome> {
    if updates.is_empty() {
        return Err(GoalOutcome::EmptyUpdate {
            goal: name.display_name().to_string(),
        });
    }

    let invalid: Vec<String> = updates
        .iter()
        .filter(|(field, _)| field.parse::<GoalField>().is_err())
        .map(|(field, _)| field.clone())
        .collect();
    if !invalid.is_empty() {
        return Err(GoalOutcome::InvalidFields { invalid });
    }

    let fields: Vec<(GoalField, String)> = updates
        .iter()
        .filter_map(|(field, value)| Some((field.parse::<GoalField>().ok()?, value.clone())))
        .collect();

    let read_only: Vec<GoalField> = fields
        .iter()
        .map(|(f, _)| *f)
        .filter(|f| !f.is_editable())
        .collect();
    if !read_only.is_empty() {
        return Err(GoalOutcome::ReadOnlyFields { fields: read_only });
    }

    Ok(fields)
}

impl From<GoalError> for GoalOutcome {
    fn from(err: GoalError) -> Self {
        GoalOutcome::Rejected {
            reason: match err {
                GoalError::InvalidInput(msg) => msg,
                other => other.to_string(),
            },
        }
    }
}
