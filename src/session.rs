// src/session.rs
// Chat session: holds the transcript between turns and exposes the UI boundary

use std::sync::Arc;
use tracing::info;

use crate::llm::LlmClient;
use crate::orchestrator::{self, Transcript};
use crate::store::GoalStore;

/// Goal listing as shown by the UI: (rows, headers)
pub type GoalTableView = (Vec<Vec<String>>, Vec<String>);

pub const WELCOME_MESSAGE: &str = "\
Welcome to Squad Goals!
I can help you track and manage your goals. Here's what you can do:

  * Add a new goal, optionally with an expected completion time (\"by next week\" is fine)
  * View your pending and completed goals
  * Mark a goal as completed, and I'll record how long it took
  * Delete a goal you no longer need
  * Add notes or an expected duration to a goal
  * Reopen a completed goal with /reopen <goal>

What goal would you like to track today?";

const ROLE_PROMPT: &str = "\
You are a goal-tracking assistant. You help the user add and delete goals, view their goals, \
mark goals as completed, and keep notes and an expected duration for each goal. \
When the user adds a goal, make sure you understand it well enough to give it a clear, distinct \
name, and ask whether they have an expected completion time in mind (optional, and it may be vague). \
Goals are matched by their exact name. Unless the user names a goal literally, work out which \
existing goal they mean: treat 'finish reading a book' and 'complete a book' as the same goal, but \
keep 'read a book' and 'read a book every day' apart. When you refer to an existing goal in a tool \
call, use its name exactly as listed. If you are unsure what the user wants or which goal they \
mean, ask. The user can always see the goal list. Changes only happen through the tools \
log_goal, view_goals, mark_goal_complete, delete_goal and update_goal_fields; if you do not call \
them, nothing is updated. Only 'Expected Duration' and 'Notes' can be changed with \
update_goal_fields. After each interaction, tell the user what you did.";

/// Build the system prompt around the current goal listing.
pub fn system_prompt(initial_goals: &str) -> String {
    format!(
        "{ROLE_PROMPT}\n\nInitial goals:\n\n{initial_goals}\n\n\
         This message will be displayed at the start of the chat:\n{WELCOME_MESSAGE}"
    )
}

pub struct GoalSession {
    llm: Arc<dyn LlmClient>,
    store: GoalStore,
    transcript: Transcript,
}

impl GoalSession {
    /// Start a session whose system prompt includes the goals stored right now.
    pub async fn start(llm: Arc<dyn LlmClient>, store: GoalStore) -> Self {
        let initial_goals = store.view_goals_formatted().await.text();
        info!(backend = store.backend_name(), model = %llm.model_name(), "Session started");

        Self {
            llm,
            store,
            transcript: Transcript::new(system_prompt(&initial_goals)),
        }
    }

    /// Run one turn. The table is returned only when the turn requested an
    /// operation that could change the store.
    pub async fn submit(&mut self, user_text: &str) -> (String, Option<GoalTableView>) {
        let transcript = std::mem::take(&mut self.transcript);
        let outcome =
            orchestrator::run_turn(self.llm.as_ref(), &self.store, transcript, user_text).await;
        self.transcript = outcome.transcript;

        let table = if outcome.refresh {
            Some(self.store.current_table().await)
        } else {
            None
        };
        (outcome.reply, table)
    }

    pub async fn current_table(&self) -> GoalTableView {
        self.store.current_table().await
    }

    pub fn store(&self) -> &GoalStore {
        &self.store
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::GoalName;
    use crate::testing::{MemoryTable, ScriptedLlm};

    #[tokio::test]
    async fn test_system_prompt_lists_initial_goals() {
        let store = GoalStore::new(MemoryTable::new());
        store.log_goal(&GoalName::parse("Learn Rust").unwrap()).await;

        let session = GoalSession::start(Arc::new(ScriptedLlm::new()), store).await;
        let system = session.transcript().messages()[0].content.clone().unwrap();

        assert!(system.contains("Initial goals:"));
        assert!(system.contains("Learn Rust,Pending"));
        assert!(system.contains(WELCOME_MESSAGE));
    }

    #[tokio::test]
    async fn test_empty_store_prompt_has_sentinel() {
        let session =
            GoalSession::start(Arc::new(ScriptedLlm::new()), GoalStore::new(MemoryTable::new()))
                .await;
        let system = session.transcript().messages()[0].content.clone().unwrap();
        assert!(system.contains("No goals found."));
    }

    #[tokio::test]
    async fn test_submit_refreshes_after_mutation_only() {
        let llm = ScriptedLlm::new()
            .tool_calls(&[("c1", "log_goal", r#"{"goal": "Run"}"#)])
            .reply("Logged.")
            .tool_calls(&[("c2", "view_goals", "{}")])
            .reply("Here they are.")
            .reply("Nothing to do.");
        let mut session =
            GoalSession::start(Arc::new(llm), GoalStore::new(MemoryTable::new())).await;

        let (reply, table) = session.submit("log run").await;
        assert_eq!(reply, "Logged.");
        let (rows, headers) = table.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(headers.len(), 7);

        let (_, table) = session.submit("show my goals").await;
        assert!(table.is_none());

        let (reply, table) = session.submit("thanks").await;
        assert_eq!(reply, "Nothing to do.");
        assert!(table.is_none());

        let (rows, _) = session.current_table().await;
        assert_eq!(rows[0][0], "Run");
    }
}
