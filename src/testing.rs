// src/testing.rs
// Test doubles: an in-memory goal table and a scripted language model
//
// Public so integration tests under tests/ can drive GoalSession end to end
// without files, network or an API key.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{GoalError, Result};
use crate::goals::GoalRecord;
use crate::llm::{ChatResult, LlmClient, Message, Tool, ToolCall, ToolChoice};
use crate::store::{GoalTable, Row, RowChange};

// ---------------------------------------------------------------------------
// MemoryTable
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    records: Vec<GoalRecord>,
    failure: Option<String>,
}

/// GoalTable over a shared Vec. Clones share state, so a test can keep one
/// handle for inspection after moving another into a GoalStore.
#[derive(Clone, Default)]
pub struct MemoryTable {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the contents.
    pub fn seed(&self, records: Vec<GoalRecord>) {
        self.lock().records = records;
    }

    pub fn records(&self) -> Vec<GoalRecord> {
        self.lock().records.clone()
    }

    /// Make every later load/apply fail as an unreachable backend would.
    pub fn fail_with(&self, reason: &str) {
        self.lock().failure = Some(reason.to_string());
    }

    fn check(&self) -> Result<()> {
        match &self.lock().failure {
            Some(reason) => Err(GoalError::Io(std::io::Error::other(reason.clone()))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GoalTable for MemoryTable {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Vec<Row>> {
        self.check()?;
        Ok(self
            .lock()
            .records
            .iter()
            .cloned()
            .enumerate()
            .map(|(position, record)| Row { position, record })
            .collect())
    }

    async fn apply(&self, _rows: Vec<Row>, change: RowChange) -> Result<()> {
        self.check()?;
        let mut state = self.lock();
        let stale = |position: usize| GoalError::Schema(format!("row {position} no longer exists"));
        match change {
            RowChange::Append(record) => state.records.push(record),
            RowChange::Replace { position, record } => {
                *state.records.get_mut(position).ok_or_else(|| stale(position))? = record;
            }
            RowChange::Remove { position } => {
                if position >= state.records.len() {
                    return Err(stale(position));
                }
                state.records.remove(position);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedLlm
// ---------------------------------------------------------------------------

/// A recorded call to `ScriptedLlm::chat()`.
#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub tool_choice: ToolChoice,
}

/// LlmClient that replays a FIFO queue of responses. An exhausted queue or a
/// scripted failure makes `chat` return an error.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<std::result::Result<ChatResult, String>>>,
    calls: Mutex<Vec<RecordedChat>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(ChatResult::text(text)))
    }

    /// Queue a response requesting `(id, name, arguments)` calls in order.
    pub fn tool_calls(self, calls: &[(&str, &str, &str)]) -> Self {
        let calls = calls
            .iter()
            .map(|(id, name, args)| ToolCall::function(*id, *name, *args))
            .collect();
        self.push(Ok(ChatResult::calls(calls)))
    }

    pub fn failure(self, reason: &str) -> Self {
        self.push(Err(reason.to_string()))
    }

    fn push(self, response: std::result::Result<ChatResult, String>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedChat> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<Tool>>,
        tool_choice: ToolChoice,
    ) -> anyhow::Result<ChatResult> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedChat {
                messages,
                tool_names: tools
                    .unwrap_or_default()
                    .into_iter()
                    .map(|t| t.function.name)
                    .collect(),
                tool_choice,
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
            None => Err(anyhow::anyhow!("no scripted response left")),
        }
    }

    fn model_name(&self) -> String {
        "scripted".to_string()
    }
}
