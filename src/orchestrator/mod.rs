// src/orchestrator/mod.rs
// One conversational turn: model call, tool execution, final reply
//
// A turn is a pure step from (transcript, user text) to (transcript, reply).
// The caller owns the transcript between turns. Requested tool calls run
// strictly in the order the model gave them, each exactly once; nothing is
// retried or rolled back.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::llm::{LlmClient, Message, ToolChoice};
use crate::store::GoalStore;
use crate::tools::{self, goal_tools};

/// Reply shown when the model round-trip fails
pub const TURN_FAILED_REPLY: &str = "An error occurred. Please try again.";

/// Ordered conversation history sent to the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A transcript opening with the given system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// One executed tool call, as fed back to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecution {
    pub id: String,
    pub name: String,
    pub result: String,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub transcript: Transcript,
    pub reply: String,
    /// At least one requested operation could have changed the store
    pub refresh: bool,
    pub executed: Vec<ToolExecution>,
}

/// Run one turn. Never fails: a model error yields [`TURN_FAILED_REPLY`] and
/// the transcript as it stood when the error happened.
pub async fn run_turn(
    llm: &dyn LlmClient,
    store: &GoalStore,
    transcript: Transcript,
    user_text: &str,
) -> TurnOutcome {
    let mut turn = Turn {
        llm,
        store,
        transcript,
        executed: Vec::new(),
        refresh: false,
    };
    turn.transcript.push(Message::user(user_text));

    let reply = match turn.advance().await {
        Ok(reply) => {
            turn.transcript.push(Message::assistant(reply.clone()));
            reply
        }
        Err(e) => {
            error!(
                model = %llm.model_name(),
                executed = turn.executed.len(),
                error = %e,
                "Turn failed"
            );
            TURN_FAILED_REPLY.to_string()
        }
    };

    TurnOutcome {
        transcript: turn.transcript,
        reply,
        refresh: turn.refresh,
        executed: turn.executed,
    }
}

struct Turn<'a> {
    llm: &'a dyn LlmClient,
    store: &'a GoalStore,
    transcript: Transcript,
    executed: Vec<ToolExecution>,
    refresh: bool,
}

impl Turn<'_> {
    async fn advance(&mut self) -> Result<String> {
        // AwaitingModel
        let first = self
            .llm
            .chat(
                self.transcript.messages.clone(),
                Some(goal_tools()),
                ToolChoice::Auto,
            )
            .await?;

        let calls = first.requested_calls().to_vec();
        if calls.is_empty() {
            debug!("Model answered without tools");
            return Ok(first.content.unwrap_or_default());
        }

        // ExecutingTools
        self.transcript
            .push(Message::assistant_tool_calls(first.content.clone(), calls.clone()));

        for call in &calls {
            let executed =
                tools::execute(self.store, &call.function.name, &call.function.arguments).await;
            info!(
                call_id = %call.id,
                tool = %call.function.name,
                mutating = executed.mutating,
                "Tool call executed"
            );

            self.refresh |= executed.mutating;
            self.transcript
                .push(Message::tool_result(
                    call.id.clone(),
                    call.function.name.clone(),
                    executed.text.clone(),
                ));
            self.executed.push(ToolExecution {
                id: call.id.clone(),
                name: call.function.name.clone(),
                result: executed.text,
            });
        }

        // AwaitingModel, final reply
        let last = self
            .llm
            .chat(
                self.transcript.messages.clone(),
                Some(goal_tools()),
                ToolChoice::None,
            )
            .await?;

        if !last.requested_calls().is_empty() {
            warn!(
                ignored = last.requested_calls().len(),
                "Model requested tools in its final reply; ignoring"
            );
        }
        Ok(last.content.unwrap_or_default())
    }
}
