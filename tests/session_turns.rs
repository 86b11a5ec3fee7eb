// tests/session_turns.rs
// Conversation turns through GoalSession with a scripted model

use std::sync::Arc;

use squad_goals::orchestrator::TURN_FAILED_REPLY;
use squad_goals::testing::{MemoryTable, ScriptedLlm};
use squad_goals::{CsvTable, GoalSession, GoalStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_conversation_over_flat_file() {
    let dir = TempDir::new().unwrap();
    let store = GoalStore::new(CsvTable::open(dir.path().join("goals.csv")).await.unwrap());

    let llm = Arc::new(
        ScriptedLlm::new()
            .tool_calls(&[("call_1", "log_goal", r#"{"goal": "Read a book"}"#)])
            .reply("I've added 'Read a book'.")
            .tool_calls(&[
                ("call_2", "mark_goal_complete", r#"{"goal": "Read a book"}"#),
                (
                    "call_3",
                    "update_goal_fields",
                    r#"{"goal": "Read a book", "updates": {"Notes": "finished chapter 3"}}"#,
                ),
            ])
            .reply("Marked complete and noted your progress."),
    );
    let mut session = GoalSession::start(llm.clone(), store).await;

    let (reply, table) = session.submit("I want to read a book").await;
    assert_eq!(reply, "I've added 'Read a book'.");
    let (rows, headers) = table.unwrap();
    assert_eq!(headers[0], "Goal");
    assert_eq!(rows[0][0], "Read a book");
    assert_eq!(rows[0][1], "Pending");

    let (_, table) = session.submit("done with it, finished chapter 3").await;
    let (rows, _) = table.unwrap();
    assert_eq!(rows[0][1], "Completed");
    assert_eq!(rows[0][6], "finished chapter 3");

    // Second turn's final call sees both results, tagged with their ids
    let calls = llm.calls();
    assert_eq!(calls.len(), 4);
    let tool_msgs: Vec<_> = calls[3]
        .messages
        .iter()
        .filter(|m| m.role == "tool")
        .collect();
    let ids: Vec<_> = tool_msgs.iter().map(|m| m.tool_call_id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["call_1", "call_2", "call_3"]);
    let operations: Vec<_> = tool_msgs.iter().map(|m| m.name.clone().unwrap()).collect();
    assert_eq!(operations, vec!["log_goal", "mark_goal_complete", "update_goal_fields"]);
    assert!(tool_msgs[1].content.as_ref().unwrap().contains("marked as completed"));
    assert!(tool_msgs[2].content.as_ref().unwrap().contains("Notes → finished chapter 3"));
}

#[tokio::test]
async fn test_backend_outage_is_reported_not_hidden() {
    let table = MemoryTable::new();
    table.fail_with("connection reset");
    let llm = Arc::new(
        ScriptedLlm::new()
            .tool_calls(&[("c1", "delete_goal", r#"{"goal": "Run"}"#)])
            .reply("The goal store is unavailable right now."),
    );
    let mut session = GoalSession::start(llm.clone(), GoalStore::new(table)).await;

    let (_, table) = session.submit("delete run").await;
    assert!(table.is_some());

    let result = llm.calls()[1]
        .messages
        .iter()
        .find(|m| m.role == "tool")
        .and_then(|m| m.content.clone())
        .unwrap();
    assert!(result.starts_with("Storage backend unavailable while trying to delete 'Run'"));
    assert!(!result.contains("not found"));
}

#[tokio::test]
async fn test_model_failure_gives_generic_reply() {
    let llm = Arc::new(ScriptedLlm::new().failure("503 Service Unavailable"));
    let mut session = GoalSession::start(llm, GoalStore::new(MemoryTable::new())).await;

    let before = session.transcript().len();
    let (reply, table) = session.submit("hello").await;

    assert_eq!(reply, TURN_FAILED_REPLY);
    assert!(table.is_none());
    assert_eq!(session.transcript().len(), before + 1);
}
