// src/tools/definitions.rs
// Tool schemas advertised to the model

use serde_json::json;

use crate::llm::Tool;

/// The five goal tools, in the order they are advertised
pub fn goal_tools() -> Vec<Tool> {
    vec![
        Tool::function(
            "log_goal",
            "Log a new goal. Fails with a message if a goal with the same name already exists.",
            json!({
                "type": "object",
                "properties": {
                    "goal": {
                        "type": "string",
                        "description": "The goal, in the user's words"
                    }
                },
                "required": ["goal"]
            }),
        ),
        Tool::function(
            "view_goals",
            "List every goal with its status, timestamps, duration, expected duration and notes.",
            json!({
                "type": "object",
                "properties": {}
            }),
        ),
        Tool::function(
            "mark_goal_complete",
            "Mark a pending goal as completed and record how long it took. \
             Use the goal name exactly as listed by view_goals.",
            json!({
                "type": "object",
                "properties": {
                    "goal": {
                        "type": "string",
                        "description": "Name of the goal to complete"
                    }
                },
                "required": ["goal"]
            }),
        ),
        Tool::function(
            "delete_goal",
            "Delete a goal permanently. Use the goal name exactly as listed by view_goals.",
            json!({
                "type": "object",
                "properties": {
                    "goal": {
                        "type": "string",
                        "description": "Name of the goal to delete"
                    }
                },
                "required": ["goal"]
            }),
        ),
        Tool::function(
            "update_goal_fields",
            "Update fields of an existing goal. Only 'Expected Duration' and 'Notes' can be changed; \
             status changes go through mark_goal_complete.",
            json!({
                "type": "object",
                "properties": {
                    "goal": {
                        "type": "string",
                        "description": "Name of the goal to update"
                    },
                    "updates": {
                        "type": "object",
                        "description": "Map of field name to new value, e.g. {\"Notes\": \"finished chapter 3\"}",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["goal", "updates"]
            }),
        ),
    ]
}
