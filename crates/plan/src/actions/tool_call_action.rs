use agentplan_core::{
    ActionError, ChatMessage, Event, ExecutionContext, ToolCall, ToolRequestEvent,
    ToolResponseEvent,
};
use async_trait::async_trait;
use tracing::debug;

use crate::function::ActionHandler;

/// Executes the tool calls of a [`ToolRequestEvent`] in order and answers
/// with one tool message per call.
pub struct ToolCallAction;

#[async_trait]
impl ActionHandler for ToolCallAction {
    async fn handle(&self, event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        let request: ToolRequestEvent = event.decode()?;

        let mut responses = Vec::with_capacity(request.tool_calls.len());
        for call in &request.tool_calls {
            let tool = ctx.tool(&call.name)?;
            let result = tool
                .call(&ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                })
                .await?;
            debug!(tool = %call.name, success = result.success, "Tool call finished");
            responses.push(ChatMessage::tool_result(result.call_id, result.output));
        }

        ctx.send_event(Event::new(&ToolResponseEvent {
            request_id: request.request_id,
            model: request.model,
            messages: request.messages,
            responses,
        })?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agentplan_core::{MessageToolCall, Resource, Role, Tool, ToolError, ToolResult};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::actions::test_support::RecordingContext;

    struct AddTool;

    #[async_trait]
    impl Tool for AddTool {
        fn name(&self) -> &str {
            "add"
        }
        fn description(&self) -> &str {
            "Add two integers"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
            let sum = arguments["a"].as_i64().unwrap_or(0) + arguments["b"].as_i64().unwrap_or(0);
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: sum.to_string(),
                data: None,
            })
        }
    }

    fn call(id: &str, a: i64, b: i64) -> MessageToolCall {
        MessageToolCall {
            id: id.into(),
            name: "add".into(),
            arguments: json!({"a": a, "b": b}),
        }
    }

    #[tokio::test]
    async fn answers_each_call_in_order() {
        let ctx = RecordingContext::default().with("add", Resource::Tool(Arc::new(AddTool)));
        let conversation = vec![ChatMessage::user("two sums")];
        let request = ToolRequestEvent {
            request_id: Uuid::new_v4(),
            model: "math".into(),
            messages: conversation.clone(),
            tool_calls: vec![call("first", 1, 2), call("second", 3, 4)],
        };

        ToolCallAction
            .handle(&Event::new(&request).unwrap(), &ctx)
            .await
            .unwrap();

        let sent = ctx.sent();
        assert_eq!(sent.len(), 1);
        let response: ToolResponseEvent = sent[0].decode().unwrap();
        assert_eq!(response.request_id, request.request_id);
        assert_eq!(response.model, "math");
        assert_eq!(response.messages, conversation);
        assert_eq!(
            response.responses,
            vec![
                ChatMessage::tool_result("first", "3"),
                ChatMessage::tool_result("second", "7"),
            ]
        );
        assert!(response.responses.iter().all(|m| m.role == Role::Tool));
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_answering() {
        let ctx = RecordingContext::default();
        let request = ToolRequestEvent {
            request_id: Uuid::new_v4(),
            model: "math".into(),
            messages: vec![],
            tool_calls: vec![call("only", 1, 1)],
        };
        let err = ToolCallAction
            .handle(&Event::new(&request).unwrap(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Resource(_)));
        assert!(ctx.sent().is_empty());
    }
}
