use agentplan_core::{
    ActionError, ChatRequestEvent, ChatResponseEvent, Event, ExecutionContext, ExtraArgs,
    ToolRequestEvent, ToolResponseEvent,
};
use async_trait::async_trait;
use tracing::debug;

use crate::function::ActionHandler;

/// Runs a named chat model for a [`ChatRequestEvent`], and resumes the
/// conversation when a [`ToolResponseEvent`] comes back.
///
/// A response carrying tool calls becomes a [`ToolRequestEvent`]; anything
/// else is the final [`ChatResponseEvent`].
pub struct ChatModelAction;

#[async_trait]
impl ActionHandler for ChatModelAction {
    async fn handle(&self, event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        let (request_id, model_name, messages) = if event.is::<ToolResponseEvent>() {
            let resumed: ToolResponseEvent = event.decode()?;
            let mut messages = resumed.messages;
            messages.extend(resumed.responses);
            (resumed.request_id, resumed.model, messages)
        } else {
            let request: ChatRequestEvent = event.decode()?;
            (request.request_id, request.model, request.messages)
        };

        let model = ctx.chat_model(&model_name)?;
        let response = model.chat(messages.clone(), ExtraArgs::new()).await?;

        if response.tool_calls.is_empty() {
            debug!(model = %model_name, %request_id, "Chat finished");
            ctx.send_event(Event::new(&ChatResponseEvent { request_id, response })?);
        } else {
            debug!(
                model = %model_name,
                %request_id,
                calls = response.tool_calls.len(),
                "Model requested tool calls"
            );
            let tool_calls = response.tool_calls.clone();
            let mut conversation = messages;
            conversation.push(response);
            ctx.send_event(Event::new(&ToolRequestEvent {
                request_id,
                model: model_name,
                messages: conversation,
                tool_calls,
            })?);
        }
        Ok(())
    }
}
