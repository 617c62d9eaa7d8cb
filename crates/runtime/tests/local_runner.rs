//! End-to-end tests: declare an agent, compile it, ship the plan through its
//! JSON document, and run it with the local runner.

use std::sync::Arc;

use agentplan_core::{
    ActionError, ChatMessage, ChatModel, ChatModelConnection, ChatModelSettings,
    ChatRequestEvent, ChatResponseEvent, Event, ExecutionContext, ExtraArgs, InputEvent,
    MessageToolCall, OutputEvent, Prompt, PromptRef, Resource, ResourceError, ResourceKind, Tool,
    ToolError, ToolMetadata, TypedEvent,
};
use agentplan_plan::{
    function, ActionDeclaration, Agent, AgentPlan, DeclarableResource, FunctionRef, ProvideContext,
    ResourceArgs,
};
use agentplan_runtime::{LocalRunner, RuntimeError};
use serde::Deserialize;
use serde_json::{json, Value};

// ── Mock connection ──────────────────────────────────────────────────────

/// Answers with every message's content, one per line.
struct EchoConnection;

#[async_trait::async_trait]
impl ChatModelConnection for EchoConnection {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        _tools: &[Arc<dyn Tool>],
        _options: &ExtraArgs,
    ) -> Result<ChatMessage, ResourceError> {
        let content: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        Ok(ChatMessage::assistant(content.join("\n")))
    }
}

impl DeclarableResource for EchoConnection {
    const KIND: ResourceKind = ResourceKind::ChatModelConnection;
    const MODULE: &'static str = module_path!();
    const CLASS: &'static str = "EchoConnection";

    fn build(_args: ResourceArgs, _ctx: &ProvideContext<'_>) -> Result<Self, ResourceError> {
        Ok(EchoConnection)
    }

    fn into_resource(self) -> Resource {
        Resource::ChatModelConnection(Arc::new(self))
    }
}

// ── Mock chat model ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MockChatModelArgs {
    prompt: String,
    tools: Vec<String>,
}

/// Requests the `add` tool while the latest message mentions a sum, and
/// otherwise answers with the whole conversation.
struct MockChatModel {
    prompt: Arc<Prompt>,
    tools: Vec<ToolMetadata>,
}

#[async_trait::async_trait]
impl ChatModel for MockChatModel {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        _options: ExtraArgs,
    ) -> Result<ChatMessage, ResourceError> {
        let last = messages
            .last()
            .ok_or_else(|| ResourceError::Chat("no messages".into()))?;

        if last.content.contains("sum") {
            assert_eq!(self.tools[0].name, "add");
            let content = self.prompt.format_string(&last.extra_args)?;
            return Ok(ChatMessage::assistant(content).with_tool_calls(vec![MessageToolCall {
                id: "call-1".into(),
                name: "add".into(),
                arguments: json!({"a": 1, "b": 2}),
            }]));
        }

        let content: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        Ok(ChatMessage::assistant(content.join("\n")))
    }
}

impl DeclarableResource for MockChatModel {
    const KIND: ResourceKind = ResourceKind::ChatModel;
    const MODULE: &'static str = module_path!();
    const CLASS: &'static str = "MockChatModel";

    // Dependencies are resolved while the model is built.
    fn build(args: ResourceArgs, ctx: &ProvideContext<'_>) -> Result<Self, ResourceError> {
        let args: MockChatModelArgs = ctx.parse_args(args)?;
        let tools: Vec<ToolMetadata> = args
            .tools
            .iter()
            .map(|name| ctx.resolver.tool(name).map(|tool| tool.metadata()))
            .collect::<Result<_, _>>()?;
        Ok(MockChatModel {
            prompt: ctx.resolver.prompt(&args.prompt)?,
            tools,
        })
    }

    fn into_resource(self) -> Resource {
        Resource::ChatModel(Arc::new(self))
    }
}

// ── Agent ────────────────────────────────────────────────────────────────

fn add(args: Value) -> Result<Value, ToolError> {
    let operand = |key: &str| {
        args[key]
            .as_i64()
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' must be an integer")))
    };
    Ok(json!(operand("a")? + operand("b")?))
}

fn process_input(event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
    let input: InputEvent = event.decode()?;
    let text = input.input.as_str().unwrap_or_default().to_string();
    let mut task = ExtraArgs::new();
    task.insert("task".into(), Value::String(text.clone()));
    ctx.send_event(Event::new(&ChatRequestEvent::new(
        "math_model",
        vec![ChatMessage::user(text).with_extra_args(task)],
    ))?);
    Ok(())
}

fn process_chat_response(event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
    let response: ChatResponseEvent = event.decode()?;
    ctx.send_event(Event::new(&OutputEvent {
        key: response.request_id.to_string(),
        output: json!(response.response.content),
    })?);
    Ok(())
}

fn math_agent() -> Agent {
    let mut agent = Agent::new();
    agent
        .add_prompt(
            "task_prompt",
            &Prompt::from_text("Please call the appropriate tool to do the following task: {task}"),
        )
        .add_chat_model_connection::<EchoConnection, _>("echo", &json!({}))
        .add_chat_model_with::<MockChatModel, _>(
            "math_model",
            &json!({"connection": "echo", "prompt": "task_prompt", "tools": ["add"]}),
        )
        .add_tool(
            "add",
            "Calculate the sum of a and b",
            json!({
                "type": "object",
                "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
                "required": ["a", "b"]
            }),
            function!(add),
        )
        .add_action("process_input", [InputEvent::event_type()], function!(process_input))
        .add_action(
            "process_chat_response",
            [ChatResponseEvent::event_type()],
            function!(process_chat_response),
        );
    agent
}

/// Compile, encode and decode, then bind to this process's code.
fn runner_for(agent: &Agent) -> LocalRunner {
    let json = AgentPlan::compile(agent).unwrap().to_json().unwrap();
    let plan = Arc::new(AgentPlan::from_json(&json).unwrap());
    LocalRunner::new(plan.instantiate(Arc::new(agent.bindings())))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn builtin_actions_run_the_tool_loop() {
    let runner = runner_for(&math_agent());

    let outputs = runner
        .run("0001", json!("calculate the sum of 1 and 2."))
        .await
        .unwrap();

    assert_eq!(
        outputs,
        vec![json!(
            "calculate the sum of 1 and 2.\n\
             Please call the appropriate tool to do the following task: \
             calculate the sum of 1 and 2.\n\
             3"
        )]
    );
}

#[tokio::test]
async fn chat_session_renders_prompt_from_message_context() {
    fn greet(event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        let input: InputEvent = event.decode()?;
        let mut vars = ExtraArgs::new();
        vars.insert("name".into(), input.input);
        ctx.send_event(Event::new(&ChatRequestEvent::new(
            "greeter",
            vec![ChatMessage::user("hi").with_extra_args(vars)],
        ))?);
        Ok(())
    }

    let mut agent = Agent::new();
    agent
        .add_prompt("greeting", &Prompt::from_text("Hello {name}"))
        .add_chat_model_connection::<EchoConnection, _>("echo", &json!({}))
        .add_chat_model(
            "greeter",
            ChatModelSettings {
                name: "greeter".into(),
                connection: "echo".into(),
                prompt: Some(PromptRef::Named("greeting".into())),
                tools: vec![],
                options: ExtraArgs::new(),
            },
        )
        .add_action("greet", [InputEvent::event_type()], function!(greet))
        .add_action(
            "process_chat_response",
            [ChatResponseEvent::event_type()],
            function!(process_chat_response),
        );

    let outputs = runner_for(&agent).run("k", json!("Bob")).await.unwrap();
    assert_eq!(outputs, vec![json!("Hello Bob")]);
}

#[tokio::test]
async fn concurrent_inputs_share_one_instance_cache() {
    let runner = runner_for(&math_agent());

    let results = runner
        .run_all(
            (0..4)
                .map(|i| (format!("{i:04}"), json!("calculate the sum of 1 and 2.")))
                .collect(),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|outputs| outputs.len() == 1));

    // The mock model never resolves its connection; resolve it twice here.
    let first = runner.instance().get_resource("echo", ResourceKind::ChatModelConnection).unwrap();
    let again = runner.instance().get_resource("echo", ResourceKind::ChatModelConnection).unwrap();
    assert!(first.ptr_eq(&again));
    assert!(runner.instance().resources().is_cached(ResourceKind::ChatModel, "math_model"));
}

#[tokio::test]
async fn actions_can_resolve_resources() {
    fn render(event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        let input: InputEvent = event.decode()?;
        let prompt = ctx.prompt("greeting")?;
        let mut vars = ExtraArgs::new();
        vars.insert("name".into(), input.input);
        ctx.send_event(Event::new(&OutputEvent {
            key: input.key,
            output: json!(prompt.format_string(&vars)?),
        })?);
        Ok(())
    }

    let mut agent = Agent::new();
    agent
        .add_prompt("greeting", &Prompt::from_text("Hello {name}"))
        .add_action("render", [InputEvent::event_type()], function!(render));

    let outputs = runner_for(&agent).run("k", json!("Ada")).await.unwrap();
    assert_eq!(outputs, vec![json!("Hello Ada")]);
}

#[tokio::test]
async fn missing_resource_fails_the_action() {
    fn lookup(_event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        ctx.prompt("nowhere")?;
        Ok(())
    }

    let mut agent = Agent::new();
    agent.add_action("lookup", [InputEvent::event_type()], function!(lookup));

    let err = runner_for(&agent).run("k", json!(null)).await.unwrap_err();
    match err {
        RuntimeError::Action { action, source } => {
            assert_eq!(action, "lookup");
            assert!(matches!(
                source,
                ActionError::Resource(ResourceError::NotFound { kind: ResourceKind::Prompt, .. })
            ));
        }
        other => panic!("expected an action failure, got {other:?}"),
    }
}

#[tokio::test]
async fn runaway_event_loops_hit_the_limit() {
    fn echo_input(event: &Event, ctx: &dyn ExecutionContext) -> Result<(), ActionError> {
        ctx.send_event(event.clone());
        Ok(())
    }

    let mut agent = Agent::new();
    agent.add_action("echo_input", [InputEvent::event_type()], function!(echo_input));

    let runner = runner_for(&agent).with_max_events(8);
    let err = runner.run("k", json!(1)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::EventLimitExceeded { limit: 8 }));
}

#[tokio::test]
async fn unbound_foreign_action_is_reported() {
    let mut agent = Agent::new();
    agent.declare_action(ActionDeclaration::foreign(
        "remote",
        [InputEvent::event_type()],
        FunctionRef::foreign("my_agents.handlers", "remote"),
    ));

    let err = runner_for(&agent).run("k", json!(1)).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Action { source: ActionError::UnboundFunction(_), .. }
    ));
}

#[tokio::test]
async fn unrouted_events_are_ignored() {
    let runner = runner_for(&Agent::new());
    let outputs = runner
        .process(Event::raw("my_agents.Unheard".into(), json!({})))
        .await
        .unwrap();
    assert!(outputs.is_empty());
}
