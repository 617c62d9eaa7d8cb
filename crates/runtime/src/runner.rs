//! The local event loop.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use agentplan_config::RuntimeConfig;
use agentplan_core::{
    Event, ExecutionContext, InputEvent, OutputEvent, Resource, ResourceError, ResourceKind,
    TypedEvent,
};
use agentplan_plan::PlanInstance;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::RuntimeError;

/// The context handed to one action invocation. Sent events are buffered and
/// queued once the action returns.
struct RunnerContext<'a> {
    instance: &'a PlanInstance,
    sent: Mutex<Vec<Event>>,
}

impl<'a> RunnerContext<'a> {
    fn new(instance: &'a PlanInstance) -> Self {
        Self {
            instance,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn into_events(self) -> Vec<Event> {
        self.sent.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExecutionContext for RunnerContext<'_> {
    fn send_event(&self, event: Event) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn get_resource(&self, name: &str, kind: ResourceKind) -> Result<Resource, ResourceError> {
        self.instance.get_resource(name, kind)
    }
}

/// Runs a plan instance in-process.
pub struct LocalRunner {
    instance: PlanInstance,
    max_events: usize,
}

impl LocalRunner {
    pub fn new(instance: PlanInstance) -> Self {
        Self::from_config(instance, &RuntimeConfig::default())
    }

    pub fn from_config(instance: PlanInstance, config: &RuntimeConfig) -> Self {
        Self {
            instance,
            max_events: config.max_events_per_input,
        }
    }

    /// Set the maximum number of events processed for one input.
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    pub fn instance(&self) -> &PlanInstance {
        &self.instance
    }

    /// Process one keyed input and return the outputs it produced, in the
    /// order they were sent.
    pub async fn run(&self, key: &str, input: Value) -> Result<Vec<Value>, RuntimeError> {
        let event = Event::new(&InputEvent {
            key: key.to_string(),
            input,
        })?;
        let outputs = self.process(event).await?;
        outputs
            .iter()
            .map(|event| {
                event
                    .decode::<OutputEvent>()
                    .map(|out| out.output)
                    .map_err(|e| RuntimeError::InvalidOutput(e.to_string()))
            })
            .collect()
    }

    /// Process several inputs concurrently. Results are in input order.
    pub async fn run_all(
        &self,
        inputs: Vec<(String, Value)>,
    ) -> Result<Vec<Vec<Value>>, RuntimeError> {
        futures::future::try_join_all(
            inputs
                .into_iter()
                .map(|(key, input)| async move { self.run(&key, input).await }),
        )
        .await
    }

    /// Dispatch `event` and everything it causes. Returns the output events.
    pub async fn process(&self, event: Event) -> Result<Vec<Event>, RuntimeError> {
        let plan = self.instance.plan();
        let mut queue = VecDeque::from([event]);
        let mut outputs = Vec::new();
        let mut processed = 0usize;

        while let Some(event) = queue.pop_front() {
            processed += 1;
            if processed > self.max_events {
                return Err(RuntimeError::EventLimitExceeded {
                    limit: self.max_events,
                });
            }

            if event.event_type == OutputEvent::event_type() {
                outputs.push(event);
                continue;
            }

            let actions = plan.get_actions(&event.event_type);
            if actions.is_empty() {
                debug!(event_type = %event.event_type, "No action listens to event");
                continue;
            }

            for action in actions {
                let failed = |source| RuntimeError::Action {
                    action: action.name.clone(),
                    source,
                };
                let handler = self.instance.action_handler(action).map_err(failed)?;
                let ctx = RunnerContext::new(&self.instance);
                debug!(action = %action.name, event_type = %event.event_type, "Running action");
                handler.handle(&event, &ctx).await.map_err(failed)?;
                queue.extend(ctx.into_events());
            }
        }

        info!(events = processed, outputs = outputs.len(), "Input processed");
        Ok(outputs)
    }
}
