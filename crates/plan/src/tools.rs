//! Function tools: tools backed by a registered native function.

use std::sync::Arc;

use agentplan_core::{Resource, ResourceError, ResourceKind, Tool, ToolError, ToolMetadata, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::function::{FunctionRef, ToolFunction};
use crate::types::{DeclarableResource, ProvideContext, ResourceArgs};

/// The serializable snapshot of a function tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionToolSpec {
    pub metadata: ToolMetadata,
    pub func: FunctionRef,
}

pub struct FunctionTool {
    spec: FunctionToolSpec,
    func: Arc<dyn ToolFunction>,
}

impl FunctionTool {
    pub fn new(spec: FunctionToolSpec, func: Arc<dyn ToolFunction>) -> Self {
        Self { spec, func }
    }

    pub fn spec(&self) -> &FunctionToolSpec {
        &self.spec
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.spec.metadata.name
    }

    fn description(&self) -> &str {
        &self.spec.metadata.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.spec.metadata.parameters.clone()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let value = self.func.call(arguments)?;
        let output = match &value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: Some(value),
        })
    }
}

impl DeclarableResource for FunctionTool {
    const KIND: ResourceKind = ResourceKind::Tool;
    const MODULE: &'static str = "agentplan_plan::tools";
    const CLASS: &'static str = "FunctionTool";

    fn build(args: ResourceArgs, ctx: &ProvideContext<'_>) -> Result<Self, ResourceError> {
        let spec: FunctionToolSpec = ctx.parse_args(args)?;
        let func = ctx.functions.tool(&spec.func).ok_or_else(|| {
            ResourceError::Construction(format!(
                "no tool function bound for {} (tool '{}')",
                spec.func, ctx.name
            ))
        })?;
        Ok(FunctionTool::new(spec, func))
    }

    fn into_resource(self) -> Resource {
        Resource::Tool(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shout(args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing text".into()))?;
        Ok(json!(text.to_uppercase()))
    }

    fn tool() -> FunctionTool {
        let f = crate::function!(shout);
        FunctionTool::new(
            FunctionToolSpec {
                metadata: ToolMetadata {
                    name: "shout".into(),
                    description: "Upper-case text".into(),
                    parameters: json!({"type": "object"}),
                },
                func: f.reference().clone(),
            },
            Arc::new(f),
        )
    }

    #[tokio::test]
    async fn string_results_are_unquoted() {
        let result = tool().execute(json!({"text": "hi"})).await.unwrap();
        assert_eq!(result.output, "HI");
        assert_eq!(result.data, Some(json!("HI")));
    }

    #[tokio::test]
    async fn function_errors_propagate() {
        let err = tool().execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
