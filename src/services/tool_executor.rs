use crate::errors::ToolError;
use crate::services::gateway::GatewayResult;
use crate::services::logger::Logger;
use crate::services::notifications::NotificationSink;
use crate::utils::suggest::suggest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(
        &self,
        tool: &str,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError>;
}

/// Routes a tool name to its handler.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_handler(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub async fn execute(
        &self,
        tool: &str,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        let Some(handler) = self.handlers.get(tool) else {
            return Err(self.unknown_tool(tool));
        };

        let started = Instant::now();
        let result = handler.handle(tool, args, sink).await;
        let meta = serde_json::json!({
            "tool": tool,
            "duration_ms": started.elapsed().as_millis() as u64,
            "is_error": result.as_ref().map(|r| r.is_error).unwrap_or(true),
        });
        self.logger.info("Tool call finished", Some(&meta));
        result
    }

    fn unknown_tool(&self, tool: &str) -> ToolError {
        let mut known: Vec<&str> = self.handlers.keys().map(|k| k.as_str()).collect();
        known.sort_unstable();
        let suggestions = suggest(tool, &known, 3);
        let mut err = ToolError::not_found(format!("Unknown tool: {}", tool))
            .with_details(serde_json::json!({ "known_tools": known }));
        if !suggestions.is_empty() {
            err = err.with_hint(format!("Did you mean: {}?", suggestions.join(", ")));
        }
        err
    }
}
