use crate::errors::ToolError;
use crate::services::entity_resolver::EntityResolver;
use crate::services::gateway::GatewayResult;
use crate::services::notifications::NotificationSink;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// `resolveEntity`: exposes the fuzzy resolver directly.
pub struct EntityManager {
    validation: Validation,
    resolver: Arc<EntityResolver>,
}

impl EntityManager {
    pub fn new(validation: Validation, resolver: Arc<EntityResolver>) -> Self {
        Self {
            validation,
            resolver,
        }
    }
}

#[async_trait]
impl ToolHandler for EntityManager {
    async fn handle(
        &self,
        _tool: &str,
        args: Value,
        _sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        let query = self.validation.ensure_string(&args, "query")?;
        Ok(match self.resolver.resolve(&query).await {
            Some(path) => GatewayResult::text(path),
            None => GatewayResult::error(format!("No entity matches '{}'.", query)),
        })
    }
}
