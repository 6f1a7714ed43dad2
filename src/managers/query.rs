use crate::config::Settings;
use crate::errors::ToolError;
use crate::managers::{collection_url, resolve_collection};
use crate::odata::query::{build_filter, QueryOptions};
use crate::services::entity_resolver::EntityResolver;
use crate::services::gateway::{GatewayResult, HttpMethod, RequestGateway};
use crate::services::logger::Logger;
use crate::services::notifications::NotificationSink;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// `odataQuery`: paged reads from an entity set.
pub struct QueryManager {
    logger: Logger,
    validation: Validation,
    settings: Arc<Settings>,
    resolver: Arc<EntityResolver>,
    gateway: Arc<RequestGateway>,
}

impl QueryManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        settings: Arc<Settings>,
        resolver: Arc<EntityResolver>,
        gateway: Arc<RequestGateway>,
    ) -> Self {
        Self {
            logger: logger.child("query"),
            validation,
            settings,
            resolver,
            gateway,
        }
    }

    pub fn build_options(&self, args: &Value) -> Result<QueryOptions, ToolError> {
        let filter = self
            .validation
            .optional_object(args, "filter")?
            .and_then(build_filter);
        Ok(QueryOptions {
            filter,
            select: self.validation.string_list(args, "select")?,
            top: Some(
                self.validation
                    .optional_u64(args, "top")?
                    .unwrap_or(self.settings.default_top),
            ),
            skip: self.validation.optional_u64(args, "skip")?,
            cross_company: self.validation.optional_bool(args, "crossCompany")?,
        })
    }

    pub async fn query(
        &self,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        let entity = self.validation.ensure_string(&args, "entity")?;
        let options = self.build_options(&args)?;
        let path = resolve_collection(&self.resolver, &entity, sink, &self.logger).await;
        let url = match collection_url(&self.settings, &path) {
            Ok(url) => options.apply(&url),
            Err(result) => return Ok(result),
        };
        Ok(self.gateway.execute(HttpMethod::Get, &url, None, sink).await)
    }
}

#[async_trait]
impl ToolHandler for QueryManager {
    async fn handle(
        &self,
        _tool: &str,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        self.query(args, sink).await
    }
}
