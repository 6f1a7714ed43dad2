use crate::config::Settings;
use crate::errors::ToolError;
use crate::managers::{collection_url, resolve_collection};
use crate::odata::query::encode_key;
use crate::services::entity_resolver::EntityResolver;
use crate::services::gateway::{GatewayResult, HttpMethod, RequestGateway};
use crate::services::logger::Logger;
use crate::services::notifications::NotificationSink;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Create tools: `(tool name, argument holding the record, entity set)`.
pub const CREATE_TOOLS: &[(&str, &str, &str)] = &[
    ("createCustomer", "customerData", "CustomersV3"),
    ("createCustomerGroup", "customerGroupData", "CustomerGroups"),
    ("createVendorGroup", "vendorGroupData", "VendorGroups"),
    ("createLegalEntity", "legalEntityData", "LegalEntities"),
];

pub const UPDATE_TOOL: &str = "updateRecord";

/// Record writes: POST to fixed entity sets and PATCH by key.
pub struct RecordManager {
    logger: Logger,
    validation: Validation,
    settings: Arc<Settings>,
    resolver: Arc<EntityResolver>,
    gateway: Arc<RequestGateway>,
}

impl RecordManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        settings: Arc<Settings>,
        resolver: Arc<EntityResolver>,
        gateway: Arc<RequestGateway>,
    ) -> Self {
        Self {
            logger: logger.child("records"),
            validation,
            settings,
            resolver,
            gateway,
        }
    }

    pub async fn create(
        &self,
        tool: &str,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        let (_, data_key, entity) = CREATE_TOOLS
            .iter()
            .find(|(name, _, _)| *name == tool)
            .ok_or_else(|| ToolError::not_found(format!("Unknown create tool: {}", tool)))?;
        let record = Value::Object(self.validation.ensure_object(&args, data_key)?.clone());
        let url = match collection_url(&self.settings, entity) {
            Ok(url) => url,
            Err(result) => return Ok(result),
        };
        Ok(self
            .gateway
            .execute(HttpMethod::Post, &url, Some(&record), sink)
            .await)
    }

    pub async fn update(
        &self,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        let entity = self.validation.ensure_string(&args, "entity")?;
        let key = self.validation.ensure_string(&args, "key")?;
        let data = Value::Object(self.validation.ensure_object(&args, "data")?.clone());

        let path = resolve_collection(&self.resolver, &entity, sink, &self.logger).await;
        let segment = format!("{}({})", path, encode_key(key_predicate(&key)));
        let url = match collection_url(&self.settings, &segment) {
            Ok(url) => url,
            Err(result) => return Ok(result),
        };
        Ok(self
            .gateway
            .execute(HttpMethod::Patch, &url, Some(&data), sink)
            .await)
    }
}

/// Drops one enclosing pair of parentheses, so `(Id='1')` and `Id='1'` agree.
fn key_predicate(raw: &str) -> &str {
    raw.strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(raw)
}

#[async_trait]
impl ToolHandler for RecordManager {
    async fn handle(
        &self,
        tool: &str,
        args: Value,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, ToolError> {
        if tool == UPDATE_TOOL {
            self.update(args, sink).await
        } else {
            self.create(tool, args, sink).await
        }
    }
}
