use crate::config::Settings;
use crate::constants::network::USER_AGENT;
use crate::errors::ToolError;
use crate::managers;
use crate::managers::records::{CREATE_TOOLS, UPDATE_TOOL};
use crate::mcp::catalog::tool_names;
use crate::services::credentials::CredentialManager;
use crate::services::entity_resolver::EntityResolver;
use crate::services::gateway::RequestGateway;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide component graph. Each cache lives in exactly one instance here.
pub struct App {
    pub logger: Logger,
    pub settings: Arc<Settings>,
    pub credentials: Arc<CredentialManager>,
    pub entities: Arc<EntityResolver>,
    pub gateway: Arc<RequestGateway>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    pub fn initialize() -> Result<Self, ToolError> {
        Self::from_settings(Settings::from_env(), Logger::new("d365"))
    }

    pub fn from_settings(settings: Settings, logger: Logger) -> Result<Self, ToolError> {
        let settings = Arc::new(settings);
        let client = build_http_client(&settings)?;
        let credentials = Arc::new(CredentialManager::new(
            logger.clone(),
            settings.clone(),
            client.clone(),
        ));
        Self::wire(settings, logger, client, credentials)
    }

    /// Wires the graph around an existing credential manager (tests inject one
    /// with a manual clock).
    pub fn wire(
        settings: Arc<Settings>,
        logger: Logger,
        client: Client,
        credentials: Arc<CredentialManager>,
    ) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let entities = Arc::new(EntityResolver::new(
            logger.clone(),
            settings.clone(),
            client.clone(),
            credentials.clone(),
        ));
        let gateway = Arc::new(RequestGateway::new(
            logger.clone(),
            client,
            credentials.clone(),
        ));

        let query_manager = Arc::new(managers::query::QueryManager::new(
            logger.clone(),
            validation.clone(),
            settings.clone(),
            entities.clone(),
            gateway.clone(),
        ));
        let record_manager = Arc::new(managers::records::RecordManager::new(
            logger.clone(),
            validation.clone(),
            settings.clone(),
            entities.clone(),
            gateway.clone(),
        ));
        let entity_manager = Arc::new(managers::entities::EntityManager::new(
            validation,
            entities.clone(),
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("odataQuery".to_string(), query_manager);
        for (tool, _, _) in CREATE_TOOLS {
            handlers.insert(tool.to_string(), record_manager.clone());
        }
        handlers.insert(UPDATE_TOOL.to_string(), record_manager);
        handlers.insert("resolveEntity".to_string(), entity_manager);

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Self::validate_tool_wiring(&tool_executor)?;

        Ok(Self {
            logger,
            settings,
            credentials,
            entities,
            gateway,
            tool_executor,
        })
    }

    fn validate_tool_wiring(executor: &ToolExecutor) -> Result<(), ToolError> {
        let mut missing: Vec<&str> = tool_names()
            .into_iter()
            .filter(|name| !executor.has_handler(name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }
}

pub fn build_http_client(settings: &Settings) -> Result<Client, ToolError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_millis(settings.request_timeout_ms))
        .build()
        .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))
}
