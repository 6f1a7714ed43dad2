pub mod credentials;
pub mod entity_resolver;
pub mod gateway;
pub mod logger;
pub mod notifications;
pub mod tool_executor;
pub mod validation;
