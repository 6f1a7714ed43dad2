pub mod entities;
pub mod query;
pub mod records;

use crate::config::Settings;
use crate::services::entity_resolver::EntityResolver;
use crate::services::gateway::GatewayResult;
use crate::services::logger::Logger;
use crate::services::notifications::{notify, Notification, NotificationSink};

/// Canonical path for `requested`, or `requested` itself when nothing matches.
pub(crate) async fn resolve_collection(
    resolver: &EntityResolver,
    requested: &str,
    sink: &dyn NotificationSink,
    logger: &Logger,
) -> String {
    match resolver.resolve(requested).await {
        Some(path) => {
            if path != requested {
                notify(
                    sink,
                    logger,
                    Notification::info(format!("Resolved entity '{}' to '{}'.", requested, path)),
                )
                .await;
            }
            path
        }
        None => {
            logger.debug(
                "No entity match, using name as given",
                Some(&serde_json::json!({ "entity": requested })),
            );
            requested.to_string()
        }
    }
}

/// `<resource>/data/<path>`, or an error result when the resource URL is unset.
pub(crate) fn collection_url(settings: &Settings, path: &str) -> Result<String, GatewayResult> {
    settings
        .data_url()
        .map(|base| format!("{}/{}", base, path.trim_start_matches('/')))
        .map_err(|err| GatewayResult::error(format!("An unexpected error occurred: {}", err)))
}
