use crate::config::Settings;
use crate::constants::entities::FUZZY_THRESHOLD;
use crate::errors::GatewayError;
use crate::services::credentials::CredentialManager;
use crate::services::logger::Logger;
use crate::utils::fuzzy::{normalize_token, normalized_distance};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One collection listed by the service document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub display_name: String,
    pub canonical_path: String,
}

#[derive(Debug, Deserialize)]
struct ServiceDocument {
    #[serde(default)]
    value: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    name: String,
    url: String,
}

#[derive(Debug)]
struct IndexedEntity {
    record: EntityRecord,
    name_key: String,
    path_key: String,
}

/// Immutable snapshot of the entity list with pre-normalized match keys.
#[derive(Debug, Default)]
pub struct EntityIndex {
    entries: Vec<IndexedEntity>,
}

impl EntityIndex {
    /// Builds the index, keeping the first record for any repeated canonical path.
    pub fn build(records: Vec<EntityRecord>) -> Self {
        let mut seen = HashSet::new();
        let entries = records
            .into_iter()
            .filter(|record| seen.insert(record.canonical_path.clone()))
            .map(|record| IndexedEntity {
                name_key: normalize_token(&record.display_name),
                path_key: normalize_token(&record.canonical_path),
                record,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best record by ascending distance, ties broken by canonical path.
    pub fn best_match(&self, query: &str) -> Option<(&EntityRecord, f64)> {
        let key = normalize_token(query);
        if key.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .map(|entry| {
                let score = normalized_distance(&key, &entry.name_key)
                    .min(normalized_distance(&key, &entry.path_key));
                (&entry.record, score)
            })
            .min_by(|a, b| {
                a.1.total_cmp(&b.1)
                    .then_with(|| a.0.canonical_path.cmp(&b.0.canonical_path))
            })
    }

    /// Canonical path of the best record, if it is within the threshold.
    pub fn lookup(&self, query: &str) -> Option<&str> {
        self.best_match(query)
            .filter(|(_, score)| *score <= FUZZY_THRESHOLD)
            .map(|(record, _)| record.canonical_path.as_str())
    }
}

/// Maps loosely spelled collection names onto the paths the service expects.
///
/// The entity list is fetched once and kept until [`EntityResolver::invalidate`].
/// A failed list request is cached as an empty list so lookups stop matching
/// instead of retrying; a failed token fetch is not cached.
pub struct EntityResolver {
    logger: Logger,
    settings: Arc<Settings>,
    client: Client,
    credentials: Arc<CredentialManager>,
    snapshot: Mutex<Option<Arc<EntityIndex>>>,
}

impl EntityResolver {
    pub fn new(
        logger: Logger,
        settings: Arc<Settings>,
        client: Client,
        credentials: Arc<CredentialManager>,
    ) -> Self {
        Self {
            logger: logger.child("entities"),
            settings,
            client,
            credentials,
            snapshot: Mutex::new(None),
        }
    }

    pub async fn resolve(&self, query: &str) -> Option<String> {
        let index = self.snapshot().await;
        if index.is_empty() {
            return None;
        }
        let resolved = index.lookup(query).map(|path| path.to_string());
        self.logger.debug(
            "Entity lookup",
            Some(&serde_json::json!({ "query": query, "resolved": resolved })),
        );
        resolved
    }

    /// Current snapshot, fetching it first if none is cached.
    ///
    /// Without a token nothing is cached and the next lookup tries again. Once
    /// the list request itself has been attempted, its outcome is kept, an
    /// empty list on failure.
    pub async fn snapshot(&self) -> Arc<EntityIndex> {
        let mut guard = self.snapshot.lock().await;
        if let Some(index) = guard.as_ref() {
            return index.clone();
        }

        let (token, url) = match self.prepare().await {
            Ok(prepared) => prepared,
            Err(err) => {
                let meta = serde_json::json!({ "error": err.to_string() });
                if err.is_configuration() {
                    self.logger
                        .warn("Entity list unavailable without configuration", Some(&meta));
                } else {
                    self.logger
                        .error("No token for the entity list, will retry", Some(&meta));
                }
                return Arc::new(EntityIndex::default());
            }
        };

        let records = match self.fetch_entities(&token, &url).await {
            Ok(records) => records,
            Err(err) => {
                self.logger.error(
                    "Error fetching entity list, caching empty list",
                    Some(&serde_json::json!({ "error": err.to_string() })),
                );
                Vec::new()
            }
        };
        let index = Arc::new(EntityIndex::build(records));
        self.logger.info(
            "Entity index built",
            Some(&serde_json::json!({ "entities": index.len() })),
        );
        *guard = Some(index.clone());
        index
    }

    /// Forgets the snapshot; the next lookup refetches the list.
    pub async fn invalidate(&self) {
        *self.snapshot.lock().await = None;
    }

    async fn prepare(&self) -> Result<(String, String), GatewayError> {
        let token = self.credentials.get_token().await?;
        let url = self.settings.data_url()?;
        Ok((token, url))
    }

    async fn fetch_entities(
        &self,
        token: &str,
        url: &str,
    ) -> Result<Vec<EntityRecord>, GatewayError> {
        self.logger.info("Fetching OData entity list", None);
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Unexpected(format!(
                "Failed to fetch entity list: {}",
                status
            )));
        }
        let document: ServiceDocument = response.json().await?;
        Ok(document
            .value
            .into_iter()
            .map(|entry| EntityRecord {
                display_name: entry.name,
                canonical_path: entry.url,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, path: &str) -> EntityRecord {
        EntityRecord {
            display_name: name.to_string(),
            canonical_path: path.to_string(),
        }
    }

    fn sample_index() -> EntityIndex {
        EntityIndex::build(vec![
            record("Customers V3", "CustomersV3"),
            record("Customer groups", "CustomerGroups"),
            record("Vendor groups", "VendorGroups"),
            record("Legal entities", "LegalEntities"),
        ])
    }

    #[test]
    fn exact_display_name_returns_canonical_path() {
        let index = sample_index();
        assert_eq!(index.lookup("Legal entities"), Some("LegalEntities"));
        assert_eq!(index.lookup("Customer groups"), Some("CustomerGroups"));
    }

    #[test]
    fn misspelled_name_still_resolves() {
        let index = sample_index();
        assert_eq!(index.lookup("vendr groups"), Some("VendorGroups"));
        assert_eq!(index.lookup("custmers"), Some("CustomersV3"));
    }

    #[test]
    fn distant_query_is_rejected() {
        let index = sample_index();
        assert_eq!(index.lookup("zzzzqqqq"), None);
        assert_eq!(index.lookup(""), None);
    }

    #[test]
    fn ties_break_on_canonical_path() {
        let index = EntityIndex::build(vec![
            record("Orders", "SalesOrdersB"),
            record("Orders", "SalesOrdersA"),
        ]);
        assert_eq!(index.lookup("orders"), Some("SalesOrdersA"));
    }

    #[test]
    fn duplicate_paths_keep_first_record() {
        let index = EntityIndex::build(vec![
            record("Customers", "CustomersV3"),
            record("Customers (legacy)", "CustomersV3"),
        ]);
        assert_eq!(index.len(), 1);
        let (best, score) = index.best_match("Customers").unwrap();
        assert_eq!(best.display_name, "Customers");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn repeated_lookups_are_stable() {
        let index = sample_index();
        let first = index.lookup("customer grp").map(str::to_string);
        for _ in 0..5 {
            assert_eq!(index.lookup("customer grp").map(str::to_string), first);
        }
    }
}
