use crate::constants::{auth, entities, network, pagination};
use crate::errors::GatewayError;

/// Connection settings read from the process environment.
///
/// Credentials stay optional here; absence is reported by
/// [`Settings::credentials`] on the first token fetch rather than at startup.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub resource_url: Option<String>,
    pub authority_host: String,
    pub request_timeout_ms: u64,
    pub default_top: u64,
}

/// The four values the client-credentials grant needs, all present.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub resource_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            tenant_id: read("TENANT_ID"),
            client_id: read("CLIENT_ID"),
            client_secret: read("CLIENT_SECRET"),
            resource_url: read("DYNAMICS_RESOURCE_URL").map(|v| trim_base_url(&v)),
            authority_host: read("AUTHORITY_HOST")
                .map(|v| trim_base_url(&v))
                .unwrap_or_else(|| auth::DEFAULT_AUTHORITY_HOST.to_string()),
            request_timeout_ms: read("D365_REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(network::TIMEOUT_API_REQUEST_MS),
            default_top: read("D365_DEFAULT_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(pagination::DEFAULT_TOP),
        }
    }

    pub fn credentials(&self) -> Result<Credentials, GatewayError> {
        let mut missing = Vec::new();
        if self.tenant_id.is_none() {
            missing.push("TENANT_ID");
        }
        if self.client_id.is_none() {
            missing.push("CLIENT_ID");
        }
        if self.client_secret.is_none() {
            missing.push("CLIENT_SECRET");
        }
        if self.resource_url.is_none() {
            missing.push("DYNAMICS_RESOURCE_URL");
        }
        if !missing.is_empty() {
            return Err(GatewayError::Configuration { missing });
        }
        Ok(Credentials {
            tenant_id: self.tenant_id.clone().unwrap_or_default(),
            client_id: self.client_id.clone().unwrap_or_default(),
            client_secret: self.client_secret.clone().unwrap_or_default(),
            resource_url: self.resource_url.clone().unwrap_or_default(),
        })
    }

    /// `<authority>/<tenant>/oauth2/token`
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/token", self.authority_host, tenant_id)
    }

    /// Base for collection URLs, `<resource>/data`.
    pub fn data_url(&self) -> Result<String, GatewayError> {
        let resource = self
            .resource_url
            .as_deref()
            .ok_or(GatewayError::Configuration {
                missing: vec!["DYNAMICS_RESOURCE_URL"],
            })?;
        Ok(format!("{}/{}", resource, entities::METADATA_PATH))
    }
}

fn trim_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_values_are_reported_together() {
        let s = settings(&[("TENANT_ID", "t"), ("CLIENT_SECRET", "  ")]);
        match s.credentials() {
            Err(GatewayError::Configuration { missing }) => {
                assert_eq!(
                    missing,
                    vec!["CLIENT_ID", "CLIENT_SECRET", "DYNAMICS_RESOURCE_URL"]
                );
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn urls_are_normalized_and_defaults_applied() {
        let s = settings(&[
            ("TENANT_ID", "contoso"),
            ("CLIENT_ID", "id"),
            ("CLIENT_SECRET", "secret"),
            ("DYNAMICS_RESOURCE_URL", "https://erp.example.com/"),
        ]);
        assert!(s.credentials().is_ok());
        assert_eq!(
            s.token_url("contoso"),
            "https://login.microsoftonline.com/contoso/oauth2/token"
        );
        assert_eq!(s.data_url().unwrap(), "https://erp.example.com/data");
        assert_eq!(s.request_timeout_ms, 30_000);
        assert_eq!(s.default_top, 5);
    }

    #[test]
    fn invalid_numeric_overrides_fall_back() {
        let s = settings(&[
            ("D365_REQUEST_TIMEOUT_MS", "soon"),
            ("D365_DEFAULT_PAGE_SIZE", "0"),
        ]);
        assert_eq!(s.request_timeout_ms, 30_000);
        assert_eq!(s.default_top, 5);
    }
}
