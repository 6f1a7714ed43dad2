use crate::config::Settings;
use crate::constants::auth::{EXPIRY_BUFFER_SECS, GRANT_TYPE};
use crate::errors::GatewayError;
use crate::services::logger::Logger;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source of the current time, injectable so expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// `None` when `expires_in_secs` does not fit a timestamp.
    pub fn issue(
        access_token: String,
        issued_at: DateTime<Utc>,
        expires_in_secs: i64,
    ) -> Option<Self> {
        let lifetime = Duration::try_seconds(expires_in_secs.checked_sub(EXPIRY_BUFFER_SECS)?)?;
        Some(Self {
            access_token,
            expires_at: issued_at.checked_add_signed(lifetime)?,
        })
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Owns the bearer token for the ERP tenant and refreshes it on demand.
///
/// The cache lock is held across the identity call, so callers arriving
/// during a refresh wait for it and then reuse the fresh token.
pub struct CredentialManager {
    logger: Logger,
    settings: Arc<Settings>,
    client: Client,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<CachedToken>>,
}

impl CredentialManager {
    pub fn new(logger: Logger, settings: Arc<Settings>, client: Client) -> Self {
        Self::with_clock(logger, settings, client, Arc::new(SystemClock))
    }

    pub fn with_clock(
        logger: Logger,
        settings: Arc<Settings>,
        client: Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            logger: logger.child("auth"),
            settings,
            client,
            clock,
            cache: Mutex::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<String, GatewayError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref() {
            if token.is_valid_at(self.clock.now()) {
                self.logger.debug("Using cached auth token", None);
                return Ok(token.access_token.clone());
            }
        }

        self.logger
            .info("Auth token is missing or expired, fetching a new one", None);
        let fresh = self.fetch_token().await.map_err(|err| {
            self.logger.error(
                "Token fetch failed",
                Some(&serde_json::json!({ "error": err.to_string() })),
            );
            err
        })?;
        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    /// Drops the cached token so the next `get_token` refreshes.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Drops the cached token only if it is still `rejected`; a token that was
    /// already replaced by a concurrent refresh is kept.
    pub async fn invalidate_token(&self, rejected: &str) {
        let mut cache = self.cache.lock().await;
        if cache
            .as_ref()
            .map(|t| t.access_token == rejected)
            .unwrap_or(false)
        {
            self.logger.warn("Discarding rejected auth token", None);
            *cache = None;
        }
    }

    pub async fn cached_expiry(&self) -> Option<DateTime<Utc>> {
        self.cache.lock().await.as_ref().map(|t| t.expires_at)
    }

    async fn fetch_token(&self) -> Result<CachedToken, GatewayError> {
        let creds = self.settings.credentials()?;
        let token_url = self.settings.token_url(&creds.tenant_id);

        let form = [
            ("grant_type", GRANT_TYPE),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("resource", creds.resource_url.as_str()),
        ];
        let response = self
            .client
            .post(&token_url)
            .form(&form[..])
            .send()
            .await
            .map_err(GatewayError::auth_transport)?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Auth {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let payload: Value = serde_json::from_str(&text).map_err(|err| {
            GatewayError::Unexpected(format!("Token response is not valid JSON: {}", err))
        })?;
        let access_token = payload
            .get("access_token")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GatewayError::Unexpected("Token response missing access_token".into()))?
            .to_string();
        let expires_in = parse_expires_in(payload.get("expires_in")).ok_or_else(|| {
            GatewayError::Unexpected("Token response missing numeric expires_in".into())
        })?;

        let token = CachedToken::issue(access_token, self.clock.now(), expires_in).ok_or_else(
            || GatewayError::Unexpected("Token response has out-of-range expires_in".into()),
        )?;
        self.logger.info(
            "Fetched and cached new auth token",
            Some(&serde_json::json!({ "expires_at": token.expires_at.to_rfc3339() })),
        );
        Ok(token)
    }
}

/// Identity endpoints return `expires_in` as a number or a numeric string.
fn parse_expires_in(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expiry_applies_safety_buffer() {
        let issued = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let token = CachedToken::issue("T1".into(), issued, 3600).unwrap();
        assert_eq!(token.expires_at, issued + Duration::seconds(3540));
        assert!(token.is_valid_at(issued + Duration::seconds(3539)));
        assert!(!token.is_valid_at(issued + Duration::seconds(3540)));
    }

    #[test]
    fn short_lived_token_is_already_expired() {
        let issued = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let token = CachedToken::issue("T1".into(), issued, 30).unwrap();
        assert!(!token.is_valid_at(issued));
    }

    #[test]
    fn out_of_range_lifetime_is_rejected() {
        let issued = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert!(CachedToken::issue("T1".into(), issued, i64::MAX).is_none());
        assert!(CachedToken::issue("T1".into(), issued, i64::MIN).is_none());
        assert!(CachedToken::issue("T1".into(), issued, i64::MAX / 1000 - 1).is_none());
    }

    #[test]
    fn expires_in_accepts_number_and_string() {
        assert_eq!(parse_expires_in(Some(&serde_json::json!(3599))), Some(3599));
        assert_eq!(parse_expires_in(Some(&serde_json::json!("3599"))), Some(3599));
        assert_eq!(parse_expires_in(Some(&serde_json::json!(true))), None);
        assert_eq!(parse_expires_in(None), None);
    }
}
