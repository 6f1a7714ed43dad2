#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use d365_gateway::app::build_http_client;
use d365_gateway::config::Settings;
use d365_gateway::services::credentials::{Clock, CredentialManager};
use d365_gateway::services::logger::Logger;
use d365_gateway::services::notifications::Notification;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "contoso-tenant";
pub const TOKEN_PATH: &str = "/contoso-tenant/oauth2/token";

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()),
        })
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Settings pointing both the identity and the ERP endpoints at `server`.
pub fn settings_for(server: &MockServer) -> Settings {
    settings_with(server, &[])
}

/// Like [`settings_for`], with some variables removed or overridden.
pub fn settings_with(server: &MockServer, overrides: &[(&str, Option<&str>)]) -> Settings {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("TENANT_ID".to_string(), TENANT.to_string()),
        ("CLIENT_ID".to_string(), "client-123".to_string()),
        ("CLIENT_SECRET".to_string(), "s3cret".to_string()),
        ("DYNAMICS_RESOURCE_URL".to_string(), server.uri()),
        ("AUTHORITY_HOST".to_string(), server.uri()),
    ]);
    for (key, value) in overrides {
        match value {
            Some(v) => {
                vars.insert(key.to_string(), v.to_string());
            }
            None => {
                vars.remove(*key);
            }
        }
    }
    Settings::from_lookup(|key| vars.get(key).cloned())
}

pub fn credential_manager(settings: Settings, clock: Arc<ManualClock>) -> Arc<CredentialManager> {
    let client = build_http_client(&settings).expect("http client");
    Arc::new(CredentialManager::with_clock(
        Logger::silent(),
        Arc::new(settings),
        client,
        clock,
    ))
}

pub fn token_response(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token_type": "Bearer",
        "expires_in": expires_in.to_string(),
        "access_token": token,
    }))
}

/// Identity endpoint that always issues `token`, valid for an hour.
pub async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(token, 3600))
        .mount(server)
        .await;
}

pub fn service_document() -> serde_json::Value {
    json!({
        "@odata.context": "https://erp.example.com/data/$metadata",
        "value": [
            { "name": "CustomersV3", "kind": "EntitySet", "url": "CustomersV3" },
            { "name": "Customer groups", "kind": "EntitySet", "url": "CustomerGroups" },
            { "name": "Vendor groups", "kind": "EntitySet", "url": "VendorGroups" },
            { "name": "Legal entities", "kind": "EntitySet", "url": "LegalEntities" }
        ]
    })
}

pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(note) = rx.try_recv() {
        out.push(note);
    }
    out
}
