use thiserror::Error;

/// Failures raised by the credential manager and entity resolver.
///
/// The request gateway never returns these; it folds them into an error
/// `GatewayResult` so the tool layer has a single shape to render.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing required configuration: {}", missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    #[error("Failed to fetch auth token: {}", describe_auth(*status, body))]
    Auth { status: Option<u16>, body: String },

    #[error("{0}")]
    Unexpected(String),
}

fn describe_auth(status: Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("{} {}", code, body).trim_end().to_string(),
        None => body.to_string(),
    }
}

impl GatewayError {
    pub fn auth_transport(err: reqwest::Error) -> Self {
        GatewayError::Auth {
            status: None,
            body: err.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, GatewayError::Configuration { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Unexpected(err.to_string())
    }
}
