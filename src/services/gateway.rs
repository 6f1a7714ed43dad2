use crate::constants::messages::NO_CONTENT;
use crate::constants::pagination::MAX_PAGE_SIZE;
use crate::errors::GatewayError;
use crate::odata::pagination::{opaque_link_hint, PaginationContinuation};
use crate::services::credentials::CredentialManager;
use crate::services::logger::Logger;
use crate::services::notifications::{notify, Notification, NotificationSink};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    fn as_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Normalized outcome of a gateway call, shaped like an MCP tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl GatewayResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: "text".to_string(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// All text blocks joined; convenient for callers that only render text.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Performs authenticated OData calls and turns every outcome into a
/// [`GatewayResult`]. Nothing escapes as an `Err`.
pub struct RequestGateway {
    logger: Logger,
    client: Client,
    credentials: Arc<CredentialManager>,
}

impl RequestGateway {
    pub fn new(logger: Logger, client: Client, credentials: Arc<CredentialManager>) -> Self {
        Self {
            logger: logger.child("gateway"),
            client,
            credentials,
        }
    }

    pub async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        sink: &dyn NotificationSink,
    ) -> GatewayResult {
        notify(
            sink,
            &self.logger,
            Notification::info(format!("Calling {} {}", method, url)),
        )
        .await;

        match self.try_execute(method, url, body, sink).await {
            Ok(result) => result,
            Err(err) => {
                let message = err.to_string();
                self.logger.error(
                    "Request failed",
                    Some(&serde_json::json!({
                        "method": method.to_string(),
                        "url": url,
                        "error": message,
                    })),
                );
                notify(
                    sink,
                    &self.logger,
                    Notification::error(format!("An unexpected error occurred: {}", message)),
                )
                .await;
                GatewayResult::error(format!("An unexpected error occurred: {}", message))
            }
        }
    }

    async fn try_execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, GatewayError> {
        let token = self.credentials.get_token().await?;
        let mut response = self.send(method, url, body, &token).await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            self.credentials.invalidate_token(&token).await;
            let fresh = self.credentials.get_token().await?;
            if fresh != token {
                self.logger.info(
                    "Retrying with refreshed token",
                    Some(&serde_json::json!({ "status": response.status().as_u16() })),
                );
                response = self.send(method, url, body, &fresh).await?;
            }
        }

        self.classify(response, sink).await
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<Response, GatewayError> {
        let mut request = self
            .client
            .request(method.as_reqwest(), url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, HeaderValue::from_static("application/json, text/xml"))
            .header("Prefer", format!("odata.maxpagesize={}", MAX_PAGE_SIZE));
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(serde_json::to_vec(body).map_err(|err| {
                    GatewayError::Unexpected(format!("Failed to encode request body: {}", err))
                })?);
        }
        Ok(request.send().await?)
    }

    async fn classify(
        &self,
        response: Response,
        sink: &dyn NotificationSink,
    ) -> Result<GatewayResult, GatewayError> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(GatewayResult::text(NO_CONTENT));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let text = response.text().await?;

        if !status.is_success() {
            notify(
                sink,
                &self.logger,
                Notification::error(format!(
                    "API call failed with status {}: {}",
                    status.as_u16(),
                    text
                )),
            )
            .await;
            let rendered = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|json| serde_json::to_string_pretty(&json).ok())
                .unwrap_or(text);
            return Ok(GatewayResult::error(format!(
                "API Error: {}\n{}",
                status.as_u16(),
                rendered
            )));
        }

        if content_type.contains("text/plain") || content_type.contains("application/xml") {
            return Ok(GatewayResult::text(text));
        }

        let json: Value = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(_) => return Ok(GatewayResult::text(text)),
        };
        let mut rendered = serde_json::to_string_pretty(&json).unwrap_or(text);

        if let Some(link) = PaginationContinuation::next_link(&json) {
            match PaginationContinuation::from_next_link(link) {
                Some(continuation) => {
                    rendered.push_str(&continuation.hint());
                    notify(
                        sink,
                        &self.logger,
                        Notification::info(continuation.notification()),
                    )
                    .await;
                }
                None => {
                    self.logger.warn(
                        "Next link carries no skip offset",
                        Some(&serde_json::json!({ "next_link": link })),
                    );
                    rendered.push_str(&opaque_link_hint(link));
                }
            }
        }

        Ok(GatewayResult::text(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_serializes_as_tool_result() {
        let value = serde_json::to_value(GatewayResult::error("API Error: 400")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "content": [ { "type": "text", "text": "API Error: 400" } ],
                "isError": true
            })
        );
    }

    #[test]
    fn methods_render_uppercase() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Get.as_reqwest(), Method::GET);
    }
}
