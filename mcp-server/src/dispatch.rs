//! Tool dispatcher: one tool call in, at most one API request out, one text result back.

use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::client::{ApiResponse, ClientError, VeridictumClient};
use crate::config::{ServerConfig, WEBSITE_URL};
use crate::credentials::CredentialResolver;
use crate::tools::{required_str, tool_descriptors, ToolDescriptor, ToolKind};

/// Text returned to the host for a single tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub fn not_configured_message() -> String {
    format!(
        "⚠️ Veridictum API key not configured.\n\n\
         To get started, you need a free API key:\n\n\
         1. Go to {WEBSITE_URL} and create an account\n\
         2. Go to your Dashboard → API Keys → Generate New Key\n\
         3. Copy your API key\n\
         4. Run the setup command: tell Claude to use the setup_api_key tool \
         with your key, or set the VERIDICTUM_API_KEY environment variable\n\n\
         Free tier available for law students. \
         Professional plans start at $49/month.\n\n\
         Your API key is stored securely on your local machine only."
    )
}

pub fn invalid_key_message() -> String {
    format!(
        "❌ Invalid API key: the key is invalid or expired.\n\n\
         Please get a new key at {WEBSITE_URL}/dashboard\n\
         Then run the setup_api_key tool to update it."
    )
}

pub fn plan_upgrade_message() -> String {
    format!(
        "❌ Your subscription does not include this feature.\n\n\
         Upgrade your plan at {WEBSITE_URL}/pricing\n  \
         - Student: Free (with .edu email)\n  \
         - Professional: $49/month\n  \
         - Firm: $199/month (up to 5 users)"
    )
}

pub fn rate_limit_message() -> String {
    format!(
        "⏳ Rate limit reached. Please wait a moment and try again.\n\n\
         Need higher limits? Upgrade at {WEBSITE_URL}/pricing"
    )
}

pub fn connection_message() -> String {
    format!(
        "❌ Could not connect to Veridictum servers.\n\n\
         Please check your internet connection and try again.\n\
         If the issue persists, check {WEBSITE_URL} for status updates."
    )
}

fn setup_rejected_message() -> String {
    format!(
        "❌ Invalid API key. Please check your key and try again.\n\n\
         You can find your API key at: {WEBSITE_URL}/dashboard"
    )
}

fn setup_saved_message(path: &std::path::Path) -> String {
    format!(
        "✅ API key saved successfully!\n\n\
         Your key is stored securely at: {}\n\
         This file is readable only by your user account.\n\n\
         You're all set! Try verifying a citation:\n  \
         \"Verify 384 U.S. 436\"\n\n\
         Or search for cases:\n  \
         \"Search for cases about qualified immunity\"",
        path.display()
    )
}

pub struct ToolDispatcher {
    config: ServerConfig,
    credentials: CredentialResolver,
}

impl ToolDispatcher {
    pub fn new(config: ServerConfig) -> Self {
        let credentials = CredentialResolver::new(&config);
        Self { config, credentials }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        tool_descriptors(self.config.setup_enabled())
    }

    /// Never fails: every outcome, including transport errors, becomes a [`ToolResult`].
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let kind = match ToolKind::from_name(name) {
            Some(kind) if !kind.is_setup() || self.config.setup_enabled() => kind,
            _ => {
                tracing::warn!("[CALL TOOL] Unknown tool: {}", name);
                return ToolResult::error(format!("Unknown tool: {name}"));
            }
        };

        let args = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return ToolResult::error(format!(
                    "Invalid arguments for {name}: arguments must be an object"
                ))
            }
        };

        tracing::info!("[CALL TOOL] {}", name);

        if kind.is_setup() {
            return self.setup_api_key(&args).await;
        }

        let Some(api_key) = self.credentials.resolve() else {
            tracing::info!("[CALL TOOL] No API key configured, skipping request");
            return ToolResult::error(not_configured_message());
        };

        let request = match kind.request(&args) {
            Ok(Some(request)) => request,
            Ok(None) => return ToolResult::error(format!("Unknown tool: {name}")),
            Err(e) => return ToolResult::error(format!("Invalid arguments for {name}: {e}")),
        };

        let client = match VeridictumClient::new(&self.config.api_url, self.config.request_timeout) {
            Ok(client) => client,
            Err(e) => return ToolResult::error(format!("Error: {e}")),
        };

        match client.send(&request, &api_key).await {
            Ok(response) => translate_response(response),
            Err(ClientError::Connect { url, source }) => {
                tracing::warn!("[CALL TOOL] Connection to {} failed: {}", url, source);
                ToolResult::error(connection_message())
            }
            Err(e) => {
                tracing::warn!("[CALL TOOL] {} failed: {}", name, e);
                ToolResult::error(format!("Error: {e}"))
            }
        }
    }

    async fn setup_api_key(&self, args: &Map<String, Value>) -> ToolResult {
        let api_key = required_str(args, "api_key").unwrap_or_default().trim();
        if api_key.is_empty() {
            return ToolResult::error(
                "❌ No API key provided. Please provide your Veridictum API key.",
            );
        }

        // Best effort: only an explicit 401 blocks saving.
        match VeridictumClient::new(&self.config.api_url, self.config.setup_timeout) {
            Ok(client) => match client.health(api_key).await {
                Ok(StatusCode::UNAUTHORIZED) => {
                    tracing::info!("[SETUP] Health check rejected the key");
                    return ToolResult::error(setup_rejected_message());
                }
                Ok(status) => tracing::info!("[SETUP] Health check returned {}", status),
                Err(e) => tracing::warn!("[SETUP] Health check failed, saving anyway: {}", e),
            },
            Err(e) => tracing::warn!("[SETUP] Could not build client, saving anyway: {}", e),
        }

        match self.credentials.save(api_key, &self.config.api_url) {
            Ok(path) => ToolResult::ok(setup_saved_message(&path)),
            Err(e) => {
                tracing::error!("[SETUP] Failed to save API key: {}", e);
                ToolResult::error(format!("❌ Failed to save API key: {e}"))
            }
        }
    }
}

/// Map an HTTP outcome onto the fixed message set.
pub fn translate_response(response: ApiResponse) -> ToolResult {
    match response.status {
        StatusCode::UNAUTHORIZED => ToolResult::error(invalid_key_message()),
        StatusCode::FORBIDDEN => ToolResult::error(plan_upgrade_message()),
        StatusCode::TOO_MANY_REQUESTS => ToolResult::error(rate_limit_message()),
        status if !status.is_success() => ToolResult::error(format!(
            "API Error {}: {}",
            status.as_u16(),
            response.body
        )),
        _ => match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => ToolResult::ok(text),
                Err(e) => ToolResult::error(format!("Error: {e}")),
            },
            Err(e) => ToolResult::error(format!("Error: {e}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn auth_statuses_ignore_body() {
        for body in ["", "{\"detail\":\"nope\"}", "<html>"] {
            assert_eq!(translate_response(response(401, body)).text, invalid_key_message());
            assert_eq!(translate_response(response(403, body)).text, plan_upgrade_message());
            assert_eq!(translate_response(response(429, body)).text, rate_limit_message());
        }
    }

    #[test]
    fn other_failures_pass_status_and_body() {
        let result = translate_response(response(500, "internal error"));
        assert!(result.is_error);
        assert_eq!(result.text, "API Error 500: internal error");
    }

    #[test]
    fn success_is_pretty_json() {
        let result = translate_response(response(200, r#"{"status":"verified"}"#));
        assert!(!result.is_error);
        assert_eq!(result.text, "{\n  \"status\": \"verified\"\n}");
    }

    #[test]
    fn success_keeps_key_order_and_large_numbers() {
        let body = r#"{"status":"verified","case":"Miranda v. Arizona","id":123456789012345678901234567890}"#;
        let result = translate_response(response(200, body));
        assert_eq!(
            result.text,
            "{\n  \"status\": \"verified\",\n  \"case\": \"Miranda v. Arizona\",\n  \"id\": 123456789012345678901234567890\n}"
        );
    }

    #[test]
    fn success_with_non_json_body_is_generic_error() {
        let result = translate_response(response(200, "OK"));
        assert!(result.is_error);
        assert!(result.text.starts_with("Error: "));
    }

    #[test]
    fn invalid_key_message_names_the_problem() {
        assert!(invalid_key_message().contains("Invalid API key"));
    }
}
