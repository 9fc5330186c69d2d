//! Client for the hosted Supabase project.
//!
//! Two surfaces are wrapped: the GoTrue auth API (`/auth/v1`) and the
//! PostgREST data API (`/rest/v1`). All requests authenticate with the
//! service-role key and share a single configured timeout.

mod gotrue;
mod postgrest;

pub use gotrue::ProviderUser;

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::SupabaseConfig;

/// PostgREST error code for "zero rows returned when one was requested".
const PGRST_NO_ROWS: &str = "PGRST116";

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    /// The requested row (or user) does not exist.
    #[error("Row not found")]
    RowNotFound,

    /// The provider rejected the request; `message` is the provider's own.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Request to Supabase failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from Supabase: {0}")]
    Decode(String),
}

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Every request carries the service key both as the project `apikey`
    /// and as the bearer identity.
    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    /// Turns a non-success response into a `SupabaseError`, extracting the
    /// provider's message from whichever field this surface uses.
    async fn error_from_response(response: reqwest::Response) -> SupabaseError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            // PostgREST reports missing rows as an error code, not a 404.
            if value.get("code").and_then(|c| c.as_str()) == Some(PGRST_NO_ROWS) {
                return SupabaseError::RowNotFound;
            }

            let message = value
                .get("error_description")
                .or_else(|| value.get("msg"))
                .or_else(|| value.get("message"))
                .or_else(|| value.get("error"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string());

            if let Some(message) = message {
                if status == StatusCode::NOT_FOUND {
                    return SupabaseError::RowNotFound;
                }
                return SupabaseError::Provider {
                    status: status.as_u16(),
                    message,
                };
            }
        }

        if status == StatusCode::NOT_FOUND {
            return SupabaseError::RowNotFound;
        }

        SupabaseError::Provider {
            status: status.as_u16(),
            message: format!("Supabase request failed with status {}", status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;

    fn test_client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: "https://example.supabase.co/".to_string(),
            service_key: "service-key".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let client = test_client();
        assert_eq!(
            client.auth_url("/token?grant_type=password"),
            "https://example.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            client.rest_url("parents"),
            "https://example.supabase.co/rest/v1/parents"
        );
    }
}
