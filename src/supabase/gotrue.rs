//! GoTrue (Supabase auth) operations: signup, password login, and the
//! admin user endpoints used for `/auth/me` and password changes.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{SupabaseClient, SupabaseError};

/// A user record as GoTrue returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl ProviderUser {
    /// The display name stored in user metadata at signup, if any.
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: ProviderUser,
}

impl SupabaseClient {
    /// Registers a new user with the identity provider, storing the
    /// display name in user metadata.
    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, SupabaseError> {
        let response = self
            .authed(self.http.post(self.auth_url("/signup")))
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        // GoTrue returns the user either at the top level or wrapped,
        // depending on whether email confirmation is enabled.
        let body: serde_json::Value = response.json().await?;
        let user_value = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user_value)
            .map_err(|e| SupabaseError::Decode(format!("signup response: {}", e)))
    }

    /// Exchanges credentials for the provider's session and returns the
    /// authenticated user. The provider session itself is discarded; the
    /// portal mints its own token.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, SupabaseError> {
        let response = self
            .authed(
                self.http
                    .post(self.auth_url("/token?grant_type=password")),
            )
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SupabaseError::Decode(format!("token response: {}", e)))?;
        Ok(token.user)
    }

    /// Fetches a user by id through the admin API.
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<ProviderUser, SupabaseError> {
        let response = self
            .authed(
                self.http
                    .get(self.auth_url(&format!("/admin/users/{}", user_id))),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SupabaseError::Decode(format!("admin user response: {}", e)))
    }

    /// Sets a new password for a user through the admin API.
    pub async fn update_user_password(
        &self,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), SupabaseError> {
        let response = self
            .authed(
                self.http
                    .put(self.auth_url(&format!("/admin/users/{}", user_id))),
            )
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_reads_metadata() {
        let user = ProviderUser {
            id: "u1".to_string(),
            email: Some("parent@example.com".to_string()),
            user_metadata: serde_json::json!({ "full_name": "Thandi Ngwenya" }),
        };
        assert_eq!(user.full_name(), Some("Thandi Ngwenya"));
    }

    #[test]
    fn full_name_ignores_missing_or_empty_metadata() {
        let user = ProviderUser {
            id: "u1".to_string(),
            email: None,
            user_metadata: serde_json::json!({}),
        };
        assert_eq!(user.full_name(), None);

        let user = ProviderUser {
            id: "u1".to_string(),
            email: None,
            user_metadata: serde_json::json!({ "full_name": "" }),
        };
        assert_eq!(user.full_name(), None);
    }
}
