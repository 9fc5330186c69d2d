//! PostgREST (Supabase data) operations for the per-user profile tables.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{SupabaseClient, SupabaseError};

impl SupabaseClient {
    /// Fetches the single row keyed by `user_id` from `table`.
    ///
    /// The singular `Accept` header makes PostgREST report zero rows as an
    /// error (`PGRST116`), which maps to `RowNotFound`.
    pub async fn fetch_row<T: DeserializeOwned>(
        &self,
        table: &str,
        user_id: &str,
    ) -> Result<T, SupabaseError> {
        let response = self
            .authed(self.http.get(self.rest_url(table)))
            .query(&[("user_id", format!("eq.{}", user_id)), ("limit", "1".to_string())])
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SupabaseError::Decode(format!("{} row: {}", table, e)))
    }

    /// Inserts or updates the row keyed by `user_id` in a single call.
    ///
    /// `on_conflict` plus merge-duplicates resolution makes the write
    /// atomic on the remote side; there is no read-then-write window.
    pub async fn upsert_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, SupabaseError> {
        let response = self
            .authed(self.http.post(self.rest_url(table)))
            .query(&[("on_conflict", "user_id")])
            .header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            )
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SupabaseError::Decode(format!("{} upsert: {}", table, e)))
    }
}
