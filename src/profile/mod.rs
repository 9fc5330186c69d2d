//! Parent profile domain: the two remote table rows and the merge that
//! produces a single profile from them.
//!
//! A parent's data is denormalized across `parents` and
//! `fee_responsibility`. Field precedence when merging is
//! fee_responsibility, then parents, then identity-provider metadata;
//! the first non-empty value wins.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::supabase::{ProviderUser, SupabaseError};

/// Row shape of the `parents` table. Everything is nullable remotely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParentRow {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub mobile: Option<String>,
    pub relationship: Option<String>,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Row shape of the `fee_responsibility` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeResponsibilityRow {
    pub user_id: Option<String>,
    pub parent_first_name: Option<String>,
    pub parent_surname: Option<String>,
    pub parent_email: Option<String>,
    pub parent_mobile: Option<String>,
    pub parent_id_number: Option<String>,
    pub fee_person: Option<String>,
    pub selected_plan: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub branch_code: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// The merged profile returned by `GET /profile/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub relationship: String,
    pub id_number: String,
    pub fee_person: String,
    pub selected_plan: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_type: String,
    pub branch_code: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fields accepted by `PUT /profile/me`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Upsert payload for the `parents` table.
#[derive(Debug, Clone, Serialize)]
pub struct ParentUpsert {
    pub user_id: String,
    pub first_name: String,
    pub surname: String,
    pub mobile: String,
    pub relationship: String,
    pub email: String,
    pub updated_at: String,
}

impl ParentUpsert {
    pub fn from_update(user_id: &str, update: &ProfileUpdate) -> Self {
        let (first_name, surname) = split_full_name(&update.full_name);
        Self {
            user_id: user_id.to_string(),
            first_name,
            surname,
            mobile: update.phone.clone(),
            relationship: "Parent".to_string(),
            email: update.email.clone(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Splits a display name into first name and the remainder as surname.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// Failure rule for the two table reads: if both failed the first error
/// propagates, missing rows included, so a user with no rows is an error
/// rather than an empty profile. A single failed read contributes
/// nothing and the merge proceeds.
pub fn combine_reads<T, U>(
    parent: Result<T, SupabaseError>,
    fee: Result<U, SupabaseError>,
) -> Result<(Option<T>, Option<U>), SupabaseError> {
    match (parent, fee) {
        (Err(parent_err), Err(_)) => Err(parent_err),
        (parent, fee) => Ok((parent.ok(), fee.ok())),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn pick<'a>(candidates: [Option<&'a str>; 3]) -> &'a str {
    candidates.into_iter().flatten().next().unwrap_or("")
}

/// Joins a first name and surname when both are present; a partial name
/// does not win over a lower-precedence complete one.
fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
        _ => None,
    }
}

/// Merges the two table rows and the identity-provider record into one
/// profile. Missing rows contribute nothing; precedence is
/// fee_responsibility, parents, then provider metadata.
pub fn merge_profile(
    user_id: &str,
    fee: Option<&FeeResponsibilityRow>,
    parent: Option<&ParentRow>,
    provider: Option<&ProviderUser>,
) -> ParentProfile {
    let fee_name = fee.and_then(|f| {
        join_name(
            non_empty(&f.parent_first_name),
            non_empty(&f.parent_surname),
        )
    });
    let parent_name = parent.and_then(|p| join_name(non_empty(&p.first_name), non_empty(&p.surname)));
    let provider_name = provider.and_then(|u| u.full_name()).map(|s| s.to_string());

    let full_name = fee_name
        .or(parent_name)
        .or(provider_name)
        .unwrap_or_else(|| "User".to_string());

    let provider_email = provider.and_then(|u| u.email.as_deref()).unwrap_or("");

    ParentProfile {
        id: user_id.to_string(),
        email: pick([
            fee.and_then(|f| non_empty(&f.parent_email)),
            Some(provider_email).filter(|s| !s.is_empty()),
            None,
        ])
        .to_string(),
        full_name,
        phone: pick([
            fee.and_then(|f| non_empty(&f.parent_mobile)),
            parent.and_then(|p| non_empty(&p.mobile)),
            None,
        ])
        .to_string(),
        relationship: parent
            .and_then(|p| non_empty(&p.relationship))
            .unwrap_or("Parent")
            .to_string(),
        id_number: pick([
            fee.and_then(|f| non_empty(&f.parent_id_number)),
            parent.and_then(|p| non_empty(&p.id_number)),
            None,
        ])
        .to_string(),
        fee_person: fee
            .and_then(|f| non_empty(&f.fee_person))
            .unwrap_or("")
            .to_string(),
        selected_plan: fee
            .and_then(|f| non_empty(&f.selected_plan))
            .unwrap_or("")
            .to_string(),
        bank_name: fee
            .and_then(|f| non_empty(&f.bank_name))
            .unwrap_or("")
            .to_string(),
        account_number: fee
            .and_then(|f| non_empty(&f.account_number))
            .unwrap_or("")
            .to_string(),
        account_type: fee
            .and_then(|f| non_empty(&f.account_type))
            .unwrap_or("")
            .to_string(),
        branch_code: fee
            .and_then(|f| non_empty(&f.branch_code))
            .unwrap_or("")
            .to_string(),
        created_at: parent
            .and_then(|p| p.created_at.clone())
            .or_else(|| fee.and_then(|f| f.created_at.clone())),
        updated_at: parent
            .and_then(|p| p.updated_at.clone())
            .or_else(|| fee.and_then(|f| f.updated_at.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_user(email: &str, full_name: &str) -> ProviderUser {
        ProviderUser {
            id: "user-1".to_string(),
            email: Some(email.to_string()),
            user_metadata: serde_json::json!({ "full_name": full_name }),
        }
    }

    #[test]
    fn fee_responsibility_name_beats_parents_name() {
        let fee = FeeResponsibilityRow {
            parent_first_name: Some("Naledi".to_string()),
            parent_surname: Some("Dlamini".to_string()),
            ..Default::default()
        };
        let parent = ParentRow {
            first_name: Some("Ronald".to_string()),
            surname: Some("Rikhotso".to_string()),
            ..Default::default()
        };

        let profile = merge_profile("user-1", Some(&fee), Some(&parent), None);
        assert_eq!(profile.full_name, "Naledi Dlamini");
    }

    #[test]
    fn parents_fields_fill_fee_responsibility_gaps() {
        let fee = FeeResponsibilityRow {
            bank_name: Some("African Bank".to_string()),
            ..Default::default()
        };
        let parent = ParentRow {
            first_name: Some("Ronald".to_string()),
            surname: Some("Rikhotso".to_string()),
            mobile: Some("0647939043".to_string()),
            id_number: Some("8001015009087".to_string()),
            ..Default::default()
        };

        let profile = merge_profile("user-1", Some(&fee), Some(&parent), None);
        assert_eq!(profile.full_name, "Ronald Rikhotso");
        assert_eq!(profile.phone, "0647939043");
        assert_eq!(profile.id_number, "8001015009087");
        assert_eq!(profile.bank_name, "African Bank");
    }

    #[test]
    fn provider_metadata_is_last_resort() {
        let user = provider_user("parent@example.com", "Thandi Ngwenya");
        let profile = merge_profile("user-1", None, None, Some(&user));
        assert_eq!(profile.full_name, "Thandi Ngwenya");
        assert_eq!(profile.email, "parent@example.com");
    }

    #[test]
    fn blank_strings_do_not_win_over_lower_precedence_values() {
        let fee = FeeResponsibilityRow {
            parent_mobile: Some("   ".to_string()),
            ..Default::default()
        };
        let parent = ParentRow {
            mobile: Some("0821234567".to_string()),
            ..Default::default()
        };

        let profile = merge_profile("user-1", Some(&fee), Some(&parent), None);
        assert_eq!(profile.phone, "0821234567");
    }

    #[test]
    fn partial_fee_name_falls_through_to_parents() {
        let fee = FeeResponsibilityRow {
            parent_first_name: Some("Naledi".to_string()),
            ..Default::default()
        };
        let parent = ParentRow {
            first_name: Some("Ronald".to_string()),
            surname: Some("Rikhotso".to_string()),
            ..Default::default()
        };

        let profile = merge_profile("user-1", Some(&fee), Some(&parent), None);
        assert_eq!(profile.full_name, "Ronald Rikhotso");
    }

    #[test]
    fn both_reads_failing_propagates_the_first_error() {
        let result = combine_reads::<ParentRow, FeeResponsibilityRow>(
            Err(SupabaseError::RowNotFound),
            Err(SupabaseError::RowNotFound),
        );
        assert!(matches!(result, Err(SupabaseError::RowNotFound)));

        let result = combine_reads::<ParentRow, FeeResponsibilityRow>(
            Err(SupabaseError::Decode("bad row".to_string())),
            Err(SupabaseError::RowNotFound),
        );
        assert!(matches!(result, Err(SupabaseError::Decode(_))));
    }

    #[test]
    fn one_failed_read_still_merges() {
        let parent = ParentRow {
            first_name: Some("Ronald".to_string()),
            surname: Some("Rikhotso".to_string()),
            ..Default::default()
        };
        let (parent, fee) = combine_reads::<ParentRow, FeeResponsibilityRow>(
            Ok(parent),
            Err(SupabaseError::RowNotFound),
        )
        .unwrap();
        assert!(fee.is_none());

        let profile = merge_profile("user-1", fee.as_ref(), parent.as_ref(), None);
        assert_eq!(profile.full_name, "Ronald Rikhotso");
    }

    #[test]
    fn split_full_name_keeps_compound_surnames() {
        assert_eq!(
            split_full_name("Anna van der Merwe"),
            ("Anna".to_string(), "van der Merwe".to_string())
        );
        assert_eq!(split_full_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn upsert_payload_splits_name_and_stamps_update_time() {
        let update = ProfileUpdate {
            full_name: "Ronald Rikhotso".to_string(),
            email: "ronald@example.com".to_string(),
            phone: "0647939043".to_string(),
            location: None,
        };
        let payload = ParentUpsert::from_update("user-1", &update);
        assert_eq!(payload.first_name, "Ronald");
        assert_eq!(payload.surname, "Rikhotso");
        assert_eq!(payload.relationship, "Parent");
        assert!(!payload.updated_at.is_empty());
    }
}
