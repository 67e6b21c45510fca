//! Database row types. These map directly to SQLite rows and are converted
//! into the petitions-types API models at the edge.

use chrono::{DateTime, Utc};
use tracing::warn;

use petitions_types::api::SortBy;
use petitions_types::models::{Category, PetitionDetail, PetitionSummary, SupportTier, Supporter};

use crate::parse_timestamp;

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub image_filename: Option<String>,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
}

pub struct PetitionRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub creation_date: String,
    pub image_filename: Option<String>,
}

pub struct PetitionSummaryRow {
    pub id: i64,
    pub title: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: String,
    pub supporting_cost: i64,
}

/// Summary columns plus the fields only the single-petition view returns.
pub struct PetitionDetailRow {
    pub summary: PetitionSummaryRow,
    pub description: String,
    pub money_raised: i64,
}

pub struct SupportTierRow {
    pub id: i64,
    pub petition_id: i64,
    pub title: String,
    pub description: String,
    pub cost: i64,
}

pub struct SupporterRow {
    pub id: i64,
    pub support_tier_id: i64,
    pub message: Option<String>,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub timestamp: String,
}

/// Partial user update; `None` fields are left as stored.
#[derive(Default)]
pub struct UserChanges<'a> {
    pub email: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

pub struct NewPetition<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category_id: i64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

pub struct NewSupportTier<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub cost: i64,
}

/// Filters for the petition search. Every `Some`/non-empty field narrows the
/// result set.
#[derive(Default)]
pub struct PetitionFilter<'a> {
    pub q: Option<&'a str>,
    pub category_ids: &'a [i64],
    pub max_supporting_cost: Option<i64>,
    pub owner_id: Option<i64>,
    pub supporter_id: Option<i64>,
    pub sort_by: SortBy,
}

fn timestamp_or_default(raw: &str, what: &str, id: i64) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt timestamp '{}' on {} {}", raw, what, id);
        DateTime::default()
    })
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            category_id: row.id,
            name: row.name,
        }
    }
}

impl From<PetitionSummaryRow> for PetitionSummary {
    fn from(row: PetitionSummaryRow) -> Self {
        Self {
            creation_date: timestamp_or_default(&row.creation_date, "petition", row.id),
            petition_id: row.id,
            title: row.title,
            category_id: row.category_id,
            owner_id: row.owner_id,
            owner_first_name: row.owner_first_name,
            owner_last_name: row.owner_last_name,
            number_of_supporters: row.number_of_supporters,
            supporting_cost: row.supporting_cost,
        }
    }
}

impl From<SupportTierRow> for SupportTier {
    fn from(row: SupportTierRow) -> Self {
        Self {
            support_tier_id: row.id,
            title: row.title,
            description: row.description,
            cost: row.cost,
        }
    }
}

impl From<SupporterRow> for Supporter {
    fn from(row: SupporterRow) -> Self {
        Self {
            timestamp: timestamp_or_default(&row.timestamp, "supporter", row.id),
            support_id: row.id,
            support_tier_id: row.support_tier_id,
            message: row.message,
            supporter_id: row.user_id,
            supporter_first_name: row.first_name,
            supporter_last_name: row.last_name,
        }
    }
}

impl PetitionDetailRow {
    pub fn into_detail(self, support_tiers: Vec<SupportTier>) -> PetitionDetail {
        let summary = PetitionSummary::from(self.summary);
        PetitionDetail {
            petition_id: summary.petition_id,
            title: summary.title,
            category_id: summary.category_id,
            owner_id: summary.owner_id,
            owner_first_name: summary.owner_first_name,
            owner_last_name: summary.owner_last_name,
            number_of_supporters: summary.number_of_supporters,
            creation_date: summary.creation_date,
            description: self.description,
            money_raised: self.money_raised,
            support_tiers,
        }
    }
}
