use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub name: String,
}

/// One row of the petition search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionSummary {
    pub petition_id: i64,
    pub title: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: DateTime<Utc>,
    /// Cost of the cheapest support tier.
    pub supporting_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionDetail {
    pub petition_id: i64,
    pub title: String,
    pub category_id: i64,
    pub owner_id: i64,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub number_of_supporters: i64,
    pub creation_date: DateTime<Utc>,
    pub description: String,
    /// Sum of the tier cost over every pledge made to the petition.
    pub money_raised: i64,
    pub support_tiers: Vec<SupportTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTier {
    pub support_tier_id: i64,
    pub title: String,
    pub description: String,
    pub cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supporter {
    pub support_id: i64,
    pub support_tier_id: i64,
    pub message: Option<String>,
    pub supporter_id: i64,
    pub supporter_first_name: String,
    pub supporter_last_name: String,
    pub timestamp: DateTime<Utc>,
}
