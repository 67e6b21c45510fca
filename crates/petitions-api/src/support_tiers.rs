use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use petitions_db::models::{NewSupportTier, PetitionRow, SupportTierRow};
use petitions_types::api::{
    CreateSupportTierResponse, EditSupportTierRequest, MAX_SUPPORT_TIERS, SupportTierRequest,
};

use crate::AppState;
use crate::auth::{AuthUser, require_owner};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;

fn owned_petition(state: &AppState, petition_id: i64, auth: &AuthUser) -> ApiResult<PetitionRow> {
    let petition = state
        .db
        .get_petition(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    require_owner(auth, petition.owner_id, "Only the owner of a petition may change its support tiers")?;
    Ok(petition)
}

fn title_clashes(tiers: &[SupportTierRow], title: &str, excluding: Option<i64>) -> bool {
    tiers
        .iter()
        .any(|t| Some(t.id) != excluding && t.title == title)
}

/// Tiers are frozen once anyone has pledged at them.
fn ensure_unsupported(state: &AppState, tier_id: i64, action: &str) -> ApiResult<()> {
    if state.db.count_tier_supporters(tier_id)? > 0 {
        debug!("Refused to {} tier {}: it has supporters", action, tier_id);
        return Err(ApiError::forbidden(format!(
            "Cannot {action} a support tier that has supporters"
        )));
    }
    Ok(())
}

/// PUT /petitions/{id}/supportTiers
pub async fn add(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
    auth: AuthUser,
    ValidJson(req): ValidJson<SupportTierRequest>,
) -> ApiResult<impl IntoResponse> {
    owned_petition(&state, petition_id, &auth)?;

    let tiers = state.db.list_support_tiers(petition_id)?;
    if tiers.len() >= MAX_SUPPORT_TIERS {
        return Err(ApiError::forbidden(format!(
            "A petition can have at most {MAX_SUPPORT_TIERS} support tiers"
        )));
    }
    if title_clashes(&tiers, &req.title, None) {
        return Err(ApiError::forbidden("Support tier title must be unique within the petition"));
    }

    let support_tier_id = state.db.create_support_tier(
        petition_id,
        &NewSupportTier {
            title: &req.title,
            description: &req.description,
            cost: req.cost,
        },
    )?;

    info!("Added support tier {} to petition {}", support_tier_id, petition_id);
    Ok((StatusCode::CREATED, Json(CreateSupportTierResponse { support_tier_id })))
}

/// PATCH /petitions/{id}/supportTiers/{tier_id}
pub async fn edit(
    State(state): State<AppState>,
    Path((petition_id, tier_id)): Path<(i64, i64)>,
    auth: AuthUser,
    ValidJson(req): ValidJson<EditSupportTierRequest>,
) -> ApiResult<StatusCode> {
    owned_petition(&state, petition_id, &auth)?;

    let tiers = state.db.list_support_tiers(petition_id)?;
    let tier = tiers
        .iter()
        .find(|t| t.id == tier_id)
        .ok_or_else(|| ApiError::not_found("No support tier with that id on this petition"))?;
    ensure_unsupported(&state, tier_id, "edit")?;

    if let Some(title) = &req.title {
        if title_clashes(&tiers, title, Some(tier_id)) {
            return Err(ApiError::forbidden("Support tier title must be unique within the petition"));
        }
    }

    state.db.update_support_tier(
        tier_id,
        &NewSupportTier {
            title: req.title.as_deref().unwrap_or(&tier.title),
            description: req.description.as_deref().unwrap_or(&tier.description),
            cost: req.cost.unwrap_or(tier.cost),
        },
    )?;

    info!("Edited support tier {} of petition {}", tier_id, petition_id);
    Ok(StatusCode::OK)
}

/// DELETE /petitions/{id}/supportTiers/{tier_id}
pub async fn delete(
    State(state): State<AppState>,
    Path((petition_id, tier_id)): Path<(i64, i64)>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    owned_petition(&state, petition_id, &auth)?;

    let tiers = state.db.list_support_tiers(petition_id)?;
    if !tiers.iter().any(|t| t.id == tier_id) {
        return Err(ApiError::not_found("No support tier with that id on this petition"));
    }
    ensure_unsupported(&state, tier_id, "delete")?;
    if tiers.len() == 1 {
        return Err(ApiError::forbidden("A petition must keep at least one support tier"));
    }

    state.db.delete_support_tier(tier_id)?;

    info!("Deleted support tier {} from petition {}", tier_id, petition_id);
    Ok(StatusCode::OK)
}
