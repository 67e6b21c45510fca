use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::{debug, info};

use petitions_types::api::AddSupporterRequest;
use petitions_types::models::Supporter;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;

/// GET /petitions/{id}/supporters: newest first.
pub async fn list(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
) -> ApiResult<Json<Vec<Supporter>>> {
    if state.db.get_petition(petition_id)?.is_none() {
        return Err(ApiError::not_found("No petition with that id"));
    }
    let supporters = state
        .db
        .list_supporters(petition_id)?
        .into_iter()
        .map(Supporter::from)
        .collect();
    Ok(Json(supporters))
}

/// POST /petitions/{id}/supporters
pub async fn add(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
    auth: AuthUser,
    ValidJson(req): ValidJson<AddSupporterRequest>,
) -> ApiResult<StatusCode> {
    let petition = state
        .db
        .get_petition(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    let tier = state
        .db
        .get_support_tier(petition_id, req.support_tier_id)?
        .ok_or_else(|| ApiError::not_found("No support tier with that id on this petition"))?;

    if petition.owner_id == auth.id {
        debug!("User {} tried to support their own petition {}", auth.id, petition_id);
        return Err(ApiError::forbidden("Cannot support your own petition"));
    }
    if state.db.has_supported_tier(tier.id, auth.id)? {
        return Err(ApiError::forbidden("Already supporting this petition at that tier"));
    }

    let support_id = state.db.create_supporter(
        petition_id,
        tier.id,
        auth.id,
        req.message.as_deref(),
        &Utc::now(),
    )?;

    info!(
        "User {} supports petition {} at tier {} (support {})",
        auth.id, petition_id, tier.id, support_id
    );
    Ok(StatusCode::CREATED)
}
