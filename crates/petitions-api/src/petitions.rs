use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{debug, info};

use petitions_db::models::{NewPetition, NewSupportTier, PetitionFilter};
use petitions_types::api::{
    CreatePetitionRequest, CreatePetitionResponse, EditPetitionRequest, PetitionListResponse,
    PetitionSearchQuery,
};
use petitions_types::models::{Category, PetitionDetail, PetitionSummary, SupportTier};

use crate::AppState;
use crate::auth::{AuthUser, require_owner};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidJson, ValidQuery};
use crate::images;

fn check_category(state: &AppState, category_id: i64) -> ApiResult<()> {
    if !state.db.category_exists(category_id)? {
        return Err(ApiError::bad_request(format!("No category with id {category_id}")));
    }
    Ok(())
}

/// GET /petitions
pub async fn list(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<PetitionSearchQuery>,
) -> ApiResult<Json<PetitionListResponse>> {
    for &category_id in &query.category_ids {
        check_category(&state, category_id)?;
    }

    let filter = PetitionFilter {
        q: query.q.as_deref(),
        category_ids: &query.category_ids,
        max_supporting_cost: query.supporting_cost,
        owner_id: query.owner_id,
        supporter_id: query.supporter_id,
        sort_by: query.sort_by.unwrap_or_default(),
    };
    let rows = state.db.search_petitions(&filter)?;
    let count = rows.len();

    let petitions: Vec<PetitionSummary> = rows
        .into_iter()
        .skip(query.start_index.unwrap_or(0))
        .take(query.count.unwrap_or(usize::MAX))
        .map(PetitionSummary::from)
        .collect();

    debug!("Petition search matched {}, returning {}", count, petitions.len());
    Ok(Json(PetitionListResponse { petitions, count }))
}

/// GET /petitions/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
) -> ApiResult<Json<PetitionDetail>> {
    let detail = state
        .db
        .get_petition_detail(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    let tiers = state
        .db
        .list_support_tiers(petition_id)?
        .into_iter()
        .map(SupportTier::from)
        .collect();

    Ok(Json(detail.into_detail(tiers)))
}

/// POST /petitions
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreatePetitionRequest>,
) -> ApiResult<impl IntoResponse> {
    check_category(&state, req.category_id)?;
    if state.db.petition_title_taken(&req.title, None)? {
        debug!("Petition title '{}' already in use", req.title);
        return Err(ApiError::forbidden("Petition title already exists"));
    }

    let tiers: Vec<NewSupportTier<'_>> = req
        .support_tiers
        .iter()
        .map(|t| NewSupportTier {
            title: &t.title,
            description: &t.description,
            cost: t.cost,
        })
        .collect();
    let petition_id = state.db.create_petition(
        &NewPetition {
            title: &req.title,
            description: &req.description,
            category_id: req.category_id,
            owner_id: auth.id,
            created_at: Utc::now(),
        },
        &tiers,
    )?;

    info!("User {} created petition {} with {} tiers", auth.id, petition_id, tiers.len());
    Ok((StatusCode::CREATED, Json(CreatePetitionResponse { petition_id })))
}

/// PATCH /petitions/{id}: only the provided fields change.
pub async fn edit(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
    auth: AuthUser,
    ValidJson(req): ValidJson<EditPetitionRequest>,
) -> ApiResult<StatusCode> {
    let petition = state
        .db
        .get_petition(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    require_owner(&auth, petition.owner_id, "Only the owner of a petition may change it")?;

    if let Some(category_id) = req.category_id {
        check_category(&state, category_id)?;
    }
    if let Some(title) = &req.title {
        if state.db.petition_title_taken(title, Some(petition_id))? {
            return Err(ApiError::forbidden("Petition title already exists"));
        }
    }

    state.db.update_petition(
        petition_id,
        req.title.as_deref().unwrap_or(&petition.title),
        req.description.as_deref().unwrap_or(&petition.description),
        req.category_id.unwrap_or(petition.category_id),
    )?;

    info!("Petition {} edited", petition_id);
    Ok(StatusCode::OK)
}

/// DELETE /petitions/{id}: refused once anyone has supported it.
pub async fn delete(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    let petition = state
        .db
        .get_petition(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    require_owner(&auth, petition.owner_id, "Only the owner of a petition may delete it")?;

    if state.db.count_petition_supporters(petition_id)? > 0 {
        return Err(ApiError::forbidden("Cannot delete a petition that has supporters"));
    }

    state.db.delete_petition(petition_id)?;
    images::discard_image(&state.image_dir, petition.image_filename.as_deref()).await;

    info!("Petition {} deleted", petition_id);
    Ok(StatusCode::OK)
}

/// GET /petitions/categories
pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state
        .db
        .list_categories()?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(Json(categories))
}
