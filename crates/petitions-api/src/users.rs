use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error, info};

use petitions_db::models::UserChanges;
use petitions_types::api::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdateUserRequest,
    UserResponse,
};

use crate::AppState;
use crate::auth::{AuthUser, MaybeAuthUser, require_owner};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::passwords::{generate_token, hash_password, is_valid_email, verify_password};

// Argon2 blocks; run it on the blocking pool.
async fn hash_off_thread(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

async fn verify_off_thread(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if state.db.get_user_by_email(&req.email)?.is_some() {
        debug!("Registration rejected: email already in use");
        return Err(ApiError::forbidden("Email already in use"));
    }

    let password_hash = hash_off_thread(req.password).await?;
    let user_id = state
        .db
        .create_user(&req.email, &req.first_name, &req.last_name, &password_hash)?;

    info!("Registered user {}", user_id);
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// POST /users/login: issues a fresh token, replacing any previous one.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(ApiError::unauthorized)?;

    if !verify_off_thread(req.password, user.password).await? {
        debug!("Failed login for user {}", user.id);
        return Err(ApiError::unauthorized());
    }

    let token = generate_token();
    state.db.set_auth_token(user.id, Some(&token))?;

    info!("User {} logged in", user.id);
    Ok(Json(LoginResponse {
        user_id: user.id,
        token,
    }))
}

/// POST /users/logout
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state.db.set_auth_token(auth.id, None)?;
    info!("User {} logged out", auth.id);
    Ok(StatusCode::OK)
}

/// GET /users/{id}: email is only shown to the user themself.
pub async fn view(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    MaybeAuthUser(caller): MaybeAuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found("No user with that id"))?;

    let is_self = caller.is_some_and(|c| c.id == user.id);
    Ok(Json(UserResponse {
        email: is_self.then_some(user.email),
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// PATCH /users/{id}: any subset of fields, applied together.
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    auth: AuthUser,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<StatusCode> {
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found("No user with that id"))?;
    require_owner(&auth, user.id, "Cannot edit another user's information")?;

    if let Some(email) = &req.email {
        if !is_valid_email(email) {
            return Err(ApiError::bad_request("Invalid email address"));
        }
        if let Some(other) = state.db.get_user_by_email(email)? {
            if other.id != user.id {
                return Err(ApiError::forbidden("Email already in use"));
            }
        }
    }

    let new_hash = match (req.password, req.current_password) {
        (Some(password), Some(current)) => {
            if !verify_off_thread(current, user.password.clone()).await? {
                debug!("User {} gave the wrong current password", user.id);
                return Err(ApiError::Unauthorized("Incorrect current password".into()));
            }
            if verify_off_thread(password.clone(), user.password.clone()).await? {
                return Err(ApiError::forbidden(
                    "New password must differ from the current password",
                ));
            }
            Some(hash_off_thread(password).await?)
        }
        _ => None,
    };

    state.db.update_user(
        user.id,
        &UserChanges {
            email: req.email.as_deref(),
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
            password_hash: new_hash.as_deref(),
        },
    )?;

    info!("Updated user {}", user.id);
    Ok(StatusCode::OK)
}
