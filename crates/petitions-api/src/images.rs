use std::io::ErrorKind;
use std::path::Path as FsPath;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::auth::{AuthUser, require_owner};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
}

impl ImageType {
    /// Parses a declared `Content-Type`, ignoring parameters and case.
    pub fn from_content_type(value: &str) -> Option<Self> {
        let mime = value.split(';').next()?.trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Identifies the format from its magic number.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        match name.rsplit_once('.')?.1.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// The declared type must be supported and agree with the bytes.
fn check_upload(headers: &HeaderMap, body: &[u8]) -> ApiResult<ImageType> {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(ImageType::from_content_type)
        .ok_or_else(|| ApiError::bad_request("Image must be image/png, image/jpeg or image/gif"))?;

    match ImageType::sniff(body) {
        Some(actual) if actual == declared => Ok(declared),
        Some(actual) => {
            debug!("Upload declared {} but contains {}", declared.mime(), actual.mime());
            Err(ApiError::bad_request("Content-Type does not match the image data"))
        }
        None => Err(ApiError::bad_request("Body is not a png, jpeg or gif image")),
    }
}

/// Writes `{stem}.{ext}`, then runs `record` to point the owning row at it.
/// If the row update fails the new file is removed again and the previous
/// image is left in place; on success a previous file of another type is
/// deleted.
async fn replace_image<F>(
    dir: &FsPath,
    stem: &str,
    kind: ImageType,
    body: &[u8],
    previous: Option<&str>,
    record: F,
) -> anyhow::Result<String>
where
    F: FnOnce(&str) -> anyhow::Result<()>,
{
    let filename = format!("{}.{}", stem, kind.extension());
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&filename), body).await?;

    if let Err(e) = record(&filename) {
        if previous == Some(filename.as_str()) {
            error!("Image {} was overwritten but its record update failed", filename);
        } else if let Err(cleanup) = remove_image_file(dir, &filename).await {
            error!("Failed to remove orphaned image {}: {:#}", filename, cleanup);
        }
        return Err(e);
    }

    if let Some(old) = previous.filter(|old| *old != filename) {
        discard_image(dir, Some(old)).await;
    }
    Ok(filename)
}

async fn remove_image_file(dir: &FsPath, filename: &str) -> anyhow::Result<()> {
    match tokio::fs::remove_file(dir.join(filename)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn serve_image(dir: &FsPath, filename: &str) -> ApiResult<Response> {
    let kind = ImageType::from_filename(filename).ok_or_else(|| {
        warn!("Stored image '{}' has an unknown extension", filename);
        ApiError::not_found("Image not found")
    })?;
    let bytes = tokio::fs::read(dir.join(filename)).await.map_err(|e| {
        warn!("Failed to read image {}: {}", filename, e);
        ApiError::not_found("Image not found")
    })?;
    Ok(([(header::CONTENT_TYPE, kind.mime())], bytes).into_response())
}

fn created_or_replaced(previous: Option<&str>) -> StatusCode {
    if previous.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    }
}

// -- User images --

/// GET /users/{id}/image
pub async fn get_user_image(State(state): State<AppState>, Path(user_id): Path<i64>) -> ApiResult<Response> {
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found("No user with that id"))?;
    let filename = user
        .image_filename
        .ok_or_else(|| ApiError::not_found("User has no image"))?;
    serve_image(&state.image_dir, &filename).await
}

/// PUT /users/{id}/image: raw image bytes. 201 on first upload, 200 on replace.
pub async fn set_user_image(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found("No user with that id"))?;
    require_owner(&auth, user.id, "Cannot change another user's profile image")?;
    let kind = check_upload(&headers, &body)?;

    let previous = user.image_filename.as_deref();
    let filename = replace_image(
        &state.image_dir,
        &format!("user_{user_id}"),
        kind,
        &body,
        previous,
        |filename| state.db.set_user_image(user_id, Some(filename)),
    )
    .await?;

    info!("User {} uploaded profile image {}", user_id, filename);
    Ok(created_or_replaced(previous))
}

/// DELETE /users/{id}/image
pub async fn delete_user_image(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found("No user with that id"))?;
    require_owner(&auth, user.id, "Cannot delete another user's profile image")?;
    let filename = user
        .image_filename
        .ok_or_else(|| ApiError::not_found("User has no image"))?;

    state.db.set_user_image(user_id, None)?;
    remove_image_file(&state.image_dir, &filename).await?;
    Ok(StatusCode::OK)
}

// -- Petition images --

/// GET /petitions/{id}/image
pub async fn get_petition_image(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
) -> ApiResult<Response> {
    let petition = state
        .db
        .get_petition(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    let filename = petition
        .image_filename
        .ok_or_else(|| ApiError::not_found("Petition has no image"))?;
    serve_image(&state.image_dir, &filename).await
}

/// PUT /petitions/{id}/image: owner only.
pub async fn set_petition_image(
    State(state): State<AppState>,
    Path(petition_id): Path<i64>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let petition = state
        .db
        .get_petition(petition_id)?
        .ok_or_else(|| ApiError::not_found("No petition with that id"))?;
    require_owner(&auth, petition.owner_id, "Only the owner of a petition may change it")?;
    let kind = check_upload(&headers, &body)?;

    let previous = petition.image_filename.as_deref();
    let filename = replace_image(
        &state.image_dir,
        &format!("petition_{petition_id}"),
        kind,
        &body,
        previous,
        |filename| state.db.set_petition_image(petition_id, Some(filename)),
    )
    .await?;

    info!("Petition {} image set to {}", petition_id, filename);
    Ok(created_or_replaced(previous))
}

/// Best-effort removal; failures are only logged.
pub(crate) async fn discard_image(dir: &FsPath, filename: Option<&str>) {
    if let Some(filename) = filename {
        if let Err(e) = remove_image_file(dir, filename).await {
            warn!("Failed to remove image {}: {:#}", filename, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0];

    fn content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn sniffs_supported_formats() {
        assert_eq!(ImageType::sniff(PNG), Some(ImageType::Png));
        assert_eq!(ImageType::sniff(JPEG), Some(ImageType::Jpeg));
        assert_eq!(ImageType::sniff(b"GIF89a...."), Some(ImageType::Gif));
        assert_eq!(ImageType::sniff(b"<svg></svg>"), None);
        assert_eq!(ImageType::sniff(&[]), None);
    }

    #[test]
    fn content_type_aliases_and_parameters() {
        assert_eq!(ImageType::from_content_type("image/jpg"), Some(ImageType::Jpeg));
        assert_eq!(ImageType::from_content_type("IMAGE/PNG; charset=binary"), Some(ImageType::Png));
        assert_eq!(ImageType::from_content_type("image/webp"), None);
    }

    #[test]
    fn upload_must_match_declared_type() {
        assert_eq!(check_upload(&content_type("image/png"), PNG).unwrap(), ImageType::Png);
        assert!(check_upload(&content_type("image/gif"), PNG).is_err());
        assert!(check_upload(&content_type("text/plain"), PNG).is_err());
        assert!(check_upload(&HeaderMap::new(), PNG).is_err());
    }

    #[test]
    fn filename_roundtrips_extension() {
        for kind in [ImageType::Png, ImageType::Jpeg, ImageType::Gif] {
            let name = format!("user_1.{}", kind.extension());
            assert_eq!(ImageType::from_filename(&name), Some(kind));
        }
    }

    #[tokio::test]
    async fn replacing_with_new_type_removes_old_file() {
        let dir = tempfile::tempdir().unwrap();

        let first = replace_image(dir.path(), "user_7", ImageType::Png, PNG, None, |_| Ok(()))
            .await
            .unwrap();
        let second = replace_image(dir.path(), "user_7", ImageType::Jpeg, JPEG, Some(&first), |_| Ok(()))
            .await
            .unwrap();

        assert_eq!(second, "user_7.jpg");
        assert!(!dir.path().join(&first).exists());
        assert!(dir.path().join(&second).exists());
    }

    #[tokio::test]
    async fn failed_record_update_keeps_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let first = replace_image(dir.path(), "petition_3", ImageType::Png, PNG, None, |_| Ok(()))
            .await
            .unwrap();

        let result = replace_image(dir.path(), "petition_3", ImageType::Jpeg, JPEG, Some(&first), |_| {
            Err(anyhow::anyhow!("database is locked"))
        })
        .await;

        assert!(result.is_err());
        assert!(dir.path().join(&first).exists());
        assert!(!dir.path().join("petition_3.jpg").exists());
    }
}
