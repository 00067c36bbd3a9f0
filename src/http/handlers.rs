use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::access::Access;
use crate::app::auth::AuthService;
use crate::app::engagement::CommentService;
use crate::app::otp::OtpStore;
use crate::app::photos::{PhotoPatch, PhotoService};
use crate::app::relations::{RelationService, ToggleCreate, ToggleRemove};
use crate::app::users::UserService;
use crate::domain::engagement::Comment;
use crate::domain::page::{PageParams, Paginated};
use crate::domain::photo::Photo;
use crate::domain::user::{Profile, User};
use crate::http::{AppError, AuthUser};
use crate::AppState;

const MAX_PASSWORD_LEN: usize = 128;
const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_COMMENT_LEN: usize = 500;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationQuery {
    fn params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let username = payload.username.trim();
    if !(3..=36).contains(&username.chars().count()) {
        return Err(AppError::bad_request(
            "username must be between 3 and 36 characters",
        ));
    }
    if payload.password.chars().count() < 8 {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    if payload.password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "password must be at most 128 characters",
        ));
    }
    if payload.display_name.trim().is_empty() {
        return Err(AppError::bad_request("display_name cannot be empty"));
    }

    let service = AuthService::new(state.db.clone(), state.token_key, state.token_ttl_hours);
    let user = service
        .signup(
            username.to_string(),
            payload.password,
            payload.display_name,
            payload.avatar_url,
        )
        .await
        .map_err(|err| {
            if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
                if let Some(db_err) = sqlx_err.as_database_error() {
                    if db_err.code().as_deref() == Some("23505") {
                        return AppError::conflict("username already taken");
                    }
                }
            }
            tracing::error!(error = ?err, "failed to create user");
            AppError::internal("failed to create user")
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }
    if payload.password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "password must be at most 128 characters",
        ));
    }

    let service = AuthService::new(state.db.clone(), state.token_key, state.token_ttl_hours);
    let issued = service
        .signin(&payload.username, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to sign in");
            AppError::internal("failed to sign in")
        })?;

    match issued {
        Some(issued) => Ok(Json(TokenResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::bad_request("username is required"));
    }

    // The response never reveals whether the account exists.
    let generic = MessageResponse {
        message: "if the account exists, a one-time code has been sent",
    };

    let service = AuthService::new(state.db.clone(), state.token_key, state.token_ttl_hours);
    let exists = service
        .subject_exists(&payload.username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to look up user for password reset");
            AppError::internal("failed to process request")
        })?;
    if !exists {
        return Ok(Json(generic));
    }

    let code = OtpStore::generate_code();
    let store = OtpStore::new(state.cache.clone(), state.otp_ttl_minutes);
    store.put(&payload.username, &code).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to store one-time code");
        AppError::internal("failed to process request")
    })?;

    if let Err(err) = state
        .mailer
        .send_one_time_code(&payload.username, &code)
        .await
    {
        tracing::warn!(error = ?err, "failed to send one-time code email");
    }

    Ok(Json(generic))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub otp: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.otp.trim().is_empty() {
        return Err(AppError::bad_request("username and otp are required"));
    }
    if payload.new_password.chars().count() < 8 {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    if payload.new_password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "password must be at most 128 characters",
        ));
    }

    let store = OtpStore::new(state.cache.clone(), state.otp_ttl_minutes);
    let consumed = store
        .consume(&payload.username, &payload.otp)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to check one-time code");
            AppError::internal("failed to process request")
        })?;
    if !consumed {
        return Err(AppError::forbidden("invalid or expired code"));
    }

    let service = AuthService::new(state.db.clone(), state.token_key, state.token_ttl_hours);
    let updated = service
        .reset_password(&payload.username, &payload.new_password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to reset password");
            AppError::internal("failed to reset password")
        })?;
    if !updated {
        return Err(AppError::forbidden("invalid or expired code"));
    }

    Ok(Json(MessageResponse {
        message: "password reset successfully",
    }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_user(&auth.username).await.map_err(|err| {
        tracing::error!(error = ?err, username = %auth.username, "failed to fetch current user");
        AppError::internal("failed to fetch current user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn get_profile(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    let service = UserService::new(state.db.clone());
    let profile = service.get_profile(&username).await.map_err(|err| {
        tracing::error!(error = ?err, %username, "failed to fetch profile");
        AppError::internal("failed to fetch profile")
    })?;

    match profile {
        Some(profile) => Ok(Json(profile)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    if let Some(display_name) = &payload.display_name {
        if display_name.trim().is_empty() {
            return Err(AppError::bad_request("display_name cannot be empty"));
        }
    }

    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(&auth.username, payload.display_name, payload.avatar_url)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, "failed to update profile");
            AppError::internal("failed to update profile")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn list_saved_photos(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Photo>>, AppError> {
    let service = UserService::new(state.db.clone());
    let page = service
        .list_saved(&auth.username, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, "failed to list saved photos");
            AppError::internal("failed to list saved photos")
        })?;

    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Photos
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePhotoRequest {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create_photo(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePhotoRequest>,
) -> Result<(StatusCode, Json<Photo>), AppError> {
    if payload.url.trim().is_empty() {
        return Err(AppError::bad_request("no image URL provided"));
    }
    if payload.title.trim().is_empty() || payload.title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request(
            "title must be between 1 and 100 characters",
        ));
    }
    if payload.description.trim().is_empty()
        || payload.description.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(AppError::bad_request(
            "description must be between 1 and 500 characters",
        ));
    }

    let service = PhotoService::new(state.db.clone());
    let photo = service
        .create(
            &auth.username,
            payload.url,
            payload.title,
            payload.description,
            payload.tags,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, "failed to create photo");
            AppError::internal("failed to create photo")
        })?;

    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn list_photos(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Photo>>, AppError> {
    let service = PhotoService::new(state.db.clone());
    let page = service.list_recent(query.params()).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list photos");
        AppError::internal("failed to list photos")
    })?;

    Ok(Json(page))
}

pub async fn list_photos_by_tag(
    Path(tag): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Photo>>, AppError> {
    let service = PhotoService::new(state.db.clone());
    let page = service
        .list_by_tag(&tag, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %tag, "failed to list photos by tag");
            AppError::internal("failed to list photos by tag")
        })?;

    Ok(Json(page))
}

pub async fn list_photos_by_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Photo>>, AppError> {
    let service = PhotoService::new(state.db.clone());
    let page = service
        .list_by_user(&username, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %username, "failed to list user photos");
            AppError::internal("failed to list user photos")
        })?;

    match page {
        Some(page) => Ok(Json(page)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn get_photo(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Photo>, AppError> {
    let service = PhotoService::new(state.db.clone());
    let photo = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, photo_id = %id, "failed to fetch photo");
        AppError::internal("failed to fetch photo")
    })?;

    match photo {
        Some(photo) => Ok(Json(photo)),
        None => Err(AppError::not_found("photo not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdatePhotoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub async fn update_photo(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePhotoRequest>,
) -> Result<Json<Photo>, AppError> {
    // Shape first: no row is loaded for an invalid patch.
    if let Some(title) = &payload.title {
        if title.trim().is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::bad_request(
                "title must be between 1 and 100 characters",
            ));
        }
    }
    if let Some(description) = &payload.description {
        if description.trim().is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::bad_request(
                "description must be between 1 and 500 characters",
            ));
        }
    }

    let service = PhotoService::new(state.db.clone());
    let outcome = service
        .update(
            id,
            &auth.username,
            PhotoPatch {
                title: payload.title,
                description: payload.description,
                tags: payload.tags,
            },
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, photo_id = %id, "failed to update photo");
            AppError::internal("failed to update photo")
        })?;

    match outcome {
        Access::Granted(photo) => Ok(Json(photo)),
        Access::NotFound => Err(AppError::not_found("photo not found")),
        Access::Forbidden => Err(AppError::forbidden("not authorized to update this photo")),
    }
}

pub async fn delete_photo(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PhotoService::new(state.db.clone());
    let outcome = service
        .delete(id, &auth.username, &state.storage)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, photo_id = %id, "failed to delete photo");
            AppError::internal("failed to delete photo")
        })?;

    match outcome {
        Access::Granted(()) => Ok(StatusCode::NO_CONTENT),
        Access::NotFound => Err(AppError::not_found("photo not found")),
        Access::Forbidden => Err(AppError::forbidden("not authorized to delete this photo")),
    }
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

pub async fn like_photo(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let service = RelationService::new(state.db.clone());
    let outcome = service.like(&auth.username, photo_id).await.map_err(|err| {
        tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to like photo");
        AppError::internal("failed to like photo")
    })?;

    match outcome {
        ToggleCreate::Created => Ok((
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "photo liked",
            }),
        )),
        ToggleCreate::AlreadyPresent => Err(AppError::conflict("photo already liked")),
        ToggleCreate::TargetMissing => Err(AppError::not_found("photo not found")),
    }
}

pub async fn unlike_photo(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = RelationService::new(state.db.clone());
    let outcome = service
        .unlike(&auth.username, photo_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to unlike photo");
            AppError::internal("failed to unlike photo")
        })?;

    match outcome {
        ToggleRemove::Removed => Ok(Json(MessageResponse {
            message: "photo unliked",
        })),
        ToggleRemove::NotPresent => Err(AppError::not_found("like not found")),
    }
}

#[derive(Serialize)]
pub struct LikedResponse {
    pub liked: bool,
}

pub async fn check_like(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikedResponse>, AppError> {
    let service = RelationService::new(state.db.clone());
    let liked = service
        .has_liked(&auth.username, photo_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to check like");
            AppError::internal("failed to check like")
        })?;

    Ok(Json(LikedResponse { liked }))
}

pub async fn list_photo_likers(
    Path(photo_id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<User>>, AppError> {
    let service = RelationService::new(state.db.clone());
    let page = service
        .list_likers(photo_id, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %photo_id, "failed to list photo likers");
            AppError::internal("failed to list photo likers")
        })?;

    match page {
        Some(page) => Ok(Json(page)),
        None => Err(AppError::not_found("photo not found")),
    }
}

// ---------------------------------------------------------------------------
// Saves
// ---------------------------------------------------------------------------

pub async fn save_photo(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let service = RelationService::new(state.db.clone());
    let outcome = service.save(&auth.username, photo_id).await.map_err(|err| {
        tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to save photo");
        AppError::internal("failed to save photo")
    })?;

    match outcome {
        ToggleCreate::Created => Ok((
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "photo saved",
            }),
        )),
        ToggleCreate::AlreadyPresent => Err(AppError::conflict("photo already saved")),
        ToggleCreate::TargetMissing => Err(AppError::not_found("photo not found")),
    }
}

pub async fn unsave_photo(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = RelationService::new(state.db.clone());
    let outcome = service
        .unsave(&auth.username, photo_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to unsave photo");
            AppError::internal("failed to unsave photo")
        })?;

    match outcome {
        ToggleRemove::Removed => Ok(Json(MessageResponse {
            message: "photo unsaved",
        })),
        ToggleRemove::NotPresent => Err(AppError::not_found("save not found")),
    }
}

#[derive(Serialize)]
pub struct SavedResponse {
    pub saved: bool,
}

pub async fn check_save(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SavedResponse>, AppError> {
    let service = RelationService::new(state.db.clone());
    let saved = service
        .has_saved(&auth.username, photo_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to check save");
            AppError::internal("failed to check save")
        })?;

    Ok(Json(SavedResponse { saved }))
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

pub async fn follow_user(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if auth.username == username {
        return Err(AppError::bad_request("cannot follow yourself"));
    }

    let service = RelationService::new(state.db.clone());
    let outcome = service
        .follow(&auth.username, &username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower = %auth.username, following = %username, "failed to follow user");
            AppError::internal("failed to follow user")
        })?;

    match outcome {
        ToggleCreate::Created => Ok((
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "user followed",
            }),
        )),
        ToggleCreate::AlreadyPresent => Err(AppError::conflict("already following this user")),
        ToggleCreate::TargetMissing => Err(AppError::not_found("user not found")),
    }
}

pub async fn unfollow_user(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = RelationService::new(state.db.clone());
    let outcome = service
        .unfollow(&auth.username, &username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower = %auth.username, following = %username, "failed to unfollow user");
            AppError::internal("failed to unfollow user")
        })?;

    match outcome {
        ToggleRemove::Removed => Ok(Json(MessageResponse {
            message: "user unfollowed",
        })),
        ToggleRemove::NotPresent => Err(AppError::not_found("not following this user")),
    }
}

#[derive(Serialize)]
pub struct FollowingResponse {
    pub following: bool,
}

pub async fn check_follow(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FollowingResponse>, AppError> {
    let service = RelationService::new(state.db.clone());
    let following = service
        .is_following(&auth.username, &username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower = %auth.username, following = %username, "failed to check follow");
            AppError::internal("failed to check follow")
        })?;

    Ok(Json(FollowingResponse { following }))
}

pub async fn list_followers(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<User>>, AppError> {
    let service = RelationService::new(state.db.clone());
    let page = service
        .list_followers(&username, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %username, "failed to list followers");
            AppError::internal("failed to list followers")
        })?;

    match page {
        Some(page) => Ok(Json(page)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn list_following(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<User>>, AppError> {
    let service = RelationService::new(state.db.clone());
    let page = service
        .list_following(&username, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %username, "failed to list following");
            AppError::internal("failed to list following")
        })?;

    match page {
        Some(page) => Ok(Json(page)),
        None => Err(AppError::not_found("user not found")),
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

pub async fn create_comment(
    Path(photo_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    if payload.content.trim().is_empty() || payload.content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(
            "content must be between 1 and 500 characters",
        ));
    }

    let service = CommentService::new(state.db.clone());
    let comment = service
        .create(&auth.username, photo_id, payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %auth.username, %photo_id, "failed to create comment");
            AppError::internal("failed to create comment")
        })?;

    match comment {
        Some(comment) => Ok((StatusCode::CREATED, Json(comment))),
        None => Err(AppError::not_found("photo not found")),
    }
}

pub async fn list_comments(
    Path(photo_id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<Comment>>, AppError> {
    let service = CommentService::new(state.db.clone());
    let page = service
        .list(photo_id, query.params())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %photo_id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?;

    match page {
        Some(page) => Ok(Json(page)),
        None => Err(AppError::not_found("photo not found")),
    }
}

pub async fn update_comment(
    Path(comment_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>, AppError> {
    if payload.content.trim().is_empty() || payload.content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request(
            "content must be between 1 and 500 characters",
        ));
    }

    let service = CommentService::new(state.db.clone());
    let outcome = service
        .update(comment_id, &auth.username, payload.content)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %comment_id, "failed to update comment");
            AppError::internal("failed to update comment")
        })?;

    match outcome {
        Access::Granted(comment) => Ok(Json(comment)),
        Access::NotFound => Err(AppError::not_found("comment not found")),
        Access::Forbidden => Err(AppError::forbidden("not authorized to update this comment")),
    }
}

pub async fn delete_comment(
    Path(comment_id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = CommentService::new(state.db.clone());
    let outcome = service
        .delete(comment_id, &auth.username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %comment_id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;

    match outcome {
        Access::Granted(()) => Ok(StatusCode::NO_CONTENT),
        Access::NotFound => Err(AppError::not_found("comment not found")),
        Access::Forbidden => Err(AppError::forbidden("not authorized to delete this comment")),
    }
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PresignedUploadRequest {
    pub content_type: String,
    pub expires_in: Option<u64>,
}

#[derive(Serialize)]
pub struct PresignedUploadResponse {
    pub upload_url: String,
    pub object_key: String,
    pub public_url: String,
    pub expires_in_seconds: u64,
}

pub async fn create_presigned_upload(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, AppError> {
    if !matches!(
        payload.content_type.as_str(),
        "image/jpeg" | "image/png" | "image/webp"
    ) {
        return Err(AppError::bad_request(
            "content_type must be image/jpeg, image/png or image/webp",
        ));
    }

    let expires_in = payload
        .expires_in
        .unwrap_or(state.upload_url_ttl_seconds)
        .min(state.upload_url_ttl_seconds);

    let ticket = state
        .storage
        .presign_upload(&payload.content_type, expires_in)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to presign upload");
            AppError::internal("failed to presign upload")
        })?;

    Ok(Json(PresignedUploadResponse {
        upload_url: ticket.upload_url,
        object_key: ticket.object_key,
        public_url: ticket.public_url,
        expires_in_seconds: ticket.expires_in_seconds,
    }))
}
