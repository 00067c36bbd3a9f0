use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/signin", post(handlers::signin))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password", post(handlers::reset_password))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(handlers::get_current_user))
        .route("/users/me", put(handlers::update_profile))
        .route("/users/me/saved", get(handlers::list_saved_photos))
        .route("/users/:username", get(handlers::get_profile))
}

pub fn photos() -> Router<AppState> {
    Router::new()
        .route("/photos", post(handlers::create_photo))
        .route("/photos", get(handlers::list_photos))
        .route("/photos/tag/:tag", get(handlers::list_photos_by_tag))
        .route("/photos/user/:username", get(handlers::list_photos_by_user))
        .route("/photos/:id", get(handlers::get_photo))
        .route("/photos/:id", put(handlers::update_photo))
        .route("/photos/:id", delete(handlers::delete_photo))
}

pub fn likes() -> Router<AppState> {
    Router::new()
        .route("/likes/:photo_id", post(handlers::like_photo))
        .route("/likes/:photo_id", delete(handlers::unlike_photo))
        .route("/likes/:photo_id/check", get(handlers::check_like))
        .route("/likes/:photo_id/users", get(handlers::list_photo_likers))
}

pub fn saves() -> Router<AppState> {
    Router::new()
        .route("/saves/:photo_id", post(handlers::save_photo))
        .route("/saves/:photo_id", delete(handlers::unsave_photo))
        .route("/saves/:photo_id/check", get(handlers::check_save))
}

pub fn follows() -> Router<AppState> {
    Router::new()
        .route("/follows/:username", post(handlers::follow_user))
        .route("/follows/:username", delete(handlers::unfollow_user))
        .route("/follows/:username/check", get(handlers::check_follow))
        .route("/follows/:username/followers", get(handlers::list_followers))
        .route("/follows/:username/following", get(handlers::list_following))
}

pub fn comments() -> Router<AppState> {
    Router::new()
        // :id is the photo for create/list and the comment for update/delete.
        .route("/comments/:id", post(handlers::create_comment))
        .route("/comments/:id", get(handlers::list_comments))
        .route("/comments/:id", put(handlers::update_comment))
        .route("/comments/:id", delete(handlers::delete_comment))
}

pub fn uploads() -> Router<AppState> {
    Router::new().route(
        "/uploads/presigned",
        post(handlers::create_presigned_upload),
    )
}
