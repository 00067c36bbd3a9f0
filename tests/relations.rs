mod common;

use axum::http::StatusCode;
use pinboard::app::relations::{RelationService, ToggleCreate};

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn like_rejects_repeats_and_missing_targets() {
    let Some(app) = common::app().await else { return };
    let owner = app.create_user("like_owner").await;
    let fan = app.create_user("like_fan").await;
    let photo_id = app.create_photo_for_user(&owner.username).await;
    let path = format!("/api/likes/{}", photo_id);

    let response = app.post_empty(&path, Some(&fan.token)).await;
    assert_eq!(response.status, StatusCode::CREATED);

    // Liking twice is a conflict, not a silent no-op.
    let response = app.post_empty(&path, Some(&fan.token)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_message(), "photo already liked");

    let response = app
        .post_empty(
            "/api/likes/00000000-0000-0000-0000-000000000000",
            Some(&fan.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn like_by_vanished_user_reports_missing_target() {
    let Some(app) = common::app().await else { return };
    let owner = app.create_user("like_ghost_owner").await;
    let photo_id = app.create_photo_for_user(&owner.username).await;

    // The photo exists, so the fast-path check passes, but the insert trips
    // the foreign key on the never-created username. That must surface as a
    // missing target, not bubble up as a database error.
    let service = RelationService::new(app.state.db.clone());
    let outcome = service
        .like("ghost_user_never_created", photo_id)
        .await
        .expect("like should not error");
    assert_eq!(outcome, ToggleCreate::TargetMissing);
}

#[tokio::test]
async fn unlike_requires_an_existing_like() {
    let Some(app) = common::app().await else { return };
    let owner = app.create_user("unlike_owner").await;
    let fan = app.create_user("unlike_fan").await;
    let photo_id = app.create_photo_for_user(&owner.username).await;
    let path = format!("/api/likes/{}", photo_id);

    let response = app.delete(&path, Some(&fan.token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    app.post_empty(&path, Some(&fan.token)).await;
    let response = app.delete(&path, Some(&fan.token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.delete(&path, Some(&fan.token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_like_reflects_state() {
    let Some(app) = common::app().await else { return };
    let owner = app.create_user("checklike_owner").await;
    let fan = app.create_user("checklike_fan").await;
    let photo_id = app.create_photo_for_user(&owner.username).await;

    let check_path = format!("/api/likes/{}/check", photo_id);
    let response = app.get(&check_path, Some(&fan.token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["liked"], false);

    app.post_empty(&format!("/api/likes/{}", photo_id), Some(&fan.token))
        .await;
    let response = app.get(&check_path, Some(&fan.token)).await;
    assert_eq!(response.json()["liked"], true);
}

#[tokio::test]
async fn likers_list_is_paginated() {
    let Some(app) = common::app().await else { return };
    let owner = app.create_user("likers_owner").await;
    let fan_a = app.create_user("likers_fan_a").await;
    let fan_b = app.create_user("likers_fan_b").await;
    let photo_id = app.create_photo_for_user(&owner.username).await;
    let path = format!("/api/likes/{}", photo_id);

    app.post_empty(&path, Some(&fan_a.token)).await;
    app.post_empty(&path, Some(&fan_b.token)).await;

    let response = app
        .get(&format!("/api/likes/{}/users", photo_id), Some(&owner.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["pagination"]["total"], 2);
    let usernames: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&fan_a.username.as_str()));
    assert!(usernames.contains(&fan_b.username.as_str()));

    let response = app
        .get(
            "/api/likes/00000000-0000-0000-0000-000000000000/users",
            Some(&owner.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Saves
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_and_unsave_follow_the_same_rules_as_likes() {
    let Some(app) = common::app().await else { return };
    let owner = app.create_user("save_owner").await;
    let collector = app.create_user("save_collector").await;
    let photo_id = app.create_photo_for_user(&owner.username).await;
    let path = format!("/api/saves/{}", photo_id);
    let check_path = format!("/api/saves/{}/check", photo_id);

    let response = app.post_empty(&path, Some(&collector.token)).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app.post_empty(&path, Some(&collector.token)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app.get(&check_path, Some(&collector.token)).await;
    assert_eq!(response.json()["saved"], true);

    let response = app.delete(&path, Some(&collector.token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.delete(&path, Some(&collector.token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.get(&check_path, Some(&collector.token)).await;
    assert_eq!(response.json()["saved"], false);
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn follow_rejects_self_repeats_and_unknown_users() {
    let Some(app) = common::app().await else { return };
    let alice = app.create_user("follow_alice").await;
    let bob = app.create_user("follow_bob").await;

    let response = app
        .post_empty(
            &format!("/api/follows/{}", alice.username),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_message(), "cannot follow yourself");

    let path = format!("/api/follows/{}", bob.username);
    let response = app.post_empty(&path, Some(&alice.token)).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app.post_empty(&path, Some(&alice.token)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .post_empty("/api/follows/no_such_user_xyz", Some(&alice.token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unfollow_requires_an_existing_follow() {
    let Some(app) = common::app().await else { return };
    let alice = app.create_user("unfollow_alice").await;
    let bob = app.create_user("unfollow_bob").await;
    let path = format!("/api/follows/{}", bob.username);

    let response = app.delete(&path, Some(&alice.token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    app.post_empty(&path, Some(&alice.token)).await;
    let response = app.delete(&path, Some(&alice.token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn follower_lists_track_both_directions() {
    let Some(app) = common::app().await else { return };
    let alice = app.create_user("followlist_alice").await;
    let bob = app.create_user("followlist_bob").await;

    app.post_empty(&format!("/api/follows/{}", bob.username), Some(&alice.token))
        .await;

    let response = app
        .get(&format!("/api/follows/{}/followers", bob.username), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["items"][0]["username"], alice.username.as_str());

    let response = app
        .get(&format!("/api/follows/{}/following", alice.username), None)
        .await;
    assert_eq!(response.json()["items"][0]["username"], bob.username.as_str());

    let response = app
        .get(
            &format!("/api/follows/{}/check", bob.username),
            Some(&alice.token),
        )
        .await;
    assert_eq!(response.json()["following"], true);

    let response = app.get("/api/follows/no_such_user_xyz/followers", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
