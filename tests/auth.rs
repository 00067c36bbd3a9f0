mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn signup_creates_user() {
    let Some(app) = common::app().await else { return };

    let response = app
        .post_json(
            "/api/auth/signup",
            json!({
                "username": "signup_alice",
                "password": "supersecret1",
                "display_name": "Alice"
            }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["username"], "signup_alice");
    assert_eq!(body["display_name"], "Alice");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn signup_rejects_duplicate_username() {
    let Some(app) = common::app().await else { return };

    let payload = json!({
        "username": "signup_dupe",
        "password": "supersecret1",
        "display_name": "Dupe"
    });
    let first = app.post_json("/api/auth/signup", payload.clone(), None).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app.post_json("/api/auth/signup", payload, None).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_message(), "username already taken");
}

#[tokio::test]
async fn signup_rejects_short_username_and_password() {
    let Some(app) = common::app().await else { return };

    let response = app
        .post_json(
            "/api/auth/signup",
            json!({
                "username": "ab",
                "password": "supersecret1",
                "display_name": "Shorty"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/auth/signup",
            json!({
                "username": "valid_name",
                "password": "short",
                "display_name": "Shorty"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signin_returns_token_for_valid_credentials() {
    let Some(app) = common::app().await else { return };
    let user = app.create_user("signin_ok").await;

    let response = app
        .post_json(
            "/api/auth/signin",
            json!({
                "username": user.username,
                "password": common::DEFAULT_PASSWORD
            }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let token = body["token"].as_str().unwrap();
    assert!(token.starts_with("v4.local."));
    assert!(body["expires_at"].is_string());

    // The token works against a protected route.
    let me = app.get("/api/users/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["username"], user.username.as_str());
}

#[tokio::test]
async fn signin_rejects_wrong_password_and_unknown_user() {
    let Some(app) = common::app().await else { return };
    let user = app.create_user("signin_bad").await;

    let response = app
        .post_json(
            "/api/auth/signin",
            json!({
                "username": user.username,
                "password": "not-the-password"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message(), "invalid credentials");

    let response = app
        .post_json(
            "/api/auth/signin",
            json!({
                "username": "no_such_user_xyz",
                "password": "whatever123"
            }),
            None,
        )
        .await;
    // Unknown user and wrong password are indistinguishable.
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message(), "invalid credentials");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let Some(app) = common::app().await else { return };

    let response = app.get("/api/users/me", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.get("/api/users/me", Some("garbage-token")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            axum::http::Method::GET,
            "/api/users/me",
            None,
            &[("Authorization", "Basic dXNlcjpwYXNz")],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forgot_password_is_generic_for_unknown_accounts() {
    let Some(app) = common::app().await else { return };

    let response = app
        .post_json(
            "/api/auth/forgot-password",
            json!({ "username": "nonexistent_user_abc" }),
            None,
        )
        .await;

    // The response never reveals whether the account exists.
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["message"]
        .as_str()
        .unwrap()
        .contains("if the account exists"));
}

#[tokio::test]
async fn reset_password_rejects_wrong_code() {
    let Some(app) = common::app().await else { return };
    let user = app.create_user("reset_wrong").await;

    let response = app
        .post_json(
            "/api/auth/reset-password",
            json!({
                "username": user.username,
                "otp": "000000",
                "new_password": "newsecret123"
            }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_message(), "invalid or expired code");
}

#[tokio::test]
async fn reset_password_rejects_expired_code() {
    let Some(app) = common::app().await else { return };
    let user = app.create_user("reset_expired").await;

    // Plant a code with a one-second TTL and let it lapse.
    let mut conn = app
        .state
        .cache
        .connection()
        .await
        .expect("redis connect failed");
    redis::cmd("SET")
        .arg(format!("otp:{}", user.username))
        .arg("123456")
        .arg("EX")
        .arg(1)
        .query_async::<_, ()>(&mut conn)
        .await
        .expect("failed to store code");

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    let response = app
        .post_json(
            "/api/auth/reset-password",
            json!({
                "username": user.username,
                "otp": "123456",
                "new_password": "brandnewpass1"
            }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_message(), "invalid or expired code");
}

#[tokio::test]
async fn reset_password_flow_with_stored_code() {
    let Some(app) = common::app().await else { return };
    let user = app.create_user("reset_flow").await;

    // Request a code. Email delivery fails in tests, but the code is stored.
    let response = app
        .post_json(
            "/api/auth/forgot-password",
            json!({ "username": user.username }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Read the code straight out of Redis.
    let mut conn = app
        .state
        .cache
        .connection()
        .await
        .expect("redis connect failed");
    let code: String = redis::cmd("GET")
        .arg(format!("otp:{}", user.username))
        .query_async(&mut conn)
        .await
        .expect("code not found in redis");

    let response = app
        .post_json(
            "/api/auth/reset-password",
            json!({
                "username": user.username,
                "otp": code,
                "new_password": "brandnewpass1"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // The code is single-use.
    let response = app
        .post_json(
            "/api/auth/reset-password",
            json!({
                "username": user.username,
                "otp": code,
                "new_password": "anotherpass99"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Old password no longer works, the new one does.
    let response = app
        .post_json(
            "/api/auth/signin",
            json!({
                "username": user.username,
                "password": common::DEFAULT_PASSWORD
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/api/auth/signin",
            json!({
                "username": user.username,
                "password": "brandnewpass1"
            }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}
