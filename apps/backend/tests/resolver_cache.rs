//! Identity resolution against the read-through cache: the cache is a
//! lookup accelerator, never a trust boundary.

mod common;
mod support;

use std::time::{Duration, SystemTime};

use actix_web::test;
use backend::auth::jwt::mint_access_token;
use backend::entities::users;
use backend::services::user_cache::CachedUser;
use common::assert_problem_details;
use sea_orm::EntityTrait;
use support::auth::{bearer, seed_admin_user, seed_confirmed_user};
use support::create_test_app;
use support::test_state::build_test_state;

#[actix_web::test]
async fn forged_cache_entry_is_unreachable() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let (user, _token) = seed_confirmed_user(&state, "victim").await?;

    // An attacker who can write to the cache store plants a snapshot under a
    // token they invented.
    let forged_token = "attacker.controlled.value";
    let planted = CachedUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        confirmed: true,
        avatar: None,
    };
    state
        .user_cache
        .put(forged_token, &planted, i64::MAX)
        .await;

    let app = create_test_app(state).with_prod_routes().build().await?;

    // Signature verification runs before any cache read, so the planted
    // entry never resolves.
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(forged_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, 401, "UNAUTHORIZED_INVALID_TOKEN").await;

    Ok(())
}

#[actix_web::test]
async fn resolution_is_served_from_cache_after_first_hit() -> Result<(), Box<dyn std::error::Error>>
{
    let state = build_test_state().await?;
    let (user, token) = seed_confirmed_user(&state, "cached").await?;
    let cache = state.user_cache.clone();
    let db = state.require_db()?.clone();
    let app = create_test_app(state).with_prod_routes().build().await?;

    // First resolution goes to the database and populates the cache.
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(cache.get(&token).await.is_some());

    // Remove the row out from under the cache.
    users::Entity::delete_by_id(user.id).exec(&db).await?;

    // Still resolves: the snapshot is served from the cache.
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["username"].as_str(), Some(user.username.as_str()));

    // Once evicted, resolution falls through to the database and fails.
    cache.evict(&token).await;
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = assert_problem_details(resp, 401, "UNAUTHORIZED").await;
    assert_eq!(body["detail"].as_str(), Some("Unable to verify credentials"));

    Ok(())
}

#[actix_web::test]
async fn expired_token_is_rejected_before_cache_lookup() -> Result<(), Box<dyn std::error::Error>>
{
    let state = build_test_state().await?;
    let (user, _token) = seed_confirmed_user(&state, "expired").await?;

    // Validly signed, but minted 20 minutes ago with a 15 minute lifetime.
    let past = SystemTime::now() - Duration::from_secs(20 * 60);
    let stale_token = mint_access_token(
        &user.username,
        Duration::from_secs(15 * 60),
        past,
        &state.security,
    )?;

    // Even a planted cache entry under the stale token must not resurrect it.
    let planted = CachedUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        confirmed: true,
        avatar: None,
    };
    state.user_cache.put(&stale_token, &planted, i64::MAX).await;

    let app = create_test_app(state).with_prod_routes().build().await?;

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&stale_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = assert_problem_details(resp, 401, "UNAUTHORIZED_EXPIRED_TOKEN").await;
    assert_eq!(body["detail"].as_str(), Some("Token is expired"));

    Ok(())
}

#[actix_web::test]
async fn avatar_upload_refreshes_the_cached_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let (user, token) = seed_admin_user(&state, "painter").await?;
    let cache = state.user_cache.clone();
    let app = create_test_app(state).with_prod_routes().build().await?;

    // Populate the cache.
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let req = test::TestRequest::put()
        .uri("/api/users/avatar")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let avatar_url = body["avatar"].as_str().expect("avatar url").to_string();
    assert!(avatar_url.ends_with(&format!("avatars/{}.png", user.username)));

    // The stale entry was evicted; the next resolve re-caches the new state.
    assert!(cache.get(&token).await.is_none());
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["avatar"].as_str(), Some(avatar_url.as_str()));

    // Unsupported upload types are rejected outright.
    let req = test::TestRequest::put()
        .uri("/api/users/avatar")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "text/plain"))
        .set_payload("not an image")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details(resp, 400, "UNSUPPORTED_MEDIA_TYPE").await;

    Ok(())
}

#[actix_web::test]
async fn avatar_upload_requires_admin_role() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await?;
    let (_user, token) = seed_confirmed_user(&state, "plain").await?;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let req = test::TestRequest::put()
        .uri("/api/users/avatar")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![0x89, 0x50, 0x4e, 0x47])
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = assert_problem_details(resp, 403, "FORBIDDEN").await;
    assert_eq!(body["detail"].as_str(), Some("Insufficient permissions"));

    Ok(())
}
