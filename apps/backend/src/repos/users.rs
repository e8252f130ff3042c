//! User repository functions, generic over `ConnectionTrait`.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;

use crate::entities::users::{self, UserRole};
use crate::infra::db_errors::map_db_err;
use crate::AppError;

pub async fn find_by_username<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    username: &str,
) -> Result<Option<users::Model>, AppError> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(conn)
        .await
        .map_err(map_db_err)
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<users::Model>, AppError> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await
        .map_err(map_db_err)
}

/// Insert a new, unconfirmed user. Unique violations on username/email map
/// to 409 Conflict.
pub async fn insert_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    username: &str,
    email: &str,
    hashed_password: &str,
) -> Result<users::Model, AppError> {
    let now = OffsetDateTime::now_utc();
    let user = users::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        hashed_password: Set(hashed_password.to_string()),
        confirmed: Set(false),
        role: Set(UserRole::User),
        avatar: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    user.insert(conn).await.map_err(map_db_err)
}

/// Flip the confirmed flag. Idempotent: confirming a confirmed user is a
/// no-op at the database level.
pub async fn mark_confirmed<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.confirmed = Set(true);
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await.map_err(map_db_err)
}

/// Overwrite the stored password hash.
pub async fn update_password<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
    hashed_password: String,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.hashed_password = Set(hashed_password);
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await.map_err(map_db_err)
}

/// Replace the avatar URL.
pub async fn update_avatar<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
    avatar_url: String,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.avatar = Set(Some(avatar_url));
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await.map_err(map_db_err)
}
