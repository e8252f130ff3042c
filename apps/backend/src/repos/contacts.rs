//! Contact repository functions, generic over `ConnectionTrait`.
//!
//! Every query is scoped to the owning user; a contact id from another user
//! behaves exactly like a missing id.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use time::{Date, OffsetDateTime};

use crate::entities::contacts;
use crate::infra::db_errors::map_db_err;
use crate::AppError;

const DEFAULT_PAGE_SIZE: u64 = 50;

/// Filter set for listing contacts. Name/email matches are case-insensitive
/// exact matches; the birthday bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birthday_from: Option<Date>,
    pub birthday_to: Option<Date>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// New contact fields as accepted from the service layer.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Option<Date>,
    pub notes: Option<String>,
}

pub async fn list_by_query<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    query: &ContactQuery,
) -> Result<Vec<contacts::Model>, AppError> {
    let mut select = contacts::Entity::find().filter(contacts::Column::UserId.eq(user_id));

    if let Some(first_name) = &query.first_name {
        select = select.filter(
            Expr::expr(Func::upper(Expr::col(contacts::Column::FirstName)))
                .eq(first_name.to_uppercase()),
        );
    }
    if let Some(last_name) = &query.last_name {
        select = select.filter(
            Expr::expr(Func::upper(Expr::col(contacts::Column::LastName)))
                .eq(last_name.to_uppercase()),
        );
    }
    if let Some(email) = &query.email {
        select = select.filter(
            Expr::expr(Func::upper(Expr::col(contacts::Column::Email)))
                .eq(email.to_uppercase()),
        );
    }
    if let Some(from) = query.birthday_from {
        select = select.filter(contacts::Column::Birthday.gte(from));
    }
    if let Some(to) = query.birthday_to {
        select = select.filter(contacts::Column::Birthday.lte(to));
    }

    select
        .order_by_asc(contacts::Column::Id)
        .offset(query.skip.unwrap_or(0))
        .limit(query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .all(conn)
        .await
        .map_err(map_db_err)
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
    user_id: i64,
) -> Result<Option<contacts::Model>, AppError> {
    contacts::Entity::find_by_id(id)
        .filter(contacts::Column::UserId.eq(user_id))
        .one(conn)
        .await
        .map_err(map_db_err)
}

pub async fn insert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    contact: NewContact,
) -> Result<contacts::Model, AppError> {
    let now = OffsetDateTime::now_utc();
    let active = contacts::ActiveModel {
        id: NotSet,
        first_name: Set(contact.first_name),
        last_name: Set(contact.last_name),
        email: Set(contact.email),
        phone: Set(contact.phone),
        birthday: Set(contact.birthday),
        notes: Set(contact.notes),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    active.insert(conn).await.map_err(map_db_err)
}

pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    active: contacts::ActiveModel,
) -> Result<contacts::Model, AppError> {
    active.update(conn).await.map_err(map_db_err)
}

pub async fn remove<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    contact: contacts::Model,
) -> Result<(), AppError> {
    contact.delete(conn).await.map_err(map_db_err)?;
    Ok(())
}
