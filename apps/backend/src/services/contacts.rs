//! Contact operations, always scoped to the authenticated owner.

use sea_orm::{ConnectionTrait, Set};
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::entities::contacts;
use crate::repos::contacts as contacts_repo;
pub use crate::repos::contacts::{ContactQuery, NewContact};
use crate::AppError;

/// Partial update payload. Absent fields keep their stored value; ownership
/// and identity are never merged from the payload.
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `Some(None)` clears the birthday, `None` leaves it untouched.
    pub birthday: Option<Option<time::Date>>,
    pub notes: Option<Option<String>>,
}

pub async fn list(
    conn: &(impl ConnectionTrait + Send + Sync),
    user_id: i64,
    query: &ContactQuery,
) -> Result<Vec<contacts::Model>, AppError> {
    contacts_repo::list_by_query(conn, user_id, query).await
}

/// Contacts whose stored birthday falls within the next seven days,
/// inclusive of today.
pub async fn upcoming_birthdays(
    conn: &(impl ConnectionTrait + Send + Sync),
    user_id: i64,
    skip: Option<u64>,
    limit: Option<u64>,
) -> Result<Vec<contacts::Model>, AppError> {
    let today = OffsetDateTime::now_utc().date();
    let query = ContactQuery {
        birthday_from: Some(today),
        birthday_to: Some(today + Duration::days(7)),
        skip,
        limit,
        ..ContactQuery::default()
    };
    contacts_repo::list_by_query(conn, user_id, &query).await
}

pub async fn get(
    conn: &(impl ConnectionTrait + Send + Sync),
    id: i64,
    user_id: i64,
) -> Result<contacts::Model, AppError> {
    contacts_repo::find_by_id(conn, id, user_id)
        .await?
        .ok_or_else(|| contact_not_found(id))
}

pub async fn create(
    conn: &(impl ConnectionTrait + Send + Sync),
    user_id: i64,
    contact: NewContact,
) -> Result<contacts::Model, AppError> {
    let created = contacts_repo::insert(conn, user_id, contact).await?;
    info!(contact_id = created.id, user_id, "contact created");
    Ok(created)
}

/// Explicit allow-listed field merge: only the fields present in the patch
/// are written back.
pub async fn update(
    conn: &(impl ConnectionTrait + Send + Sync),
    id: i64,
    user_id: i64,
    patch: ContactPatch,
) -> Result<contacts::Model, AppError> {
    let persisted = contacts_repo::find_by_id(conn, id, user_id)
        .await?
        .ok_or_else(|| contact_not_found(id))?;

    let mut active: contacts::ActiveModel = persisted.into();
    if let Some(first_name) = patch.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = patch.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = patch.email {
        active.email = Set(email);
    }
    if let Some(phone) = patch.phone {
        active.phone = Set(phone);
    }
    if let Some(birthday) = patch.birthday {
        active.birthday = Set(birthday);
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(OffsetDateTime::now_utc());

    let updated = contacts_repo::update(conn, active).await?;
    info!(contact_id = updated.id, user_id, "contact updated");
    Ok(updated)
}

pub async fn remove(
    conn: &(impl ConnectionTrait + Send + Sync),
    id: i64,
    user_id: i64,
) -> Result<contacts::Model, AppError> {
    let persisted = contacts_repo::find_by_id(conn, id, user_id)
        .await?
        .ok_or_else(|| contact_not_found(id))?;

    contacts_repo::remove(conn, persisted.clone()).await?;
    info!(contact_id = id, user_id, "contact removed");
    Ok(persisted)
}

fn contact_not_found(id: i64) -> AppError {
    AppError::not_found("CONTACT_NOT_FOUND", format!("Contact {id} not found"))
}
