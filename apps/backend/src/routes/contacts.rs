//! Contact CRUD endpoints. Every handler operates on the authenticated
//! user's contacts only.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use time::macros::format_description;
use time::Date;

use crate::entities::contacts;
use crate::extractors::current_user::CurrentUser;
use crate::services::contacts as contacts_service;
use crate::services::contacts::{ContactPatch, ContactQuery, NewContact};
use crate::state::app_state::AppState;
use crate::AppError;

const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw, DATE_FORMAT).map_err(|_| {
        AppError::bad_request(
            "INVALID_DATE",
            format!("Invalid date '{raw}', expected YYYY-MM-DD"),
        )
    })
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    birthday: Option<String>,
    notes: Option<String>,
}

impl From<contacts::Model> for ContactResponse {
    fn from(contact: contacts::Model) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
            birthday: contact.birthday.map(format_date),
            notes: contact.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birthday_from: Option<String>,
    pub birthday_to: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl ContactListQuery {
    fn into_query(self) -> Result<ContactQuery, AppError> {
        Ok(ContactQuery {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            birthday_from: self.birthday_from.as_deref().map(parse_date).transpose()?,
            birthday_to: self.birthday_to.as_deref().map(parse_date).transpose()?,
            skip: self.skip,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. `double_option` distinguishes an absent field (keep the
/// stored value) from an explicit null (clear it).
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, with = "double_option")]
    pub birthday: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub notes: Option<Option<String>>,
}

async fn list_contacts(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    query: web::Query<ContactListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner().into_query()?;

    let db = app_state.require_db()?;
    let contacts = contacts_service::list(db, current_user.id, &query).await?;

    let body: Vec<ContactResponse> = contacts.into_iter().map(ContactResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

async fn upcoming_birthdays(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let db = app_state.require_db()?;
    let contacts =
        contacts_service::upcoming_birthdays(db, current_user.id, query.skip, query.limit).await?;

    let body: Vec<ContactResponse> = contacts.into_iter().map(ContactResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn get_contact(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let db = app_state.require_db()?;
    let contact = contacts_service::get(db, id, current_user.id).await?;

    Ok(HttpResponse::Ok().json(ContactResponse::from(contact)))
}

async fn create_contact(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    body: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();
    let contact = NewContact {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        birthday: payload.birthday.as_deref().map(parse_date).transpose()?,
        notes: payload.notes,
    };

    let db = app_state.require_db()?;
    let created = contacts_service::create(db, current_user.id, contact).await?;

    Ok(HttpResponse::Created().json(ContactResponse::from(created)))
}

async fn update_contact(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateContactRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let payload = body.into_inner();

    let birthday = match payload.birthday {
        None => None,
        Some(None) => Some(None),
        Some(Some(raw)) => Some(Some(parse_date(&raw)?)),
    };

    let patch = ContactPatch {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        birthday,
        notes: payload.notes,
    };

    let db = app_state.require_db()?;
    let updated = contacts_service::update(db, id, current_user.id, patch).await?;

    Ok(HttpResponse::Ok().json(ContactResponse::from(updated)))
}

async fn delete_contact(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let db = app_state.require_db()?;
    let removed = contacts_service::remove(db, id, current_user.id).await?;

    Ok(HttpResponse::Ok().json(ContactResponse::from(removed)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contacts")
            .route("", web::get().to(list_contacts))
            .route("", web::post().to(create_contact))
            // Registered before the id routes so "birthdays" never parses
            // as a contact id.
            .route("/birthdays", web::get().to(upcoming_birthdays))
            .route("/{id}", web::get().to(get_contact))
            .route("/{id}", web::put().to(update_contact))
            .route("/{id}", web::delete().to(delete_contact)),
    );
}
