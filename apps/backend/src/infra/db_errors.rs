//! SeaORM -> AppError translation helpers.
//!
//! Repositories convert `sea_orm::DbErr` into `AppError` here so that unique
//! constraint violations surface as 409 Conflict instead of opaque 500s. The
//! error text never echoes the conflicting value itself.

use sea_orm::DbErr;

use crate::AppError;

/// Extract table.column from SQLite "UNIQUE constraint failed: table.column"
/// error messages.
fn extract_sqlite_table_column(error_msg: &str) -> Option<&str> {
    let rest = error_msg
        .split("UNIQUE constraint failed: ")
        .nth(1)?;
    rest.split_whitespace().next()
}

/// Map a unique-constraint hit on a known column to a conflict error.
fn unique_conflict(table_column: &str) -> Option<AppError> {
    match table_column {
        "users.email" => Some(AppError::conflict(
            "UNIQUE_EMAIL",
            "User with such email already exists".to_string(),
        )),
        "users.username" => Some(AppError::conflict(
            "UNIQUE_USERNAME",
            "User with such username already exists".to_string(),
        )),
        _ => None,
    }
}

/// Map PostgreSQL unique index names to the same conflicts.
fn postgres_unique_conflict(error_msg: &str) -> Option<AppError> {
    if error_msg.contains("idx-users-email") || error_msg.contains("users_email_key") {
        return unique_conflict("users.email");
    }
    if error_msg.contains("idx-users-username") || error_msg.contains("users_username_key") {
        return unique_conflict("users.username");
    }
    None
}

/// Translate a `DbErr` into an `AppError` with sanitized detail.
pub fn map_db_err(e: DbErr) -> AppError {
    let error_msg = e.to_string();

    if let DbErr::RecordNotFound(_) = &e {
        return AppError::not_found("RECORD_NOT_FOUND", "Record not found".to_string());
    }

    if let Some(table_column) = extract_sqlite_table_column(&error_msg) {
        if let Some(conflict) = unique_conflict(table_column) {
            return conflict;
        }
    }
    if error_msg.contains("duplicate key value") {
        if let Some(conflict) = postgres_unique_conflict(&error_msg) {
            return conflict;
        }
    }

    tracing::error!(error = %error_msg, "database error");
    AppError::db(format!("Database operation failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_unique_email_maps_to_conflict() {
        let err = DbErr::Custom("UNIQUE constraint failed: users.email".to_string());
        let mapped = map_db_err(err);
        assert!(matches!(mapped, AppError::Conflict { code, .. } if code == "UNIQUE_EMAIL"));
    }

    #[test]
    fn sqlite_unique_username_maps_to_conflict() {
        let err = DbErr::Custom("UNIQUE constraint failed: users.username".to_string());
        let mapped = map_db_err(err);
        assert!(matches!(mapped, AppError::Conflict { code, .. } if code == "UNIQUE_USERNAME"));
    }

    #[test]
    fn postgres_unique_index_maps_to_conflict() {
        let err = DbErr::Custom(
            "duplicate key value violates unique constraint \"idx-users-email\"".to_string(),
        );
        let mapped = map_db_err(err);
        assert!(matches!(mapped, AppError::Conflict { code, .. } if code == "UNIQUE_EMAIL"));
    }

    #[test]
    fn unrelated_errors_stay_db_errors() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(matches!(map_db_err(err), AppError::Db { .. }));
    }
}
