use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;
use std::io::Cursor;

use crate::campaign::CampaignError;
use crate::exporter::ExportError;
use crate::importer::ImportError;
use crate::store::is_unique_violation;
use crate::unsubscribe::UnsubscribeError;

#[derive(Debug)]
pub enum ApiError {
    DatabaseError(sqlx::Error),
    ImportFormat(String),
    DuplicateEmail(String),
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => Status::InternalServerError,
            ApiError::ImportFormat(_) => Status::UnprocessableEntity,
            ApiError::DuplicateEmail(_) => Status::Conflict,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::BadRequest(_) => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let (error_type, message) = match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error: {}", e);
                ("DatabaseError", e.to_string())
            }
            ApiError::ImportFormat(msg) => {
                log::info!("rejected import: {}", msg);
                ("ImportFormatError", msg)
            }
            ApiError::DuplicateEmail(msg) => {
                log::info!("duplicate email: {}", msg);
                ("DuplicateEmailError", msg)
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                ("NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                ("BadRequest", msg)
            }
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                ("InternalError", msg)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        let json = serde_json::to_string(&error_response)
            .unwrap_or_else(|_| r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string());

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Malformed request."),
            ("409", "An email already exists in the target list."),
            ("422", "The uploaded contact file is missing required columns or fields."),
            ("500", "Storage failure."),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            ref db_err if is_unique_violation(db_err) => {
                ApiError::DuplicateEmail("email already exists".to_string())
            }
            _ => ApiError::DatabaseError(err),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Format(e) => ApiError::ImportFormat(e.to_string()),
            ImportError::DuplicateEmail(email) => {
                ApiError::DuplicateEmail(format!("email '{email}' appears more than once"))
            }
            ImportError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Database(e) => ApiError::from(e),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<CampaignError> for ApiError {
    fn from(err: CampaignError) -> Self {
        match err {
            CampaignError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<UnsubscribeError> for ApiError {
    fn from(err: UnsubscribeError) -> Self {
        match err {
            UnsubscribeError::AlreadyExcluded(email) => {
                ApiError::DuplicateEmail(format!("email '{email}' is already excluded"))
            }
            UnsubscribeError::Database(e) => ApiError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::{EMAIL_COLUMN, TabularError};

    #[test]
    fn import_errors_map_to_distinct_statuses() {
        let format: ApiError = ImportError::Format(TabularError::MissingColumn(EMAIL_COLUMN)).into();
        assert_eq!(format.status(), Status::UnprocessableEntity);

        let duplicate: ApiError = ImportError::DuplicateEmail("a@x.com".into()).into();
        assert_eq!(duplicate.status(), Status::Conflict);
    }

    #[test]
    fn missing_rows_become_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), Status::NotFound);
    }

    #[test]
    fn already_excluded_is_a_conflict() {
        let err: ApiError = UnsubscribeError::AlreadyExcluded("a@x.com".into()).into();
        assert_eq!(err.status(), Status::Conflict);
    }
}
