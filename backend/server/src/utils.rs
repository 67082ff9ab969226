use axum::{Json, extract::rejection::JsonRejection};

use crate::{entry::EntryId, error::AppError};

pub fn parse_id(raw: &str) -> Result<EntryId, AppError> {
    raw.parse()
}

/// Splits body rejections into bad JSON (malformed input) and JSON of the wrong shape
/// (validation failure).
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::JsonDataError(e)) => Err(AppError::ValidationFailure(e.body_text())),
        Err(e) => Err(AppError::MalformedInput(e.body_text())),
    }
}
