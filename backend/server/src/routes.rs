use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;

use crate::{
    entry::{Entry, EntryPatch, IngredientsUpdate, NewEntry},
    error::AppError,
    state::AppState,
    utils::{parse_body, parse_id},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modified {
    pub modified_count: u64,
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<Json<Entry>, AppError> {
    let draft = parse_body(payload)?;

    Ok(Json(state.repository.create(draft).await?))
}

pub async fn list_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Entry>>, AppError> {
    Ok(Json(state.repository.list_all().await?))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Entry>, AppError> {
    let id = parse_id(&id)?;

    Ok(Json(state.repository.get_by_id(id).await?))
}

pub async fn ingredient_handler(
    State(state): State<Arc<AppState>>,
    Path(ingredient): Path<String>,
) -> Result<Json<Vec<Entry>>, AppError> {
    Ok(Json(state.repository.list_by_ingredient(&ingredient).await?))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Modified>, AppError> {
    let id = parse_id(&id)?;
    let changes = parse_body(payload)?.into_changes()?;

    let modified_count = state.repository.update_partial(id, &changes).await?;

    Ok(Json(Modified { modified_count }))
}

pub async fn update_ingredients_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<IngredientsUpdate>, JsonRejection>,
) -> Result<Json<Modified>, AppError> {
    let id = parse_id(&id)?;
    let ingredients = parse_body(payload)?.into_ingredients()?;

    let modified_count = state.repository.update_ingredients(id, ingredients).await?;

    Ok(Json(Modified { modified_count }))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<u64>, AppError> {
    let id = parse_id(&id)?;

    Ok(Json(state.repository.delete_by_id(id).await?))
}
