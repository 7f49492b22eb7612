use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use libreria_http::{error::AppError, router::API_PREFIX};

use super::models::{Author, AuthorPayload, SaveAuthor};
use super::service::AuthorService;

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("autor {id} no encontrado"))
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Presence checks shared by create and update.
fn validate(payload: AuthorPayload, id: Option<i64>) -> Result<SaveAuthor, AppError> {
    let nombre = required(payload.nombre)
        .ok_or_else(|| AppError::bad_request("El nombre del autor es requerido"))?;
    let apellido = required(payload.apellido)
        .ok_or_else(|| AppError::bad_request("El apellido del autor es requerido"))?;

    Ok(SaveAuthor {
        id,
        nombre,
        apellido,
        nacionalidad: payload.nacionalidad,
    })
}

pub(crate) async fn list_authors(
    State(service): State<AuthorService>,
) -> Result<Json<Vec<Author>>, AppError> {
    Ok(Json(service.list_all().await?))
}

pub(crate) async fn get_author(
    State(service): State<AuthorService>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, AppError> {
    let author = service.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(author))
}

pub(crate) async fn get_author_by_name(
    State(service): State<AuthorService>,
    Path(nombre): Path<String>,
) -> Result<Json<Author>, AppError> {
    let author = service
        .find_by_name(&nombre)
        .await?
        .ok_or_else(|| AppError::not_found(format!("autor '{nombre}' no encontrado")))?;
    Ok(Json(author))
}

pub(crate) async fn create_author(
    State(service): State<AuthorService>,
    Json(payload): Json<AuthorPayload>,
) -> Result<impl IntoResponse, AppError> {
    let author = service.save(validate(payload, None)?).await?;
    tracing::info!(author_id = author.id, "author created");

    let location = format!("{}/autores/{}", API_PREFIX, author.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(author),
    ))
}

pub(crate) async fn update_author(
    State(service): State<AuthorService>,
    Path(id): Path<i64>,
    Json(payload): Json<AuthorPayload>,
) -> Result<Json<Author>, AppError> {
    let author = validate(payload, Some(id))?;
    if service.find_by_id(id).await?.is_none() {
        return Err(not_found(id));
    }

    let updated = service.save(author).await?;
    tracing::info!(author_id = id, "author updated");
    Ok(Json(updated))
}

pub(crate) async fn delete_author(
    State(service): State<AuthorService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !service.delete(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(author_id = id, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}
