use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use libreria_http::{error::AppError, router::API_PREFIX};

use super::models::{Book, BookPayload, SaveBook};
use super::service::BookService;

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("libro {id} no encontrado"))
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Presence and range checks shared by create and update.
fn validate(payload: BookPayload, id: Option<i64>) -> Result<SaveBook, AppError> {
    let (Some(titulo), Some(isbn)) = (required(payload.titulo), required(payload.isbn)) else {
        return Err(AppError::bad_request("El título y el ISBN son requeridos"));
    };

    let stock = payload.stock.unwrap_or(0);
    if stock < 0 {
        return Err(AppError::bad_request("El stock no puede ser negativo"));
    }

    Ok(SaveBook {
        id,
        titulo,
        isbn,
        stock,
        autor_id: payload.autor.map(|a| a.id),
    })
}

pub(crate) async fn list_books(
    State(service): State<BookService>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.list_all().await?))
}

pub(crate) async fn get_book(
    State(service): State<BookService>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    let book = service.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(book))
}

pub(crate) async fn get_book_by_title(
    State(service): State<BookService>,
    Path(titulo): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = service
        .find_by_title(&titulo)
        .await?
        .ok_or_else(|| AppError::not_found(format!("libro '{titulo}' no encontrado")))?;
    Ok(Json(book))
}

pub(crate) async fn create_book(
    State(service): State<BookService>,
    Json(payload): Json<BookPayload>,
) -> Result<impl IntoResponse, AppError> {
    let book = service.save(validate(payload, None)?).await?;
    tracing::info!(book_id = book.id, isbn = %book.isbn, "book created");

    let location = format!("{}/libros/{}", API_PREFIX, book.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

pub(crate) async fn update_book(
    State(service): State<BookService>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<Book>, AppError> {
    let book = validate(payload, Some(id))?;
    if !service.exists(id).await? {
        return Err(not_found(id));
    }

    let updated = service.save(book).await?;
    tracing::info!(book_id = id, "book updated");
    Ok(Json(updated))
}

pub(crate) async fn delete_book(
    State(service): State<BookService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !service.delete(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Sells one copy. A zero-row decrement is told apart afterwards: the book
/// either is missing (404) or has no stock left (400).
pub(crate) async fn decrement_stock(
    State(service): State<BookService>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    if service.decrement_stock(id).await? {
        let book = service.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(book_id = id, stock = book.stock, "stock decremented");
        return Ok(Json(book));
    }

    if service.exists(id).await? {
        tracing::warn!(book_id = id, "decrement refused, out of stock");
        Err(AppError::bad_request_with_code(
            "out_of_stock",
            "No hay stock disponible para este libro",
        ))
    } else {
        Err(not_found(id))
    }
}
