use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::{AppError, Result},
    queries::image_queries,
    AppState,
};

pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    if id < 0 {
        return Err(AppError::BadRequest(
            "Image id must not be negative".to_string(),
        ));
    }

    let image = image_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/webp")],
        image.image_data,
    ))
}
