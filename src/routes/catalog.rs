use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Result},
    models::{
        CreateColorQuery, ProductColor, ProductSize, ProductType, ReplaceByNameQuery,
        ReplacementRequest,
    },
    queries::catalog_queries,
    utils::validation,
    AppState,
};

//TYPES

pub async fn list_types(State(state): State<AppState>) -> Result<Json<Vec<ProductType>>> {
    let types = catalog_queries::list_types(&state.db).await?;

    Ok(Json(types))
}

pub async fn create_types(
    State(state): State<AppState>,
    Json(names): Json<Vec<String>>,
) -> Result<StatusCode> {
    let names = validate_batch_names(&names, "Type")?;

    for name in &names {
        if catalog_queries::find_type_by_name(&state.db, name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!("Type already exists: {}", name)));
        }
    }

    catalog_queries::create_types(&state.db, &names).await?;

    Ok(StatusCode::OK)
}

pub async fn delete_type(
    State(state): State<AppState>,
    Query(params): Query<ReplaceByNameQuery>,
) -> Result<StatusCode> {
    if params.delete == params.replace {
        return Err(AppError::BadRequest(
            "Deleted and replacement type must differ".to_string(),
        ));
    }

    let deleted = catalog_queries::find_type_by_name(&state.db, &params.delete)
        .await?
        .ok_or_else(|| AppError::NotFound("Type not found".to_string()))?;

    let replacement = catalog_queries::find_type_by_name(&state.db, &params.replace)
        .await?
        .ok_or_else(|| AppError::NotFound("Replacement type not found".to_string()))?;

    catalog_queries::replace_and_delete_type(&state.db, deleted.id, replacement.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

//SIZES

pub async fn list_sizes(State(state): State<AppState>) -> Result<Json<Vec<ProductSize>>> {
    let sizes = catalog_queries::list_sizes(&state.db).await?;

    Ok(Json(sizes))
}

pub async fn create_sizes(
    State(state): State<AppState>,
    Json(names): Json<Vec<String>>,
) -> Result<StatusCode> {
    let names = validate_batch_names(&names, "Size")?;

    for name in &names {
        if catalog_queries::find_size_by_name(&state.db, name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!("Size already exists: {}", name)));
        }
    }

    catalog_queries::create_sizes(&state.db, &names).await?;

    Ok(StatusCode::OK)
}

pub async fn delete_size(
    State(state): State<AppState>,
    Query(params): Query<ReplaceByNameQuery>,
) -> Result<StatusCode> {
    if params.delete == params.replace {
        return Err(AppError::BadRequest(
            "Deleted and replacement size must differ".to_string(),
        ));
    }

    let deleted = catalog_queries::find_size_by_name(&state.db, &params.delete)
        .await?
        .ok_or_else(|| AppError::NotFound("Size not found".to_string()))?;

    let replacement = catalog_queries::find_size_by_name(&state.db, &params.replace)
        .await?
        .ok_or_else(|| AppError::NotFound("Replacement size not found".to_string()))?;

    catalog_queries::replace_and_delete_size(&state.db, deleted.id, replacement.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

//COLORS

pub async fn list_colors(State(state): State<AppState>) -> Result<Json<Vec<ProductColor>>> {
    let colors = catalog_queries::list_colors(&state.db).await?;

    Ok(Json(colors))
}

pub async fn create_color(
    State(state): State<AppState>,
    Query(params): Query<CreateColorQuery>,
) -> Result<(StatusCode, Json<ProductColor>)> {
    let name = params.name.trim();

    if name.is_empty() {
        return Err(AppError::BadRequest("Color name must not be blank".to_string()));
    }

    if !validation::is_valid_hex_color(&params.hex) {
        return Err(AppError::BadRequest(
            "Hex color must look like #RRGGBB".to_string(),
        ));
    }

    if catalog_queries::find_color_conflict(&state.db, name, &params.hex)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Color name or hex already exists".to_string(),
        ));
    }

    let color = catalog_queries::create_color(&state.db, name, &params.hex).await?;

    Ok((StatusCode::CREATED, Json(color)))
}

pub async fn delete_color(
    State(state): State<AppState>,
    Json(payload): Json<ReplacementRequest>,
) -> Result<StatusCode> {
    if payload.delete_id == payload.replace_id {
        return Err(AppError::BadRequest(
            "Deleted and replacement color must differ".to_string(),
        ));
    }

    if catalog_queries::find_color_by_id(&state.db, payload.delete_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Color not found".to_string()));
    }

    if catalog_queries::find_color_by_id(&state.db, payload.replace_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Replacement color not found".to_string()));
    }

    catalog_queries::replace_and_delete_color(&state.db, payload.delete_id, payload.replace_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn validate_batch_names<'a>(names: &'a [String], kind: &str) -> Result<Vec<&'a str>> {
    let mut seen = HashSet::new();
    let mut trimmed = Vec::with_capacity(names.len());

    for name in names {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(format!(
                "{} name must not be blank",
                kind
            )));
        }

        if !seen.insert(name) {
            return Err(AppError::Conflict(format!(
                "Duplicate {} name: {}",
                kind.to_lowercase(),
                name
            )));
        }

        trimmed.push(name);
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_names_are_trimmed() {
        let names = vec!["  Shirt ".to_string(), "Pants".to_string()];

        assert_eq!(
            validate_batch_names(&names, "Type").unwrap(),
            vec!["Shirt", "Pants"]
        );
    }

    #[test]
    fn blank_batch_name_is_rejected() {
        let names = vec!["Shirt".to_string(), "   ".to_string()];

        assert!(matches!(
            validate_batch_names(&names, "Type"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn repeated_batch_name_is_a_conflict() {
        let names = vec!["Shirt".to_string(), " Shirt".to_string()];

        assert!(matches!(
            validate_batch_names(&names, "Size"),
            Err(AppError::Conflict(_))
        ));
    }
}
