use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::{AppError, Result},
    models::{AdminInformation, ConstructionInfo, ProductDetails, ProductFilterQuery, ProductPage},
    queries::{catalog_queries, product_queries},
    AppState,
};

pub async fn construction_info(State(state): State<AppState>) -> Result<Json<ConstructionInfo>> {
    let types = catalog_queries::list_types(&state.db).await?;
    let colors = catalog_queries::list_colors(&state.db).await?;
    let sizes = catalog_queries::list_sizes(&state.db).await?;

    Ok(Json(ConstructionInfo {
        types,
        colors,
        sizes,
    }))
}

pub async fn admin_information(State(state): State<AppState>) -> Result<Json<AdminInformation>> {
    let types = catalog_queries::list_types(&state.db).await?;
    let colors = catalog_queries::list_colors(&state.db).await?;
    let sizes = catalog_queries::list_sizes(&state.db).await?;
    let attributes = catalog_queries::list_attributes(&state.db).await?;

    Ok(Json(AdminInformation {
        types,
        colors,
        sizes,
        attributes,
    }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetails>> {
    if id < 0 {
        return Err(AppError::BadRequest(
            "Product id must not be negative".to_string(),
        ));
    }

    let details = product_queries::get_details(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(details))
}

pub async fn filter_products(
    State(state): State<AppState>,
    Query(params): Query<ProductFilterQuery>,
) -> Result<Json<ProductPage>> {
    let filter = params.into_filter()?;

    let page = product_queries::filter_products(&state.db, &filter).await?;

    Ok(Json(page))
}
