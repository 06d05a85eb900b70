use std::collections::HashMap;

use base64::Engine;
use sqlx::PgPool;

use crate::{error::Result, models::ProductImage};

pub async fn find_by_product(pool: &PgPool, product_id: i64) -> Result<Vec<ProductImage>> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT id, color_id, image_data FROM product_images WHERE product_id = $1 ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(images)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<ProductImage>> {
    let image = sqlx::query_as::<_, ProductImage>(
        "SELECT id, color_id, image_data FROM product_images WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(image)
}

/// Newest image per product, base64-encoded for the card listing.
pub async fn newest_per_product(
    pool: &PgPool,
    product_ids: &[i64],
) -> Result<HashMap<i64, String>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    #[derive(sqlx::FromRow)]
    struct ThumbnailRow {
        product_id: i64,
        image_data: Vec<u8>,
    }

    let rows = sqlx::query_as::<_, ThumbnailRow>(
        r#"
        SELECT DISTINCT ON (product_id) product_id, image_data
        FROM product_images
        WHERE product_id = ANY($1)
        ORDER BY product_id, id DESC
        "#,
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    let mut thumbnails = HashMap::new();
    for row in rows {
        thumbnails.insert(
            row.product_id,
            base64::engine::general_purpose::STANDARD.encode(row.image_data),
        );
    }

    Ok(thumbnails)
}
