use std::collections::HashMap;

use base64::Engine;
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, Result},
    models::{
        NewProduct, Product, ProductCard, ProductColor, ProductDetails, ProductFilter,
        ProductImageDto, ProductPage, ProductSize, ProductUpdate, ProductVariant, VariantDto,
        VariantPayload,
    },
    queries::image_queries,
};

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn filter_products(pool: &PgPool, filter: &ProductFilter) -> Result<ProductPage> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, name, description, price, COUNT(*) OVER() as total_count FROM products WHERE 1=1",
    );

    push_filter_conditions(&mut query, filter);

    query.push(" ORDER BY created_at DESC, id DESC");
    query.push(" LIMIT ");
    query.push_bind(filter.size);
    query.push(" OFFSET ");
    query.push_bind(filter.offset());

    #[derive(sqlx::FromRow)]
    struct CardRow {
        id: i64,
        name: String,
        description: Option<String>,
        price: Decimal,
        total_count: i64,
    }

    let rows = query.build_query_as::<CardRow>().fetch_all(pool).await?;

    let total = rows.first().map(|row| row.total_count).unwrap_or(0);

    let product_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut thumbnails = image_queries::newest_per_product(pool, &product_ids).await?;

    let products = rows
        .into_iter()
        .map(|row| ProductCard {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_data: thumbnails.remove(&row.id),
        })
        .collect();

    Ok(ProductPage {
        products,
        total,
        page: filter.page,
        size: filter.size,
    })
}

fn push_filter_conditions(query: &mut QueryBuilder<Postgres>, filter: &ProductFilter) {
    // name substring
    if let Some(ref name) = filter.name {
        query.push(" AND name ILIKE ");
        query.push_bind(format!("%{}%", name));
    }

    // type
    if let Some(type_id) = filter.type_id {
        query.push(" AND type_id = ");
        query.push_bind(type_id);
    }

    // every listed size must be covered by the product's variants
    if !filter.size_ids.is_empty() {
        query.push(" AND id IN (SELECT product_id FROM product_variants WHERE size_id = ANY(");
        query.push_bind(filter.size_ids.clone());
        query.push(") GROUP BY product_id HAVING COUNT(DISTINCT size_id) = ");
        query.push_bind(filter.size_ids.len() as i64);
        query.push(")");
    }

    // same for colors
    if !filter.color_ids.is_empty() {
        query.push(" AND id IN (SELECT product_id FROM product_variants WHERE color_id = ANY(");
        query.push_bind(filter.color_ids.clone());
        query.push(") GROUP BY product_id HAVING COUNT(DISTINCT color_id) = ");
        query.push_bind(filter.color_ids.len() as i64);
        query.push(")");
    }

    // price range
    if let Some(min_price) = filter.min_price {
        query.push(" AND price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        query.push(" AND price <= ");
        query.push_bind(max_price);
    }
}

pub async fn get_details(pool: &PgPool, id: i64) -> Result<Option<ProductDetails>> {
    #[derive(sqlx::FromRow)]
    struct DetailsRow {
        id: i64,
        type_id: i64,
        type_name: String,
        name: String,
        description: Option<String>,
        price: Decimal,
        attributes: Json<Vec<String>>,
    }

    let Some(row) = sqlx::query_as::<_, DetailsRow>(
        r#"
        SELECT p.id, p.type_id, t.name AS type_name, p.name, p.description, p.price, p.attributes
        FROM products p
        JOIN product_types t ON t.id = p.type_id
        WHERE p.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let images = image_queries::find_by_product(pool, id).await?;
    let image_dtos: Vec<ProductImageDto> = images
        .into_iter()
        .map(|image| ProductImageDto {
            id: image.id,
            color_id: image.color_id,
            data: base64::engine::general_purpose::STANDARD.encode(image.image_data),
        })
        .collect();

    let mut images_by_color: HashMap<i64, Vec<String>> = HashMap::new();
    for image in &image_dtos {
        if let Some(color_id) = image.color_id {
            images_by_color
                .entry(color_id)
                .or_default()
                .push(image.data.clone());
        }
    }

    let variants = sqlx::query_as::<_, ProductVariant>(
        "SELECT id, product_id, color_id, size_id, quantity
         FROM product_variants
         WHERE product_id = $1
         ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let variant_dtos: Vec<VariantDto> = variants
        .iter()
        .map(|variant| VariantDto {
            color_id: variant.color_id,
            size_id: variant.size_id,
            quantity: variant.quantity,
        })
        .collect();

    let mut variants_by_color: HashMap<i64, Vec<VariantDto>> = HashMap::new();
    for variant in &variant_dtos {
        variants_by_color
            .entry(variant.color_id)
            .or_default()
            .push(variant.clone());
    }

    let colors = sqlx::query_as::<_, ProductColor>(
        r#"
        SELECT DISTINCT c.id, c.name, c.hex
        FROM product_colors c
        JOIN product_variants v ON v.color_id = c.id
        WHERE v.product_id = $1
        ORDER BY c.id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let sizes = sqlx::query_as::<_, ProductSize>(
        r#"
        SELECT DISTINCT s.id, s.name
        FROM product_sizes s
        JOIN product_variants v ON v.size_id = s.id
        WHERE v.product_id = $1
        ORDER BY s.id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(ProductDetails {
        id: row.id,
        name: row.name,
        type_id: row.type_id,
        type_name: row.type_name,
        description: row.description,
        price: row.price,
        attributes: row.attributes.0,
        images: image_dtos,
        images_by_color,
        variants: variant_dtos,
        variants_by_color,
        colors,
        sizes,
    }))
}

pub async fn create_product(pool: &PgPool, new_product: &NewProduct) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (type_id, name, description, price, attributes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(new_product.type_id)
    .bind(&new_product.name)
    .bind(&new_product.description)
    .bind(new_product.price)
    .bind(Json(&new_product.attributes))
    .fetch_one(&mut *tx)
    .await?;

    if !new_product.attributes.is_empty() {
        sqlx::query(
            "INSERT INTO attributes (name) SELECT UNNEST($1::text[]) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&new_product.attributes)
        .execute(&mut *tx)
        .await?;
    }

    for variant in &new_product.variants {
        sqlx::query(
            "INSERT INTO product_variants (product_id, color_id, size_id, quantity)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(product.id)
        .bind(variant.color_id)
        .bind(variant.size_id)
        .bind(variant.quantity)
        .execute(&mut *tx)
        .await?;
    }

    for image in &new_product.images {
        sqlx::query(
            "INSERT INTO product_images (product_id, color_id, image_data) VALUES ($1, $2, $3)",
        )
        .bind(product.id)
        .bind(image.color_id)
        .bind(&image.data)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(product.id)
}

pub async fn update_product(pool: &PgPool, id: i64, update: &ProductUpdate) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE products
        SET type_id = $1, name = $2, description = $3, price = $4, attributes = $5, updated_at = NOW()
        WHERE id = $6
        "#,
    )
    .bind(update.type_id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.price)
    .bind(Json(&update.attributes))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    if !update.attributes.is_empty() {
        sqlx::query(
            "INSERT INTO attributes (name) SELECT UNNEST($1::text[]) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&update.attributes)
        .execute(&mut *tx)
        .await?;
    }

    // variants: match on (color_id, size_id), update quantities, insert new, drop absent
    let existing = sqlx::query_as::<_, ProductVariant>(
        "SELECT id, product_id, color_id, size_id, quantity FROM product_variants WHERE product_id = $1",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let plan = plan_variant_changes(&existing, &update.variants);

    for (variant_id, quantity) in &plan.update {
        sqlx::query("UPDATE product_variants SET quantity = $1 WHERE id = $2")
            .bind(quantity)
            .bind(variant_id)
            .execute(&mut *tx)
            .await?;
    }

    for variant in &plan.insert {
        sqlx::query(
            "INSERT INTO product_variants (product_id, color_id, size_id, quantity)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(variant.color_id)
        .bind(variant.size_id)
        .bind(variant.quantity)
        .execute(&mut *tx)
        .await?;
    }

    if !plan.delete.is_empty() {
        sqlx::query("DELETE FROM product_variants WHERE id = ANY($1)")
            .bind(&plan.delete)
            .execute(&mut *tx)
            .await?;
    }

    // image workflow: deletions, color changes, then new uploads
    if !update.delete_images.is_empty() {
        let deleted = sqlx::query("DELETE FROM product_images WHERE product_id = $1 AND id = ANY($2)")
            .bind(id)
            .bind(&update.delete_images)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() != update.delete_images.len() as u64 {
            return Err(AppError::NotFound(
                "Image not found for this product".to_string(),
            ));
        }
    }

    for change in &update.image_color_changes {
        let changed =
            sqlx::query("UPDATE product_images SET color_id = $1 WHERE id = $2 AND product_id = $3")
                .bind(change.color_id)
                .bind(change.image_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;

        if changed.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Image not found for this product".to_string(),
            ));
        }
    }

    for image in &update.new_images {
        sqlx::query(
            "INSERT INTO product_images (product_id, color_id, image_data) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(image.color_id)
        .bind(&image.data)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn delete_product(pool: &PgPool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct VariantPlan {
    pub update: Vec<(i64, i32)>,
    pub insert: Vec<VariantPayload>,
    pub delete: Vec<i64>,
}

pub fn plan_variant_changes(
    existing: &[ProductVariant],
    desired: &[VariantPayload],
) -> VariantPlan {
    let mut plan = VariantPlan::default();

    let mut remaining: HashMap<(i64, i64), &ProductVariant> = existing
        .iter()
        .map(|variant| ((variant.color_id, variant.size_id), variant))
        .collect();

    for payload in desired {
        match remaining.remove(&(payload.color_id, payload.size_id)) {
            Some(variant) => {
                if variant.quantity != payload.quantity {
                    plan.update.push((variant.id, payload.quantity));
                }
            }
            None => plan.insert.push(*payload),
        }
    }

    plan.delete = remaining.into_values().map(|variant| variant.id).collect();
    plan.delete.sort_unstable();

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductFilterQuery;

    fn filter_from(query: ProductFilterQuery) -> ProductFilter {
        query.into_filter().unwrap()
    }

    fn sql_for(filter: &ProductFilter) -> String {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        push_filter_conditions(&mut query, filter);
        query.into_sql()
    }

    #[test]
    fn empty_filter_adds_no_predicates() {
        let sql = sql_for(&filter_from(ProductFilterQuery::default()));
        assert_eq!(sql, "SELECT * FROM products WHERE 1=1");
    }

    #[test]
    fn name_becomes_case_insensitive_match() {
        let mut query = ProductFilterQuery::default();
        query.name = Some("shirt".to_string());

        let sql = sql_for(&filter_from(query));
        assert!(sql.contains("name ILIKE $1"));
    }

    #[test]
    fn type_and_prices_become_simple_predicates() {
        let mut query = ProductFilterQuery::default();
        query.type_id = Some(3);
        query.min_price = Some(Decimal::new(10, 0));
        query.max_price = Some(Decimal::new(90, 0));

        let sql = sql_for(&filter_from(query));
        assert!(sql.contains("type_id = $1"));
        assert!(sql.contains("price >= $2"));
        assert!(sql.contains("price <= $3"));
    }

    #[test]
    fn min_price_alone_adds_single_bound() {
        let mut query = ProductFilterQuery::default();
        query.min_price = Some(Decimal::new(10, 0));

        let sql = sql_for(&filter_from(query));
        assert!(sql.contains("price >= $1"));
        assert!(!sql.contains("price <="));
    }

    #[test]
    fn id_lists_require_full_coverage() {
        let mut query = ProductFilterQuery::default();
        query.size_ids = Some("1,2".to_string());
        query.color_ids = Some("5".to_string());

        let sql = sql_for(&filter_from(query));
        assert!(sql.contains("HAVING COUNT(DISTINCT size_id) = $2"));
        assert!(sql.contains("HAVING COUNT(DISTINCT color_id) = $4"));
    }

    #[test]
    fn absent_id_lists_add_no_subqueries() {
        let sql = sql_for(&filter_from(ProductFilterQuery::default()));
        assert!(!sql.contains("product_variants"));
    }

    fn stored(id: i64, color_id: i64, size_id: i64, quantity: i32) -> ProductVariant {
        ProductVariant {
            id,
            product_id: 1,
            color_id,
            size_id,
            quantity,
        }
    }

    fn wanted(color_id: i64, size_id: i64, quantity: i32) -> VariantPayload {
        VariantPayload {
            color_id,
            size_id,
            quantity,
        }
    }

    #[test]
    fn plan_updates_matching_combination() {
        let plan = plan_variant_changes(&[stored(10, 1, 2, 5)], &[wanted(1, 2, 9)]);

        assert_eq!(plan.update, vec![(10, 9)]);
        assert!(plan.insert.is_empty());
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn plan_skips_unchanged_quantities() {
        let plan = plan_variant_changes(&[stored(10, 1, 2, 5)], &[wanted(1, 2, 5)]);

        assert!(plan.update.is_empty());
        assert!(plan.insert.is_empty());
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn plan_inserts_new_combinations() {
        let plan = plan_variant_changes(&[], &[wanted(1, 2, 5)]);

        assert!(plan.update.is_empty());
        assert_eq!(plan.insert, vec![wanted(1, 2, 5)]);
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn plan_deletes_absent_combinations() {
        let plan = plan_variant_changes(&[stored(10, 1, 2, 5), stored(11, 2, 2, 1)], &[]);

        assert!(plan.update.is_empty());
        assert!(plan.insert.is_empty());
        assert_eq!(plan.delete, vec![10, 11]);
    }

    #[test]
    fn plan_handles_mixed_changes() {
        let plan = plan_variant_changes(
            &[stored(10, 1, 1, 5), stored(11, 1, 2, 3), stored(12, 2, 1, 7)],
            &[wanted(1, 1, 6), wanted(1, 3, 2), wanted(1, 2, 3)],
        );

        assert_eq!(plan.update, vec![(10, 6)]);
        assert_eq!(plan.insert, vec![wanted(1, 3, 2)]);
        assert_eq!(plan.delete, vec![12]);
    }
}
