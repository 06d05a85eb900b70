use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Attribute, ProductColor, ProductSize, ProductType},
};

//TYPES

pub async fn list_types(pool: &PgPool) -> Result<Vec<ProductType>> {
    let types = sqlx::query_as::<_, ProductType>("SELECT id, name FROM product_types ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(types)
}

pub async fn find_type_by_name(pool: &PgPool, name: &str) -> Result<Option<ProductType>> {
    let product_type =
        sqlx::query_as::<_, ProductType>("SELECT id, name FROM product_types WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;

    Ok(product_type)
}

pub async fn find_type_by_id(pool: &PgPool, id: i64) -> Result<Option<ProductType>> {
    let product_type =
        sqlx::query_as::<_, ProductType>("SELECT id, name FROM product_types WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(product_type)
}

pub async fn create_types(pool: &PgPool, names: &[&str]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for name in names {
        sqlx::query("INSERT INTO product_types (name) VALUES ($1)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn replace_and_delete_type(pool: &PgPool, delete_id: i64, replace_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE products SET type_id = $1 WHERE type_id = $2")
        .bind(replace_id)
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM product_types WHERE id = $1")
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

//SIZES

pub async fn list_sizes(pool: &PgPool) -> Result<Vec<ProductSize>> {
    let sizes = sqlx::query_as::<_, ProductSize>("SELECT id, name FROM product_sizes ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(sizes)
}

pub async fn find_size_by_name(pool: &PgPool, name: &str) -> Result<Option<ProductSize>> {
    let size = sqlx::query_as::<_, ProductSize>("SELECT id, name FROM product_sizes WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(size)
}

pub async fn find_sizes_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ProductSize>> {
    let sizes =
        sqlx::query_as::<_, ProductSize>("SELECT id, name FROM product_sizes WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(sizes)
}

pub async fn create_sizes(pool: &PgPool, names: &[&str]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for name in names {
        sqlx::query("INSERT INTO product_sizes (name) VALUES ($1)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn replace_and_delete_size(pool: &PgPool, delete_id: i64, replace_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE product_variants SET size_id = $1 WHERE size_id = $2")
        .bind(replace_id)
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM product_sizes WHERE id = $1")
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

//COLORS

pub async fn list_colors(pool: &PgPool) -> Result<Vec<ProductColor>> {
    let colors =
        sqlx::query_as::<_, ProductColor>("SELECT id, name, hex FROM product_colors ORDER BY id")
            .fetch_all(pool)
            .await?;

    Ok(colors)
}

pub async fn find_color_by_id(pool: &PgPool, id: i64) -> Result<Option<ProductColor>> {
    let color =
        sqlx::query_as::<_, ProductColor>("SELECT id, name, hex FROM product_colors WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(color)
}

pub async fn find_colors_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ProductColor>> {
    let colors = sqlx::query_as::<_, ProductColor>(
        "SELECT id, name, hex FROM product_colors WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(colors)
}

pub async fn find_color_conflict(
    pool: &PgPool,
    name: &str,
    hex: &str,
) -> Result<Option<ProductColor>> {
    let color = sqlx::query_as::<_, ProductColor>(
        "SELECT id, name, hex FROM product_colors WHERE name = $1 OR hex = $2",
    )
    .bind(name)
    .bind(hex)
    .fetch_optional(pool)
    .await?;

    Ok(color)
}

pub async fn create_color(pool: &PgPool, name: &str, hex: &str) -> Result<ProductColor> {
    let color = sqlx::query_as::<_, ProductColor>(
        "INSERT INTO product_colors (name, hex) VALUES ($1, $2) RETURNING id, name, hex",
    )
    .bind(name)
    .bind(hex)
    .fetch_one(pool)
    .await?;

    Ok(color)
}

pub async fn replace_and_delete_color(
    pool: &PgPool,
    delete_id: i64,
    replace_id: i64,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE product_variants SET color_id = $1 WHERE color_id = $2")
        .bind(replace_id)
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE product_images SET color_id = $1 WHERE color_id = $2")
        .bind(replace_id)
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM product_colors WHERE id = $1")
        .bind(delete_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

//ATTRIBUTES

pub async fn list_attributes(pool: &PgPool) -> Result<Vec<Attribute>> {
    let attributes = sqlx::query_as::<_, Attribute>("SELECT id, name FROM attributes ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(attributes)
}
