use sqlx::PgPool;

use crate::{
    error::Result,
    models::{User, UserRole},
};

pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn update_details(
    pool: &PgPool,
    id: i64,
    email: &str,
    name: &str,
    role: UserRole,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET email = $1, name = $2, role = $3, updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(name)
    .bind(role)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_profile_picture(pool: &PgPool, id: i64, data: &[u8]) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET profile_picture = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(data)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn clear_profile_picture(pool: &PgPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET profile_picture = NULL, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
