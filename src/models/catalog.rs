use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductColor {
    pub id: i64,
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSize {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceByNameQuery {
    pub delete: String,
    pub replace: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplacementRequest {
    pub delete_id: i64,
    pub replace_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateColorQuery {
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Serialize)]
pub struct ConstructionInfo {
    pub types: Vec<ProductType>,
    pub colors: Vec<ProductColor>,
    pub sizes: Vec<ProductSize>,
}

#[derive(Debug, Serialize)]
pub struct AdminInformation {
    pub types: Vec<ProductType>,
    pub colors: Vec<ProductColor>,
    pub sizes: Vec<ProductSize>,
    pub attributes: Vec<Attribute>,
}
