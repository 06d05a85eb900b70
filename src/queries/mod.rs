pub mod catalog_queries;
pub mod image_queries;
pub mod product_queries;
pub mod user_queries;
