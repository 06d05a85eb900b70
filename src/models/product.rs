use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::{
    error::{AppError, Result},
    models::{ProductColor, ProductSize},
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub type_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub attributes: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub color_id: i64,
    pub size_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i64,
    pub color_id: Option<i64>,
    pub image_data: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilterQuery {
    pub name: Option<String>,
    pub type_id: Option<i64>,
    pub size_ids: Option<String>,
    pub color_ids: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Validated filter parameters with id lists parsed and paging normalized.
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub type_id: Option<i64>,
    pub size_ids: Vec<i64>,
    pub color_ids: Vec<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: i64,
    pub size: i64,
}

impl ProductFilter {
    /// Row offset for the page, saturating so oversized page numbers
    /// cannot overflow the multiply.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

impl ProductFilterQuery {
    pub fn into_filter(self) -> Result<ProductFilter> {
        let name = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        if let Some(type_id) = self.type_id {
            if type_id < 0 {
                return Err(AppError::BadRequest(
                    "Type id must not be negative".to_string(),
                ));
            }
        }

        let size_ids = parse_id_list(self.size_ids.as_deref())?;
        let color_ids = parse_id_list(self.color_ids.as_deref())?;

        if self.min_price.is_some_and(|price| price < Decimal::ZERO)
            || self.max_price.is_some_and(|price| price < Decimal::ZERO)
        {
            return Err(AppError::BadRequest(
                "Prices must not be negative".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::BadRequest(
                    "Minimum price must not exceed maximum price".to_string(),
                ));
            }
        }

        let page = self.page.unwrap_or(0).max(0);

        let size = match self.size {
            Some(size) if size > 0 && size <= MAX_PAGE_SIZE => size,
            _ => DEFAULT_PAGE_SIZE,
        };

        Ok(ProductFilter {
            name,
            type_id: self.type_id,
            size_ids,
            color_ids,
            min_price: self.min_price,
            max_price: self.max_price,
            page,
            size,
        })
    }
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let id: i64 = part
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid id in list: {}", part)))?;
        if id < 0 {
            return Err(AppError::BadRequest("Ids must not be negative".to_string()));
        }
        ids.push(id);
    }

    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

pub fn parse_price(raw: &str) -> Result<Decimal> {
    let price: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid price".to_string()))?;

    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("Price must be positive".to_string()));
    }

    Ok(price.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity))
}

#[derive(Debug, Serialize)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductCard>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductImageDto {
    pub id: i64,
    pub color_id: Option<i64>,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantDto {
    pub color_id: i64,
    pub size_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductDetails {
    pub id: i64,
    pub name: String,
    pub type_id: i64,
    pub type_name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub attributes: Vec<String>,
    pub images: Vec<ProductImageDto>,
    pub images_by_color: HashMap<i64, Vec<String>>,
    pub variants: Vec<VariantDto>,
    pub variants_by_color: HashMap<i64, Vec<VariantDto>>,
    pub colors: Vec<ProductColor>,
    pub sizes: Vec<ProductSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VariantPayload {
    pub color_id: i64,
    pub size_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageMetadata {
    pub key: String,
    pub color_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ImageColorChange {
    pub image_id: i64,
    pub color_id: Option<i64>,
}

/// A raw uploaded file part, keyed by its multipart part name.
#[derive(Debug)]
pub struct ImagePart {
    pub key: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Everything a product create/update multipart request can carry.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub type_id: Option<i64>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub attributes: Vec<String>,
    pub variants: Option<Vec<VariantPayload>>,
    pub metadata: Vec<ImageMetadata>,
    pub delete_images: Vec<i64>,
    pub image_color_changes: Vec<ImageColorChange>,
    pub images: Vec<ImagePart>,
}

/// An image already converted to webp, ready for storage.
#[derive(Debug)]
pub struct NewImage {
    pub color_id: Option<i64>,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub type_id: i64,
    pub description: Option<String>,
    pub price: Decimal,
    pub attributes: Vec<String>,
    pub variants: Vec<VariantPayload>,
    pub images: Vec<NewImage>,
}

#[derive(Debug)]
pub struct ProductUpdate {
    pub name: String,
    pub type_id: i64,
    pub description: Option<String>,
    pub price: Decimal,
    pub attributes: Vec<String>,
    pub variants: Vec<VariantPayload>,
    pub delete_images: Vec<i64>,
    pub image_color_changes: Vec<ImageColorChange>,
    pub new_images: Vec<NewImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_query() -> ProductFilterQuery {
        ProductFilterQuery::default()
    }

    #[test]
    fn filter_defaults() {
        let filter = empty_query().into_filter().unwrap();

        assert_eq!(filter.name, None);
        assert_eq!(filter.type_id, None);
        assert!(filter.size_ids.is_empty());
        assert!(filter.color_ids.is_empty());
        assert_eq!(filter.page, 0);
        assert_eq!(filter.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn filter_trims_name_and_drops_blank() {
        let mut query = empty_query();
        query.name = Some("  shirt ".to_string());
        assert_eq!(query.into_filter().unwrap().name.as_deref(), Some("shirt"));

        let mut query = empty_query();
        query.name = Some("   ".to_string());
        assert_eq!(query.into_filter().unwrap().name, None);
    }

    #[test]
    fn filter_rejects_negative_type_id() {
        let mut query = empty_query();
        query.type_id = Some(-1);

        assert!(matches!(
            query.into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn filter_parses_and_dedups_id_lists() {
        let mut query = empty_query();
        query.size_ids = Some("3, 1,2,3".to_string());
        query.color_ids = Some("".to_string());

        let filter = query.into_filter().unwrap();
        assert_eq!(filter.size_ids, vec![1, 2, 3]);
        assert!(filter.color_ids.is_empty());
    }

    #[test]
    fn filter_rejects_malformed_id_list() {
        let mut query = empty_query();
        query.size_ids = Some("1,x,3".to_string());

        assert!(matches!(
            query.into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn filter_rejects_negative_ids_in_list() {
        let mut query = empty_query();
        query.color_ids = Some("1,-2".to_string());

        assert!(matches!(
            query.into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn filter_size_falls_back_when_out_of_range() {
        for raw in [0, -5, MAX_PAGE_SIZE + 1] {
            let mut query = empty_query();
            query.size = Some(raw);
            assert_eq!(query.into_filter().unwrap().size, DEFAULT_PAGE_SIZE);
        }

        let mut query = empty_query();
        query.size = Some(MAX_PAGE_SIZE);
        assert_eq!(query.into_filter().unwrap().size, MAX_PAGE_SIZE);
    }

    #[test]
    fn filter_negative_page_falls_back_to_zero() {
        let mut query = empty_query();
        query.page = Some(-1);

        assert_eq!(query.into_filter().unwrap().page, 0);
    }

    #[test]
    fn offset_saturates_for_huge_pages() {
        let mut query = empty_query();
        query.page = Some(2);
        assert_eq!(query.into_filter().unwrap().offset(), 2 * DEFAULT_PAGE_SIZE);

        let mut query = empty_query();
        query.page = Some(i64::MAX / 2);
        query.size = Some(MAX_PAGE_SIZE);
        assert_eq!(query.into_filter().unwrap().offset(), i64::MAX);
    }

    #[test]
    fn filter_rejects_inverted_price_range() {
        let mut query = empty_query();
        query.min_price = Some(Decimal::new(100, 0));
        query.max_price = Some(Decimal::new(50, 0));

        assert!(matches!(
            query.into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn filter_rejects_negative_prices() {
        let mut query = empty_query();
        query.min_price = Some(Decimal::new(-1, 0));

        assert!(matches!(
            query.into_filter(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn price_is_floored_to_two_decimals() {
        assert_eq!(parse_price("19.999").unwrap(), Decimal::new(1999, 2));
        assert_eq!(parse_price(" 7 ").unwrap(), Decimal::new(7, 0));
    }

    #[test]
    fn price_must_be_positive() {
        assert!(parse_price("0").is_err());
        assert!(parse_price("-3.50").is_err());
        assert!(parse_price("abc").is_err());
    }

    #[test]
    fn variant_payload_parses_from_json() {
        let parsed: Vec<VariantPayload> =
            serde_json::from_str(r#"[{"color_id": 1, "size_id": 2, "quantity": 5}]"#).unwrap();

        assert_eq!(
            parsed,
            vec![VariantPayload {
                color_id: 1,
                size_id: 2,
                quantity: 5
            }]
        );
    }

    #[test]
    fn image_metadata_allows_null_color() {
        let parsed: Vec<ImageMetadata> =
            serde_json::from_str(r#"[{"key": "front", "color_id": null}]"#).unwrap();

        assert_eq!(parsed[0].key, "front");
        assert_eq!(parsed[0].color_id, None);
    }

    #[test]
    fn image_metadata_rejects_malformed_payload() {
        let parsed = serde_json::from_str::<Vec<ImageMetadata>>(r#"[{"key": 12}]"#);
        assert!(parsed.is_err());
    }
}
