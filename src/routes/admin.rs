use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, Result},
    models::{
        parse_price, ImageMetadata, ImagePart, NewImage, NewProduct, ProductDetails, ProductForm,
        ProductType, ProductUpdate, VariantPayload,
    },
    queries::{catalog_queries, product_queries},
    services::image_service,
    AppState,
};

pub async fn create_product(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProductDetails>)> {
    let form = collect_product_form(&mut multipart).await?;

    let (name, type_id, price) = require_scalars(&form)?;
    let variants = validate_variants(form.variants.as_deref())?;

    ensure_known_type(catalog_queries::find_type_by_id(&state.db, type_id).await?)?;

    validate_variant_references(&state, &variants).await?;

    let images = convert_images(&state, form.images, &form.metadata).await?;

    let new_product = NewProduct {
        name,
        type_id,
        description: form.description,
        price,
        attributes: form.attributes,
        variants,
        images,
    };

    let product_id = product_queries::create_product(&state.db, &new_product).await?;

    let details = product_queries::get_details(&state.db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<ProductDetails>> {
    if id < 0 {
        return Err(AppError::BadRequest(
            "Product id must not be negative".to_string(),
        ));
    }

    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let form = collect_product_form(&mut multipart).await?;

    let (name, type_id, price) = require_scalars(&form)?;
    let variants = validate_variants(form.variants.as_deref())?;

    ensure_known_type(catalog_queries::find_type_by_id(&state.db, type_id).await?)?;

    validate_variant_references(&state, &variants).await?;

    let change_colors: Vec<i64> = form
        .image_color_changes
        .iter()
        .filter_map(|change| change.color_id)
        .collect();
    validate_color_ids(&state, change_colors, "image color changes").await?;

    let new_images = convert_images(&state, form.images, &form.metadata).await?;

    let mut delete_images = form.delete_images;
    delete_images.sort_unstable();
    delete_images.dedup();

    let update = ProductUpdate {
        name,
        type_id,
        description: form.description,
        price,
        attributes: form.attributes,
        variants,
        delete_images,
        image_color_changes: form.image_color_changes,
        new_images,
    };

    product_queries::update_product(&state.db, id, &update).await?;

    let details = product_queries::get_details(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(details))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if id < 0 {
        return Err(AppError::BadRequest(
            "Product id must not be negative".to_string(),
        ));
    }

    let deleted = product_queries::delete_product(&state.db, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Reads every multipart part into a form. File parts become pending images
/// keyed by part name; text parts must match a known field.
async fn collect_product_form(multipart: &mut Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart request".to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            return Err(AppError::BadRequest("Unnamed multipart field".to_string()));
        };

        if field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::BadRequest("Unable to read file".to_string()))?
                .to_vec();

            // a file input left blank still arrives as a part, with no bytes
            if data.is_empty() {
                continue;
            }

            form.images.push(ImagePart {
                key: name,
                file_name,
                content_type,
                data,
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|_| AppError::BadRequest("Unable to read field".to_string()))?;

        match name.as_str() {
            "name" => form.name = Some(text),
            "type_id" => {
                form.type_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| AppError::BadRequest("Invalid type id".to_string()))?,
                )
            }
            "description" => form.description = Some(text),
            "price" => form.price = Some(parse_price(&text)?),
            "attributes" => {
                form.attributes = serde_json::from_str(&text).map_err(|_| {
                    AppError::BadRequest("Malformed attributes payload".to_string())
                })?
            }
            "variants" => {
                form.variants = Some(serde_json::from_str(&text).map_err(|_| {
                    AppError::BadRequest("Malformed variants payload".to_string())
                })?)
            }
            "metadata" | "new_image_metadata" => {
                form.metadata = serde_json::from_str(&text).map_err(|_| {
                    AppError::BadRequest("Malformed image metadata payload".to_string())
                })?
            }
            "delete_images" => {
                form.delete_images = serde_json::from_str(&text).map_err(|_| {
                    AppError::BadRequest("Malformed image delete list".to_string())
                })?
            }
            "image_color_changes" => {
                form.image_color_changes = serde_json::from_str(&text).map_err(|_| {
                    AppError::BadRequest("Malformed image color change payload".to_string())
                })?
            }
            _ => {
                return Err(AppError::BadRequest(format!("Unexpected field: {}", name)));
            }
        }
    }

    Ok(form)
}

fn require_scalars(form: &ProductForm) -> Result<(String, i64, Decimal)> {
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("Product name must not be blank".to_string()))?;

    let type_id = form
        .type_id
        .ok_or_else(|| AppError::BadRequest("Missing type id".to_string()))?;

    let price = form
        .price
        .ok_or_else(|| AppError::BadRequest("Missing price".to_string()))?;

    Ok((name.to_string(), type_id, price))
}

fn ensure_known_type(product_type: Option<ProductType>) -> Result<()> {
    if product_type.is_none() {
        return Err(AppError::BadRequest("Unknown product type".to_string()));
    }

    Ok(())
}

fn validate_variants(variants: Option<&[VariantPayload]>) -> Result<Vec<VariantPayload>> {
    let Some(variants) = variants else {
        return Err(AppError::BadRequest("Missing variants".to_string()));
    };

    if variants.is_empty() {
        return Err(AppError::BadRequest(
            "At least one variant is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for variant in variants {
        if variant.quantity < 0 {
            return Err(AppError::BadRequest(
                "Variant quantity must not be negative".to_string(),
            ));
        }

        if !seen.insert((variant.color_id, variant.size_id)) {
            return Err(AppError::BadRequest(
                "Duplicate variant combination".to_string(),
            ));
        }
    }

    Ok(variants.to_vec())
}

async fn validate_variant_references(
    state: &AppState,
    variants: &[VariantPayload],
) -> Result<()> {
    let color_ids: Vec<i64> = variants.iter().map(|variant| variant.color_id).collect();
    validate_color_ids(state, color_ids, "variants").await?;

    let mut size_ids: Vec<i64> = variants.iter().map(|variant| variant.size_id).collect();
    size_ids.sort_unstable();
    size_ids.dedup();

    let sizes = catalog_queries::find_sizes_by_ids(&state.db, &size_ids).await?;
    if sizes.len() != size_ids.len() {
        return Err(AppError::BadRequest("Unknown size id in variants".to_string()));
    }

    Ok(())
}

async fn validate_color_ids(state: &AppState, mut ids: Vec<i64>, source: &str) -> Result<()> {
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(());
    }

    let colors = catalog_queries::find_colors_by_ids(&state.db, &ids).await?;
    if colors.len() != ids.len() {
        return Err(AppError::BadRequest(format!("Unknown color id in {}", source)));
    }

    Ok(())
}

/// Checks every upload against the supported formats, resolves its color
/// through the metadata key map and converts the bytes to webp.
async fn convert_images(
    state: &AppState,
    images: Vec<ImagePart>,
    metadata: &[ImageMetadata],
) -> Result<Vec<NewImage>> {
    let metadata_colors: Vec<i64> = metadata.iter().filter_map(|entry| entry.color_id).collect();
    validate_color_ids(state, metadata_colors, "image metadata").await?;

    if images.is_empty() {
        return Ok(Vec::new());
    }

    let color_by_key: HashMap<&str, Option<i64>> = metadata
        .iter()
        .map(|entry| (entry.key.as_str(), entry.color_id))
        .collect();

    let mut converted = Vec::with_capacity(images.len());
    for image in images {
        if !image_service::is_supported_image(
            image.content_type.as_deref(),
            image.file_name.as_deref(),
        ) {
            return Err(AppError::BadRequest(format!(
                "Unsupported image type: {}",
                image.key
            )));
        }

        let data = image_service::convert_to_webp(&image.data)?;
        let color_id = color_by_key.get(image.key.as_str()).copied().flatten();

        converted.push(NewImage { color_id, data });
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{body::Body, extract::FromRequest, http::Request};
    use sqlx::postgres::PgPoolOptions;

    fn unreachable_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://127.0.0.1:1/unreachable")
            .expect("lazy pool")
    }

    async fn parse_form(body: &'static str, boundary: &str) -> Result<ProductForm> {
        let request = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let mut multipart = Multipart::from_request(request, &())
            .await
            .expect("multipart extractor");

        collect_product_form(&mut multipart).await
    }

    #[test]
    fn unknown_type_id_is_a_bad_request() {
        assert!(matches!(
            ensure_known_type(None),
            Err(AppError::BadRequest(_))
        ));

        let known = ProductType {
            id: 1,
            name: "Shirts".to_string(),
        };
        assert!(ensure_known_type(Some(known)).is_ok());
    }

    #[tokio::test]
    async fn metadata_color_check_runs_without_uploads() {
        let state = AppState {
            db: unreachable_pool(),
        };
        let metadata = vec![ImageMetadata {
            key: "front".to_string(),
            color_id: Some(99),
        }];

        // the color lookup must be attempted even when no files came in
        assert!(convert_images(&state, Vec::new(), &metadata).await.is_err());
    }

    #[tokio::test]
    async fn no_uploads_without_metadata_is_a_no_op() {
        let state = AppState {
            db: unreachable_pool(),
        };

        let converted = convert_images(&state, Vec::new(), &[]).await.unwrap();
        assert!(converted.is_empty());
    }

    #[tokio::test]
    async fn empty_file_parts_are_skipped() {
        let body = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"front\"; filename=\"front.png\"\r\n",
            "Content-Type: image/png\r\n",
            "\r\n",
            "\r\n",
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"name\"\r\n",
            "\r\n",
            "Jacket\r\n",
            "--BOUNDARY--\r\n",
        );

        let form = parse_form(body, "BOUNDARY").await.unwrap();

        assert!(form.images.is_empty());
        assert_eq!(form.name.as_deref(), Some("Jacket"));
    }

    #[tokio::test]
    async fn file_parts_keep_their_part_name() {
        let body = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"front\"; filename=\"f.png\"\r\n",
            "Content-Type: image/png\r\n",
            "\r\n",
            "data\r\n",
            "--BOUNDARY--\r\n",
        );

        let form = parse_form(body, "BOUNDARY").await.unwrap();

        assert_eq!(form.images.len(), 1);
        assert_eq!(form.images[0].key, "front");
        assert_eq!(form.images[0].data, b"data");
    }

    #[tokio::test]
    async fn unexpected_text_field_is_rejected() {
        let body = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"surprise\"\r\n",
            "\r\n",
            "boo\r\n",
            "--BOUNDARY--\r\n",
        );

        assert!(matches!(
            parse_form(body, "BOUNDARY").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
