use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    error::{AppError, Result},
    models::{
        ChangePasswordRequest, TokenResponse, UpdateDetailsRequest, UpdatedDetailsResponse,
        UserDto, UserRole,
    },
    queries::user_queries,
    utils::{
        extractors::extract_user_id,
        jwt::{self, Claims},
        validation,
    },
    AppState,
};

pub async fn get_details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserDto>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserDto::from(user)))
}

pub async fn update_details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateDetailsRequest>,
) -> Result<Json<UpdatedDetailsResponse>> {
    let user_id = extract_user_id(&claims)?;
    let name = payload.name.trim();

    if !validation::is_valid_user_name(name) {
        return Err(AppError::BadRequest("Invalid name".to_string()));
    }

    if !validation::is_valid_email(&payload.email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if payload.role != claims.role && claims.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins can change roles".to_string(),
        ));
    }

    if let Some(existing) = user_queries::find_by_email(&state.db, &payload.email).await? {
        if existing.id != user_id {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
    }

    let user =
        user_queries::update_details(&state.db, user_id, &payload.email, name, payload.role)
            .await?;

    // claims changed, hand the client a fresh token
    let token = jwt::generate_token(&user)?;

    Ok(Json(UpdatedDetailsResponse {
        user: UserDto::from(user),
        token,
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<TokenResponse>> {
    let user_id = extract_user_id(&claims)?;

    if payload.new_password != payload.confirmation_password {
        return Err(AppError::BadRequest(
            "Password confirmation does not match".to_string(),
        ));
    }

    if payload.new_password.trim().is_empty() {
        return Err(AppError::BadRequest("Password must not be blank".to_string()));
    }

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let is_valid = bcrypt::verify(&payload.old_password, &user.password)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(AppError::BadRequest("Old password is incorrect".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    user_queries::update_password(&state.db, user_id, &password_hash).await?;

    let token = jwt::generate_token(&user)?;

    Ok(Json(TokenResponse { token }))
}

pub async fn upload_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<UserDto>> {
    let user_id = extract_user_id(&claims)?;

    let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart request".to_string()))?
    else {
        return Err(AppError::BadRequest("Missing file".to_string()));
    };

    let data = field
        .bytes()
        .await
        .map_err(|_| AppError::BadRequest("Unable to read file".to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Missing file".to_string()));
    }

    let user = user_queries::update_profile_picture(&state.db, user_id, &data).await?;

    Ok(Json(UserDto::from(user)))
}

pub async fn delete_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;

    user_queries::clear_profile_picture(&state.db, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
