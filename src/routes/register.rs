use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::{AppError, Result},
    models::{RegisterRequest, User},
    queries::user_queries,
    utils::validation,
    AppState,
};

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<StatusCode> {
    validate_registration(&payload)?;

    ensure_email_available(
        user_queries::find_by_email(&state.db, &payload.email)
            .await?
            .as_ref(),
    )?;

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    user_queries::create_user(&state.db, payload.name.trim(), &payload.email, &password_hash)
        .await?;

    Ok(StatusCode::OK)
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be blank".to_string()));
    }

    if !validation::is_valid_email(&payload.email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if payload.password.trim().is_empty() {
        return Err(AppError::BadRequest("Password must not be blank".to_string()));
    }

    Ok(())
}

fn ensure_email_available(existing: Option<&User>) -> Result<()> {
    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Utc;

    fn existing_user() -> User {
        User {
            id: 1,
            name: "Existing".to_string(),
            email: "taken@example.com".to_string(),
            password: "hash".to_string(),
            role: UserRole::User,
            profile_picture: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        assert!(matches!(
            ensure_email_available(Some(&existing_user())),
            Err(AppError::Conflict(_))
        ));

        assert!(ensure_email_available(None).is_ok());
    }

    #[test]
    fn registration_rejects_blank_and_malformed_input() {
        assert!(validate_registration(&request("  ", "a@b.com", "pw")).is_err());
        assert!(validate_registration(&request("Ann", "not-an-email", "pw")).is_err());
        assert!(validate_registration(&request("Ann", "a@b.com", "  ")).is_err());
        assert!(validate_registration(&request("Ann", "a@b.com", "pw")).is_ok());
    }
}
