use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;

use crate::{
    error::{AppError, Result},
    models::{User, UserRole},
};

const TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub exp: usize,
}

pub fn generate_token(user: &User) -> Result<String> {
    let jwt_secret = env::var("JWT_SECRET")
        .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?;

    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

pub fn verify_token(token: &str) -> Result<Claims> {
    let jwt_secret = env::var("JWT_SECRET")
        .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: 7,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "hash".to_string(),
            role: UserRole::Admin,
            profile_picture: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        env::set_var("JWT_SECRET", "test-secret");

        let token = generate_token(&test_user()).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.name, "Test User");
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn tampered_token_is_rejected() {
        env::set_var("JWT_SECRET", "test-secret");

        let token = generate_token(&test_user()).unwrap();
        let mut tampered = token;
        tampered.push('x');

        assert!(verify_token(&tampered).is_err());
    }
}
