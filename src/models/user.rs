use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub profile_picture: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub profile_picture: Option<String>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            email: user.email,
            role: user.role,
            profile_picture: user
                .profile_picture
                .map(|data| base64::engine::general_purpose::STANDARD.encode(data)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct UpdatedDetailsResponse {
    pub user: UserDto,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirmation_password: String,
}
