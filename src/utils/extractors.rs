use crate::{
    error::{AppError, Result},
    utils::jwt::Claims,
};

pub fn extract_user_id(claims: &Claims) -> Result<i64> {
    claims.sub.parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Unauthorized".to_string()))
}
