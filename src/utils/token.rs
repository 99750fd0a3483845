use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;

pub fn issue_token(user_id: Uuid, role: &str, ttl: Duration) -> Result<String> {
    let exp = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| Error::Internal("token expiry overflow".to_string()))?
        .timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        role: Some(role.to_string()),
    };
    let config = crate::config::get_config();
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
}
