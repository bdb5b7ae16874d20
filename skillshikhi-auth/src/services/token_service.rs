use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use skillshikhi_shared::errors::AppError;
use skillshikhi_shared::types::auth::{Claims, TokenPair, UserRole};

pub fn create_access_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, role, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn create_refresh_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn create_token_pair(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    access_ttl: i64,
) -> Result<(TokenPair, String), AppError> {
    let access_token = create_access_token(user_id, role, secret, access_ttl)?;
    let refresh_token = create_refresh_token();
    let refresh_hash = hash_token(&refresh_token);
    let pair = TokenPair::new(access_token, refresh_token, access_ttl);
    Ok((pair, refresh_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|d| d.claims)
    }

    #[test]
    fn access_token_round_trip() {
        let user_id = Uuid::now_v7();
        let token = create_access_token(user_id, UserRole::Admin, "test-secret", 900).unwrap();
        let claims = decode_claims(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.is_admin());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_access_token(Uuid::now_v7(), UserRole::User, "secret-a", 900).unwrap();
        assert!(decode_claims(&token, "secret-b").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_access_token(Uuid::now_v7(), UserRole::User, "test-secret", -120).unwrap();
        assert!(decode_claims(&token, "test-secret").is_err());
    }

    #[test]
    fn refresh_token_hash_is_stable() {
        let refresh = create_refresh_token();
        assert_eq!(refresh.len(), 64);
        assert_eq!(hash_token(&refresh), hash_token(&refresh));
        assert_ne!(hash_token(&refresh), refresh);
    }
}
