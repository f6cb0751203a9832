use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const SESSION_TOKEN: &str = "session";
pub const ADMIN_TOKEN: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 匿名身份 (session) 或 "admin"
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "session" or "admin"
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expires_in: i64,
    admin_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, session_expires_in: i64, admin_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_expires_in,
            admin_expires_in,
        }
    }

    fn generate(&self, sub: &str, token_type: &str, expires_in: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: sub.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    /// 为匿名身份签发会话令牌
    pub fn generate_session_token(&self, identity: &str) -> AppResult<String> {
        self.generate(identity, SESSION_TOKEN, self.session_expires_in)
    }

    pub fn generate_admin_token(&self) -> AppResult<String> {
        self.generate(ADMIN_TOKEN, ADMIN_TOKEN, self.admin_expires_in)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_session_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != SESSION_TOKEN || claims.sub.is_empty() {
            return Err(AppError::AuthError("Invalid session token".to_string()));
        }

        Ok(claims)
    }

    pub fn verify_admin_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != ADMIN_TOKEN {
            return Err(AppError::Forbidden);
        }

        Ok(claims)
    }

    pub fn get_session_expires_in(&self) -> i64 {
        self.session_expires_in
    }

    pub fn get_admin_expires_in(&self) -> i64 {
        self.admin_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_round_trip() {
        let jwt = JwtService::new("secret", 3600, 600);
        let token = jwt.generate_session_token("anon-123").unwrap();
        let claims = jwt.verify_session_token(&token).unwrap();
        assert_eq!(claims.sub, "anon-123");
        assert_eq!(claims.token_type, SESSION_TOKEN);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt = JwtService::new("secret", 3600, 600);
        let session = jwt.generate_session_token("anon-123").unwrap();
        let admin = jwt.generate_admin_token().unwrap();

        assert!(matches!(
            jwt.verify_admin_token(&session),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            jwt.verify_session_token(&admin),
            Err(AppError::AuthError(_))
        ));
        assert!(jwt.verify_admin_token(&admin).is_ok());
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let issuer = JwtService::new("one", 3600, 600);
        let verifier = JwtService::new("two", 3600, 600);
        let token = issuer.generate_session_token("anon").unwrap();
        assert!(matches!(
            verifier.verify_session_token(&token),
            Err(AppError::JwtError(_))
        ));
    }
}
