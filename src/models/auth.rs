use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// 匿名身份令牌 (同一浏览器会话内稳定)，同时作为参与记录的 key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(token: impl Into<String>) -> AppResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::AuthError(
                "Anonymous identity could not be established".to_string(),
            ));
        }
        // 身份会作为存储路径的一段
        if token.contains(['/', '.', '#', '$', '[', ']']) {
            return Err(AppError::AuthError("Malformed anonymous identity".to_string()));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 已通过管理员认证的请求标记 (由中间件注入)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnonymousSessionResponse {
    pub token: String,
    pub identity: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        assert_eq!(Identity::new("a1b2").unwrap().as_str(), "a1b2");
        assert!(matches!(Identity::new(""), Err(AppError::AuthError(_))));
        assert!(matches!(Identity::new("  "), Err(AppError::AuthError(_))));
        assert!(Identity::new("a/b").is_err());
        assert!(Identity::new("a.b").is_err());
    }
}
