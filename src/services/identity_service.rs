use uuid::Uuid;

use crate::error::AppResult;
use crate::models::AnonymousSessionResponse;
use crate::utils::JwtService;

/// 匿名身份签发 (外部身份提供方的本地实现)
#[derive(Clone)]
pub struct IdentityService {
    jwt_service: JwtService,
}

impl IdentityService {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }

    /// 签发新的匿名会话，客户端应在会话内复用返回的令牌
    pub fn issue_anonymous_session(&self) -> AppResult<AnonymousSessionResponse> {
        let identity = Uuid::new_v4().simple().to_string();
        let token = self.jwt_service.generate_session_token(&identity)?;
        log::info!("Issued anonymous identity {identity}");

        Ok(AnonymousSessionResponse {
            token,
            identity,
            expires_in: self.jwt_service.get_session_expires_in(),
        })
    }
}
