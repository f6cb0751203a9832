use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::{AdminService, IdentityService};

#[utoipa::path(
    post,
    path = "/auth/anonymous",
    tag = "auth",
    responses(
        (status = 200, description = "签发匿名会话", body = AnonymousSessionResponse),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn anonymous_session(
    identity_service: web::Data<IdentityService>,
) -> Result<HttpResponse> {
    match identity_service.issue_anonymous_session() {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "登录成功", body = AdminLoginResponse),
        (status = 401, description = "密码错误")
    )
)]
pub async fn admin_login(
    admin_service: web::Data<AdminService>,
    request: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse> {
    // bcrypt 校验较慢，放到阻塞线程池
    let admin_service = admin_service.into_inner();
    let password = request.into_inner().password;
    let result = web::block(move || admin_service.login(&password)).await?;

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").route("/anonymous", web::post().to(anonymous_session)));
}
