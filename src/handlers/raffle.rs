use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

use crate::middlewares::get_identity_from_request;
use crate::models::*;
use crate::services::{DrawService, SubmissionService};

#[utoipa::path(
    post,
    path = "/raffle/submissions",
    tag = "raffle",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "提交成功", body = SubmitResponse),
        (status = 400, description = "请求参数错误"),
        (status = 401, description = "缺少匿名身份"),
        (status = 503, description = "存储暂不可用")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit(
    req: HttpRequest,
    submission_service: web::Data<SubmissionService>,
    request: web::Json<SubmitRequest>,
) -> Result<HttpResponse> {
    let identity = match get_identity_from_request(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match submission_service.submit(&identity, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/raffle/draw",
    tag = "raffle",
    responses(
        (status = 200, description = "抽奖结果 (重复抽奖返回首次结果)", body = DrawResult),
        (status = 401, description = "缺少匿名身份"),
        (status = 503, description = "存储暂不可用，可重试")
    ),
    security(("bearer_auth" = []))
)]
pub async fn draw(req: HttpRequest, draw_service: web::Data<DrawService>) -> Result<HttpResponse> {
    let identity = match get_identity_from_request(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };

    match draw_service.draw(&identity).await {
        Ok(result) => {
            let message = result.message.clone();
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn raffle_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/raffle")
            .route("/submissions", web::post().to(submit))
            .route("/draw", web::post().to(draw)),
    );
}
