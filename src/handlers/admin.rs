use std::convert::Infallible;
use std::sync::Arc;

use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpResponse, ResponseError, Result, web};
use futures_util::stream;
use serde_json::json;
use tokio::sync::mpsc;

use crate::models::*;
use crate::services::{AdminService, DashboardCallback, DashboardService, RedemptionService};

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    params(DashboardQuery),
    responses(
        (status = 200, description = "仪表盘视图", body = DashboardView),
        (status = 403, description = "需要管理员令牌")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_dashboard(
    dashboard_service: web::Data<DashboardService>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse> {
    match dashboard_service.get_dashboard().await {
        Ok(view) => {
            let view = if query.masked.unwrap_or(false) {
                view.masked()
            } else {
                view
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

/// 以 SSE 推送仪表盘: 每次重算发送一个 `dashboard` 事件，连接断开即注销订阅
#[utoipa::path(
    get,
    path = "/admin/dashboard/stream",
    tag = "admin",
    params(DashboardQuery),
    responses(
        (status = 200, description = "text/event-stream, 每个事件的 data 为 DashboardView"),
        (status = 403, description = "需要管理员令牌")
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard_stream(
    dashboard_service: web::Data<DashboardService>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse> {
    let masked = query.masked.unwrap_or(false);
    let (tx, rx) = mpsc::unbounded_channel::<DashboardView>();
    let on_view: DashboardCallback = Arc::new(move |view| {
        let _ = tx.send(view);
    });

    let subscription = match dashboard_service.subscribe(on_view).await {
        Ok(subscription) => subscription,
        Err(e) => return Ok(e.error_response()),
    };

    let events = stream::unfold((rx, subscription), move |(mut rx, subscription)| async move {
        let view = rx.recv().await?;
        let view = if masked { view.masked() } else { view };
        let payload = match serde_json::to_string(&view) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to encode dashboard event: {e}");
                return None;
            }
        };
        let frame = web::Bytes::from(format!("event: dashboard\ndata: {payload}\n\n"));
        Some((Ok::<_, Infallible>(frame), (rx, subscription)))
    });

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(events))
}

#[utoipa::path(
    post,
    path = "/admin/redeem-codes/validate",
    tag = "admin",
    request_body = ValidateCodeRequest,
    responses(
        (status = 200, description = "核销结果 (无效码与已核销也返回 200)", body = ValidationResult),
        (status = 400, description = "兑换码长度错误"),
        (status = 503, description = "存储暂不可用")
    ),
    security(("bearer_auth" = []))
)]
pub async fn validate_redeem_code(
    redemption_service: web::Data<RedemptionService>,
    request: web::Json<ValidateCodeRequest>,
) -> Result<HttpResponse> {
    match redemption_service.validate(&request.code).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/prizes",
    tag = "admin",
    request_body = SetPrizeCountRequest,
    responses(
        (status = 200, description = "奖池数量已更新", body = PrizeCountResponse),
        (status = 400, description = "数量不能为负")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_prize_count(
    admin_service: web::Data<AdminService>,
    request: web::Json<SetPrizeCountRequest>,
) -> Result<HttpResponse> {
    match admin_service.set_prize_count(request.remaining).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/purge",
    tag = "admin",
    request_body = PurgeRequest,
    responses(
        (status = 200, description = "已清空提交与参与记录"),
        (status = 400, description = "确认文本不匹配")
    ),
    security(("bearer_auth" = []))
)]
pub async fn purge(
    admin_service: web::Data<AdminService>,
    request: web::Json<PurgeRequest>,
) -> Result<HttpResponse> {
    match admin_service.purge_all_data(&request.confirm).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "All submissions and participants were deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(super::auth::admin_login))
            .route("/dashboard", web::get().to(get_dashboard))
            .route("/dashboard/stream", web::get().to(dashboard_stream))
            .route("/redeem-codes/validate", web::post().to(validate_redeem_code))
            .route("/prizes", web::put().to(set_prize_count))
            .route("/purge", web::post().to(purge)),
    );
}
