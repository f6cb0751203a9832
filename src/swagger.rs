use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::anonymous_session,
        handlers::auth::admin_login,
        handlers::raffle::submit,
        handlers::raffle::draw,
        handlers::admin::get_dashboard,
        handlers::admin::dashboard_stream,
        handlers::admin::validate_redeem_code,
        handlers::admin::set_prize_count,
        handlers::admin::purge,
    ),
    components(
        schemas(
            AnonymousSessionResponse,
            AdminLoginRequest,
            AdminLoginResponse,
            SystemInfo,
            SubmitRequest,
            SubmitResponse,
            DrawResult,
            ValidateCodeRequest,
            ValidationResult,
            RedemptionStatus,
            DashboardRow,
            DashboardStats,
            DashboardView,
            SetPrizeCountRequest,
            PrizeCountResponse,
            PurgeRequest,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Anonymous session API"),
        (name = "raffle", description = "Lead capture and prize draw API"),
        (name = "admin", description = "Dashboard, prize pool and redemption API"),
    ),
    info(
        title = "Raffle Backend API",
        version = "0.1.0",
        description = "Lead capture, prize draw and redemption REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_raffle_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/raffle/draw"));
        assert!(doc.paths.paths.contains_key("/admin/dashboard/stream"));
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
