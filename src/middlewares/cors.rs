use actix_cors::Cors;

/// 表单页与管理后台可能部署在不同域名下，令牌通过 Authorization 头传递，无需 Cookie
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
