pub mod admin;
pub mod auth;
pub mod raffle;

pub use admin::admin_config;
pub use auth::auth_config;
pub use raffle::raffle_config;

use actix_web::web;

/// 挂载在 `/api/v1` 下的全部路由
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth_config)
        .configure(raffle_config)
        .configure(admin_config);
}
