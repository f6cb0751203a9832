use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use raffle_backend::{
    config::{Config, StoreBackend},
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    store::{PostgresBackend, SharedStore, TreeStore, memory_store},
    swagger::swagger_config,
    utils::{JwtService, hash_password},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // `raffle-backend hash-password <password>`: 生成 admin.password_hash
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(password) = args.get(2) else {
            eprintln!("usage: raffle-backend hash-password <password>");
            std::process::exit(2);
        };
        let hash = hash_password(password).expect("Failed to hash password");
        println!("{hash}");
        return Ok(());
    }

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 选择存储后端
    let store: SharedStore = match config.store.backend {
        StoreBackend::Memory => {
            log::warn!("Using in-memory store, all data is lost on restart");
            memory_store()
        }
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database)
                .await
                .expect("Failed to create database connection pool");
            run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            Arc::new(TreeStore::new(PostgresBackend::new(pool)))
        }
    };

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.session_expires_in,
        config.jwt.admin_expires_in,
    );

    // 创建服务
    let identity_service = IdentityService::new(jwt_service.clone());
    let submission_service = SubmissionService::new(store.clone());
    let draw_service = DrawService::new(store.clone(), config.raffle.clone());
    let redemption_service = RedemptionService::new(store.clone());
    let dashboard_service = DashboardService::new(store.clone(), config.raffle.initial_prizes);
    let admin_service = AdminService::new(
        store.clone(),
        jwt_service.clone(),
        &config.admin,
        &config.raffle,
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{} (prizes: {}, win probability: {})",
        config.server.host,
        config.server.port,
        config.raffle.initial_prizes,
        config.raffle.win_probability,
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(identity_service.clone()))
            .app_data(web::Data::new(submission_service.clone()))
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(redemption_service.clone()))
            .app_data(web::Data::new(dashboard_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .configure(swagger_config)
            .service(web::scope("/api/v1").configure(handlers::api_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
