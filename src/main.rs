use oderopay_gateway::api::{self, AppState};
use oderopay_gateway::application::{NotificationGate, PaymentService, StatusReconciler};
use oderopay_gateway::domain::{CALLBACK_ACTION, ReplayTokens};
use oderopay_gateway::infrastructure::{
    GatewayConfig, InMemoryOrderStore, MySqlOrderStore, OderoPayAdapter, StaticCountryDirectory,
};
use oderopay_gateway::ports::OrderStorePort;
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    let config = GatewayConfig::from_env()?;

    // 初始化日志，RUST_LOG 优先
    let default_filter = if config.logging_enabled() {
        "oderopay_gateway=debug,tower_http=debug"
    } else {
        "oderopay_gateway=error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    info!("Starting OderoPay gateway ({:?})...", config.environment());

    for issue in config.check_requirements() {
        warn!("OderoPay setup: {}", issue.message());
    }
    if config.needs_setup() {
        warn!("OderoPay live credentials are not configured");
    }

    let token = ReplayTokens::new(config.token_key()).issue(CALLBACK_ACTION, chrono::Utc::now());
    // 令牌只在12到24小时内有效，不会自动续期
    warn!(
        "Register this webhook URL at OderoPay: {}&_token={}. The token expires within 12-24 hours; \
         after that OderoPay notifications fail the security check until the URL is re-registered \
         with the token logged at the next startup",
        config.webhook_url(),
        token
    );

    // 有 DATABASE_URL 时使用 MySQL，否则使用内存存储
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            info!("Connecting to database...");
            let pool = MySqlPool::connect(&database_url).await?;
            info!("Database connected successfully");
            serve(config, Arc::new(MySqlOrderStore::new(Arc::new(pool)))).await
        }
        Err(_) => {
            warn!("DATABASE_URL not set, using in-memory order store");
            serve(config, Arc::new(InMemoryOrderStore::new())).await
        }
    }
}

async fn serve<S: OrderStorePort>(config: Arc<GatewayConfig>, store: Arc<S>) -> anyhow::Result<()> {
    let processor = Arc::new(OderoPayAdapter::new(config.clone())?);
    info!("OderoPay API: {}", config.api_base_url());

    let reconciler = Arc::new(StatusReconciler::new(store.clone(), config.clone()));
    let notification_gate = Arc::new(NotificationGate::new(
        processor.clone(),
        store.clone(),
        reconciler.clone(),
        config.secret.clone(),
        ReplayTokens::new(config.token_key()),
    ));
    let payment_service = Arc::new(PaymentService::new(
        processor,
        store,
        reconciler,
        Arc::new(StaticCountryDirectory::new()),
        config.clone(),
    ));

    let app = api::create_router(AppState {
        payment_service,
        notification_gate,
    });

    // 启动服务器
    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  GET  /api/gateway - Gateway status");
    info!("  POST /api/orders/:order_id/checkout - Process payment");
    info!("  POST /api/webhooks/oderopay - OderoPay webhook");
    info!("  GET  /wc/odero/:order_id/verify/ - Payment verification");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
