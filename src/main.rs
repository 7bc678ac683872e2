use folio::Config;
use folio::db::{AdminSeed, BlogStorage};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        admin_user = %cfg.admin_user,
        insecure_cookie = cfg.insecure_cookie
    );

    if cfg.admin_pass.is_empty() {
        warn!("ADMIN_PASS is empty; a fresh store will seed an admin that cannot log in");
    }
    if cfg.cookie_key.is_none() {
        warn!("COOKIE_KEY not set; sessions will not survive a restart");
    }

    let seed = AdminSeed {
        username: cfg.admin_user.clone(),
        password: cfg.admin_pass.clone(),
    };
    let storage = BlogStorage::connect(&cfg.database_url, &seed).await?;

    let state = folio::router::BlogState::new(storage, cfg.cookie_key(), !cfg.insecure_cookie);
    let app = folio::router::blog_router(state);

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
