use club_server::{Config, LifecycleOrchestrator, MembershipManager, print_banner};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, working directory, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    club_server::init_logger_with_file(
        &config.log_level,
        config.is_production(),
        Some(&config.log_dir()),
    )?;
    club_server::cleanup_old_logs(&config.log_dir())?;

    print_banner();
    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "Club membership server starting..."
    );

    // 2. Membership engine
    let manager = MembershipManager::new(config.db_path(), config.timezone)?
        .with_default_fee(config.default_fee);

    // 3. Lifecycle orchestrator
    let shutdown = CancellationToken::new();
    let orchestrator = LifecycleOrchestrator::new(manager.clone(), shutdown.clone());
    let orchestrator_handle = tokio::spawn(orchestrator.run());

    // 4. Run until interrupted
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
    let _ = orchestrator_handle.await;

    tracing::info!("Club membership server stopped");
    Ok(())
}
