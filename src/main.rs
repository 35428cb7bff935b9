use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dossier::{
    analysis::{anthropic::AnthropicAnalyzer, DocumentAnalyzer, HeuristicAnalyzer},
    config::{check::validate_process_env, Config},
    db::Database,
    services::{captcha::CaptchaVerifier, file_service::FileService, notifications::EmailNotifier},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let report = validate_process_env();
    for issue in report.errors.iter().chain(report.warnings.iter()) {
        warn!("Environment: {} {}", issue.variable, issue.message);
    }

    let db = Database::new(&config.database_url).await?;

    info!("Running SQLx migrations...");
    let migrations = sqlx::migrate!("./migrations");
    info!("Found {} migrations", migrations.migrations.len());
    if let Err(e) = migrations.run(&db.pool).await {
        error!("Failed to run SQLx migrations: {}", e);
        return Err(e.into());
    }
    info!("SQLx migrations completed successfully");

    FileService::new(config.upload_path.clone())
        .initialize_directory_structure()
        .await?;

    let analyzer: Arc<dyn DocumentAnalyzer> = match AnthropicAnalyzer::from_config(&config) {
        Some(analyzer) => Arc::new(analyzer),
        None => {
            warn!("ANTHROPIC_API_KEY not set, using the local heuristic analyzer");
            Arc::new(HeuristicAnalyzer)
        }
    };
    info!("Document analyzer: {}", analyzer.name());

    let notifier = EmailNotifier::from_config(&config);
    if notifier.is_none() {
        info!("RESEND_API_KEY not set, email notifications are disabled");
    }
    let captcha = CaptchaVerifier::from_config(&config);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        analyzer,
        notifier,
        captcha,
    });

    let app = dossier::create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!("Server starting on {}", config.server_address);

    axum::serve(listener, app).await?;

    Ok(())
}
