use firmware_publisher::{Config, ConfigError, PublishReport, PublisherError};
use mimalloc::MiMalloc;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing("info");
            error!(error = %e, "Error: could not load configuration.");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&cfg.log_level);

    let settings = match cfg.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Error: {e}");
            if matches!(e, ConfigError::Missing(_)) {
                error!("Required: SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY, FIRMWARE_PATH");
            }
            return ExitCode::FAILURE;
        }
    };

    info!(
        supabase_url = %settings.backend.url,
        proxy = %settings.backend.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        firmware_path = %settings.artifact.file_path.display(),
        firmware_type = %settings.artifact.firmware_type,
        version = %settings.artifact.version,
        bucket = %settings.artifact.bucket,
        "Publisher config loaded"
    );

    match firmware_publisher::publish(&settings).await {
        Ok(report) => {
            log_success(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();
}

fn log_success(report: &PublishReport) {
    info!("Firmware uploaded and registered successfully!");
    info!("Version: {}", report.registration.record.version);
    info!("Storage Path: {}", report.artifact.path);
    info!(
        user_id = %report.attribution.user_id,
        source = %report.attribution.source,
        "Attributed to"
    );
    match serde_json::to_string_pretty(&report.registration.inserted) {
        Ok(rows) => info!("Inserted record:\n{rows}"),
        Err(e) => info!(error = %e, "Inserted record could not be rendered"),
    }
}

fn log_failure(e: &PublisherError) {
    match e.upstream_status() {
        Some(status) => error!(phase = %e.phase(), %status, "Deployment failed: {e}"),
        None => error!(phase = %e.phase(), "Deployment failed: {e}"),
    }
}
