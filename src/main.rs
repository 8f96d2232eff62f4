use clap::Parser;
use ems_notify::core::engine::RunOutcome;
use ems_notify::utils::{logger, validation::Validate};
use ems_notify::{AppConfig, CliConfig, ReportEngine, SmtpNotifier};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ems-notify");

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match AppConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => AppConfig::default(),
    };
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!(
            "❌ Configuration validation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    if cli.verbose {
        tracing::debug!("Effective config: {:?}", config.source);
    }

    let provider = match config.table_provider() {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(
                "❌ Could not set up the status source: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            return;
        }
    };
    let notifier = SmtpNotifier::new(config.smtp_settings(), config.mail.dry_run);

    let engine = ReportEngine::new(
        provider,
        notifier,
        config.lookup(),
        config.layout(),
        &config.recipients.path,
    );

    let summary = engine.run().await;
    match summary.outcome {
        RunOutcome::NoData => tracing::warn!("Finished without data; no report was sent"),
        RunOutcome::Delivered(delivery) => {
            tracing::info!(
                "✅ Finished: {} destinations, delivery {:?}",
                summary.destinations,
                delivery
            )
        }
        RunOutcome::DeliveryFailed(reason) => {
            tracing::warn!("Finished, but the report was not delivered: {}", reason)
        }
    }
}
