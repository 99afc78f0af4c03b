use clap::Parser;
use trade_balance::utils::{logger, validation::Validate};
use trade_balance::{CliConfig, DashboardPipeline, LocalStorage, ReportEngine, TradeError};

fn fail(e: &TradeError) -> ! {
    tracing::error!(
        "Report failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting trade-balance");
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.monitor {
        tracing::info!("System monitoring enabled");
    }

    // Paths in the config are already joined with their directories.
    let storage = LocalStorage::new(".".to_string());
    let pipeline = DashboardPipeline::new(storage, config);
    let engine = ReportEngine::new_with_monitoring(pipeline, cli.monitor);

    match engine.run().await {
        Ok(destination) if destination != "stdout" => {
            eprintln!("Bundle saved to: {}", destination);
        }
        Ok(_) => {}
        Err(e) => fail(&e),
    }

    Ok(())
}
