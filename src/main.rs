mod alerts;
mod bluetooth;
mod config;
mod display;
mod errors;
mod models;
mod notifications;
mod pipeline;
mod registry;
mod utils;

use log::{error, info, warn};
use time::UtcOffset;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use bluetooth::run_scanner;
use config::MonitorConfig;
use display::{ConsoleOutput, DisplayCompositor, QueuedOutput, SharedOutput};
use notifications::NotificationDispatcher;
use pipeline::Pipeline;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const NOTIFY_GRACE_SECS: u64 = 5;

async fn main_loop(
    config: MonitorConfig,
    local_offset: UtcOffset,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting ATC thermometer monitor");

    let token = CancellationToken::new();

    // Terminal writes go through a worker so rendering never blocks ingestion
    let (queued, output_worker) = QueuedOutput::spawn(Box::new(ConsoleOutput::stdout()));
    let output = SharedOutput::new(Box::new(queued));
    let compositor = DisplayCompositor::new(
        output.clone(),
        config.display,
        config.use_text_pos,
        local_offset,
    );

    let dispatcher = NotificationDispatcher::from_config(&config);
    let mut pipeline = Pipeline::new(&config, compositor, dispatcher);
    pipeline.notify_startup(&config);

    // Handle Ctrl+C gracefully
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Program terminated by user. Exiting gracefully.");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let scanner_token = token.clone();
    let scan_mode = config.scan_mode;
    let scanner = tokio::spawn(async move {
        if let Err(e) = run_scanner(scan_mode, events_tx, scanner_token).await {
            error!("Scan failed: {}", e);
        }
    });

    // Runs until Ctrl+C or until the scanner gives up
    pipeline.run(events_rx, token.clone()).await;

    token.cancel();
    if let Err(e) = scanner.await {
        warn!("Scanner task ended abnormally: {}", e);
    }
    pipeline
        .shutdown(Duration::from_secs(NOTIFY_GRACE_SECS))
        .await;

    output.lock().close();
    if let Err(e) = output_worker.await {
        warn!("Output worker ended abnormally: {}", e);
    }

    info!(
        "Stopped after seeing {} device(s)",
        pipeline.registry().len()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only reliable while the process is still single-threaded
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    // Load configuration
    let config = MonitorConfig::new();

    // Initialize logging
    let level = match &config {
        Ok(config) if config.debug => log::LevelFilter::Debug,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match main_loop(config, local_offset).await {
            Ok(_) => info!("Program completed successfully"),
            Err(e) => error!("Fatal error: {}", e),
        }
    });

    Ok(())
}
