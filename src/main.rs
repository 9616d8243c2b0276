mod cli;

use cli::{Args, Command, DaemonArgs, ScanArgs};
use owo_colors::OwoColorize;
use scanguard::adapters::outbound::clock::SystemClock;
use scanguard::adapters::outbound::console::StderrProgressReporter;
use scanguard::adapters::outbound::filesystem::{FileSystemReader, JsonFileRepository};
use scanguard::adapters::outbound::harness::SeverityWeightedHarness;
use scanguard::adapters::outbound::memory::InMemoryRepository;
use scanguard::adapters::outbound::network::ReqwestWebhookTransport;
use scanguard::application::dto::ScanReport;
use scanguard::application::factories::{FormatterFactory, PresenterFactory, PresenterType};
use scanguard::application::services::{RetryPolicy, ScanScheduler, WebhookDispatcher};
use scanguard::application::use_cases::ScanEngine;
use scanguard::config::{self, ConfigFile, Settings};
use scanguard::logging;
use scanguard::ports::inbound::ScanRequest;
use scanguard::ports::outbound::{Clock, Repository};
use scanguard::scan_orchestration::domain::{
    Entity, ScanResult, ScanSeverity, ScanStatus, ScheduledScan, Webhook,
};
use scanguard::shared::error::ExitCode;
use scanguard::shared::Result;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    // clap exits with code 2 on invalid arguments
    let args = Args::parse_args();
    logging::initialize_logging(args.verbose);

    match run(args).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    match args.command {
        Command::Scan(scan_args) => run_scan(scan_args, &config).await,
        Command::Daemon(daemon_args) => run_daemon(daemon_args, &config).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => {
            let config = config::load_config_from_path(path)?;
            eprintln!("📄 Loaded config from: {}", path.display());
            Ok(config)
        }
        None => match config::discover_config(&std::env::current_dir()?)? {
            Some(config) => {
                eprintln!("📄 Auto-discovered config file: {}", config::CONFIG_FILENAME);
                Ok(config)
            }
            None => Ok(ConfigFile::default()),
        },
    }
}

/// JSON files under `storage_dir` when configured, process memory otherwise
fn repository<T: Entity>(settings: &Settings) -> Arc<dyn Repository<T>> {
    match &settings.storage_dir {
        Some(dir) => Arc::new(JsonFileRepository::<T>::new(dir)),
        None => Arc::new(InMemoryRepository::<T>::new()),
    }
}

/// Builds the dispatcher and registers configured endpoints not already stored
async fn build_dispatcher(
    config: &ConfigFile,
    settings: &Settings,
    clock: Arc<dyn Clock>,
) -> Result<Arc<WebhookDispatcher>> {
    let transport = Arc::new(ReqwestWebhookTransport::with_timeout(settings.webhook_timeout)?);
    let dispatcher = WebhookDispatcher::new(transport, repository::<Webhook>(settings), clock)
        .with_retry(RetryPolicy {
            max_attempts: settings.webhook_max_attempts,
            backoff: settings.webhook_retry_backoff,
        });
    dispatcher.init().await?;

    for endpoint in config.endpoints() {
        if dispatcher.list().iter().any(|w| w.url == endpoint.url) {
            continue;
        }
        let webhook = dispatcher
            .register(&endpoint.url, endpoint.events.clone(), endpoint.secret.clone())
            .await?;
        info!(webhook_id = %webhook.id, url = %webhook.url, "webhook registered from config");
    }
    Ok(Arc::new(dispatcher))
}

async fn run_scan(args: ScanArgs, config: &ConfigFile) -> Result<ExitCode> {
    let settings = config.settings();
    let scan_config = args.scan_config(settings.scan.clone());

    let mut request = ScanRequest::new(args.target.clone(), args.scan_type, scan_config);
    if let Some(path) = &args.content_file {
        request = request.with_content(FileSystemReader::new().read_content(path)?);
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let results = repository::<ScanResult>(&settings);
    let mut engine = ScanEngine::with_harness(SeverityWeightedHarness::new(), clock.clone())
        .with_progress(Arc::new(StderrProgressReporter::new()))
        .with_results(results.clone());
    if !config.endpoints().is_empty() {
        engine = engine.with_events(build_dispatcher(config, &settings, clock).await?);
    }

    eprintln!("🔍 Scanning {} ({})...", args.target, args.scan_type);
    let result = engine.execute(request).await?;
    engine.flush_events().await;

    let history: Vec<ScanResult> = results
        .load_all()
        .await?
        .into_iter()
        .filter(|past| past.target == result.target && past.scan_type == result.scan_type)
        .collect();
    let report = ScanReport::new(result, &history);

    eprintln!("{}", FormatterFactory::progress_message(args.format));
    let formatted = FormatterFactory::create(args.format).format(&report)?;
    PresenterFactory::create(PresenterType::from(args.output.clone())).present(&formatted)?;

    print_verdict(&report.result);
    Ok(exit_code_for(&report.result, args.fail_on.or(settings.fail_on)))
}

fn print_verdict(result: &ScanResult) {
    let label = result.severity.as_str().to_uppercase();
    let label = match result.severity {
        ScanSeverity::Critical | ScanSeverity::High => label.red().bold().to_string(),
        ScanSeverity::Medium => label.yellow().bold().to_string(),
        ScanSeverity::Low | ScanSeverity::Clean => label.green().bold().to_string(),
    };
    eprintln!(
        "Verdict: {} (risk {}/100, {} finding(s))",
        label,
        result.risk_score,
        result.vulnerabilities.len()
    );
}

/// Failed scans are application errors; otherwise `fail_on` decides
fn exit_code_for(result: &ScanResult, fail_on: Option<ScanSeverity>) -> ExitCode {
    if result.status == ScanStatus::Failed {
        return ExitCode::ApplicationError;
    }
    match fail_on {
        Some(threshold)
            if result.severity != ScanSeverity::Clean && result.severity >= threshold =>
        {
            ExitCode::RiskThresholdExceeded
        }
        _ => ExitCode::Success,
    }
}

async fn run_daemon(args: DaemonArgs, config: &ConfigFile) -> Result<ExitCode> {
    let settings = config.settings();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let dispatcher = build_dispatcher(config, &settings, clock.clone()).await?;
    let engine = Arc::new(
        ScanEngine::with_harness(SeverityWeightedHarness::new(), clock.clone())
            .with_events(dispatcher.clone())
            .with_results(repository::<ScanResult>(&settings)),
    );

    let scheduler = Arc::new(
        ScanScheduler::new(
            engine.clone(),
            repository::<ScheduledScan>(&settings),
            clock,
        )
        .with_events(dispatcher)
        .with_max_concurrent(settings.max_concurrent_scans),
    );
    scheduler.init().await?;

    for entry in &config.schedules {
        let exists = scheduler
            .list()
            .iter()
            .any(|s| s.target == entry.target && s.scan_type == entry.scan_type);
        if exists {
            continue;
        }
        let scheduled = scheduler
            .create(
                &entry.target,
                entry.scan_type,
                settings.scan.clone(),
                entry.schedule_config(),
            )
            .await?;
        eprintln!(
            "📅 Scheduled {} ({}), next run {}",
            scheduled.target, scheduled.scan_type, scheduled.next_run
        );
    }

    if args.once {
        let ran = scheduler.tick().await;
        eprintln!("✅ Scheduler tick finished: {} scan(s) run", ran);
        scheduler.flush_events().await;
        engine.flush_events().await;
        return Ok(ExitCode::Success);
    }

    let interval = args
        .tick_interval
        .filter(|secs| *secs > 0)
        .map_or(settings.tick_interval, std::time::Duration::from_secs);
    eprintln!(
        "⏱️  Scheduler running with {} schedule(s), checking every {}s (Ctrl+C to stop)",
        scheduler.list().len(),
        interval.as_secs()
    );
    let handle = scheduler.start(interval);

    tokio::signal::ctrl_c().await?;
    eprintln!("\n🛑 Shutting down scheduler...");
    scheduler.shutdown();
    handle.await?;
    scheduler.flush_events().await;
    engine.flush_events().await;
    Ok(ExitCode::Success)
}
