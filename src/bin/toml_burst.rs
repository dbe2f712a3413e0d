use anyhow::Context;
use burst_requests::core::ConfigProvider;
use burst_requests::utils::{logger, validation::Validate};
use burst_requests::{completion_exit_code, run_burst, summary_line, TcpConnector, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-burst")]
#[command(about = "Connection burst driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "burst.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override load.tasks
    #[arg(long)]
    tasks: Option<usize>,

    /// Override load.workers
    #[arg(long)]
    workers: Option<usize>,

    /// Show the plan and resolve the target without connecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based burst");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(tasks) = args.tasks {
        config.load.tasks = Some(tasks);
        tracing::info!("🔧 Tasks overridden to: {}", tasks);
    }
    if let Some(workers) = args.workers {
        config.load.workers = Some(workers);
        tracing::info!("🔧 Workers overridden to: {}", workers);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args)?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No connections will be opened");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run_burst(&config, monitor_enabled).await {
        Ok(report) => {
            println!("✅ {}", summary_line(&report));
            let exit_code = completion_exit_code(&report);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Burst failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) -> anyhow::Result<()> {
    let plan = config.plan()?;

    println!("📋 Configuration Summary:");
    println!("  Target: {}", plan.target);
    println!("  Payload: {:?} ({} bytes)", plan.payload.preview(), plan.payload.len());
    println!("  Tasks: {}", plan.tasks);
    println!("  Workers: {}", plan.workers);
    match plan.connect_timeout {
        Some(timeout) => println!("  Connect Timeout: {:?}", timeout),
        None => println!("  Connect Timeout: none"),
    }
    println!("  Await Reply: {}", plan.await_reply);
    println!("  Fail Fast: {}", plan.fail_fast);

    if let Some(path) = config.report_path() {
        println!("  Report: {}", path);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
    Ok(())
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let plan = config.plan()?;

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📡 Resolving {}:", plan.target);

    let addrs = TcpConnector::resolve(&plan.target)
        .await
        .with_context(|| format!("Target {} does not resolve", plan.target))?;
    for addr in &addrs {
        println!("  {}", addr);
    }

    println!();
    println!(
        "⚙️ Would open {} connections, at most {} at a time, sending {} bytes each",
        plan.tasks,
        plan.workers,
        plan.payload.len()
    );
    println!();
    println!("✅ Dry run analysis complete.");

    Ok(())
}
