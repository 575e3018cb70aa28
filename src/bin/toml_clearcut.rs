use clap::Parser;
use clearcut::utils::validation::{validate_file_extensions, Validate, INPUT_IMAGE_EXTENSIONS};
use clearcut::utils::logger;
use clearcut::{AnyRemover, BackgroundRemover, ConfigProvider, CutoutEngine, LocalWorkspace, TomlConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toml-clearcut")]
#[command(about = "Batch background removal with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "clearcut.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,

    /// Images to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init(config.log_format(), config.log_level(), args.verbose);

    tracing::info!("🚀 Starting TOML-based clearcut batch");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config
        .validate()
        .and_then(|_| validate_file_extensions("inputs", args.inputs.as_slice(), INPUT_IMAGE_EXTENSIONS))
    {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let options = config.export_options().clone();
    // 同名輸入在這裡就分配好不重複的輸出路徑
    let destinations = options.cutout_destinations(config.output_dir(), &args.inputs);

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        for (input, destination) in args.inputs.iter().zip(&destinations) {
            println!("{} -> {}", input.display(), destination.display());
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let remover = match AnyRemover::from_config(&config) {
        Ok(remover) => remover,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code().max(1));
        }
    };
    if !remover.health_check().await {
        tracing::warn!("⚠️ {} remover did not pass its health check", remover.name());
    }

    let engine = CutoutEngine::new_with_monitoring(
        remover,
        LocalWorkspace::new(config.workspace_dir()),
        monitor_enabled,
    )
    .keep_intermediate(config.keep_intermediate());

    let mut failures = Vec::new();
    for (input, destination) in args.inputs.iter().zip(&destinations) {
        match engine.run(input, &options, destination).await {
            Ok(outcome) => println!("✅ {} -> {}", input.display(), outcome.exported.display()),
            Err(e) => {
                tracing::error!(
                    "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                    input.display(),
                    e,
                    e.category(),
                    e.severity()
                );
                eprintln!("❌ {}: {}", input.display(), e.user_friendly_message());
                failures.push(e);
            }
        }
    }

    println!(
        "📊 {} succeeded, {} failed",
        args.inputs.len() - failures.len(),
        failures.len()
    );

    // 以最嚴重的錯誤決定結束碼
    if let Some(worst) = failures.iter().max_by_key(|e| e.severity()) {
        tracing::error!("💡 Recovery suggestion: {}", worst.recovery_suggestion());
        let exit_code = worst.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let options = config.export_options();
    tracing::info!("📋 Configuration Summary:");
    if let Some(app) = &config.app {
        tracing::info!("  Name: {}", app.name);
    }
    tracing::info!("  Remover: {}", config.remover.r#type);
    tracing::info!(
        "  Export: {} / {} (quality: {})",
        options.resolution,
        options.format,
        options
            .quality
            .map(|q| q.to_string())
            .unwrap_or_else(|| "default".to_string())
    );
    tracing::info!("  Output: {}", config.output_dir().display());
    tracing::info!("  Workspace: {}", config.workspace_dir().display());
    tracing::info!("  Inputs: {}", args.inputs.len());
}
