use clap::Parser;
use clearcut::adapters::PromptPicker;
use clearcut::config::cli::Command;
use clearcut::utils::fs::ensure_parent_dir;
use clearcut::utils::{logger, validation::Validate};
use clearcut::{
    export_image, AnyRemover, BackgroundRemover, ClearcutError, CliConfig, ConfigProvider,
    CutoutEngine, ExportOptions, ExportRequest, LocalWorkspace, PathPicker, RemovalJob,
};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting clearcut CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&config).await {
        Ok(message) => {
            tracing::info!("✅ {}", message);
            println!("✅ {}", message);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ clearcut failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

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

async fn run(config: &CliConfig) -> clearcut::Result<String> {
    match &config.command {
        Command::Export {
            source,
            output,
            export,
        } => {
            let options = export.to_options();
            let destination = resolve_destination(
                config,
                output.as_deref(),
                options.default_file_name(source),
            )?;
            ensure_parent_dir(&destination)?;

            let request = ExportRequest::from_options(source, &destination, &options);
            let exported = tokio::task::spawn_blocking(move || export_image(request))
                .await
                .map_err(|e| ClearcutError::ProcessingError {
                    message: format!("Export task join error: {}", e),
                })??;
            Ok(format!("Exported to {}", exported.display()))
        }
        Command::Remove {
            input,
            output,
            resolution,
        } => {
            let remover = AnyRemover::from_config(config)?;
            let destination = resolve_destination(
                config,
                output.as_deref(),
                ExportOptions::default().default_cutout_file_name(input),
            )?;
            ensure_parent_dir(&destination)?;

            let job = RemovalJob::new(input, destination).with_resolution(*resolution);
            let processed = remover.remove_background(&job).await?;
            Ok(format!("Background removed: {}", processed.display()))
        }
        Command::Process {
            input,
            output,
            export,
        } => {
            let remover = AnyRemover::from_config(config)?;
            if !remover.health_check().await {
                tracing::warn!("⚠️ {} remover did not pass its health check", remover.name());
            }

            let options = export.to_options();
            let destination = resolve_destination(
                config,
                output.as_deref(),
                options.default_cutout_file_name(input),
            )?;
            let engine = CutoutEngine::new_with_monitoring(
                remover,
                LocalWorkspace::new(config.workspace_dir()),
                config.monitor,
            )
            .keep_intermediate(config.keep_intermediate());

            let outcome = engine.run(input, &options, &destination).await?;
            Ok(format!("Saved to {}", outcome.exported.display()))
        }
        Command::Health => {
            let remover = AnyRemover::from_config(config)?;
            if remover.health_check().await {
                Ok(format!("{} remover is available", remover.name()))
            } else {
                Err(ClearcutError::remover(format!(
                    "{} remover is not available",
                    remover.name()
                )))
            }
        }
    }
}

/// `-o` 優先，其次是互動詢問，最後是輸出資料夾下的預設檔名
fn resolve_destination(
    config: &CliConfig,
    output: Option<&Path>,
    default_name: String,
) -> clearcut::Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }

    let default = config.output_dir().join(default_name);
    if !config.ask_output {
        return Ok(default);
    }

    PromptPicker::stdio()
        .pick("Save as", Some(&default))
        .ok_or_else(|| ClearcutError::ValidationError {
            message: "No output path chosen".to_string(),
        })
}
