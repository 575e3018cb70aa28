use crate::core::ConfigProvider;
use crate::domain::model::{ExportFormat, ExportOptions, ResolutionPreset};
use crate::domain::ports::RemoverBackend;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_path, validate_positive_number, validate_range,
    validate_url, Validate, INPUT_IMAGE_EXTENSIONS,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Subprocess,
    Http,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "clearcut")]
#[command(about = "Remove image backgrounds and export the result at a chosen size and format")]
pub struct CliConfig {
    #[arg(long, value_enum, default_value_t = BackendKind::Subprocess, global = true)]
    pub backend: BackendKind,

    #[arg(long, default_value = "python", global = true, help = "Interpreter used to run the removal script")]
    pub python: String,

    #[arg(long, default_value = "ai/background_removal.py", global = true)]
    pub script: PathBuf,

    #[arg(long, global = true, help = "Working directory for the script (defaults to its folder)")]
    pub script_dir: Option<PathBuf>,

    #[arg(long, default_value = "http://127.0.0.1:5000/api", global = true)]
    pub endpoint: String,

    #[arg(long, default_value = ".clearcut", global = true)]
    pub workspace: PathBuf,

    #[arg(long, default_value = "./output", global = true)]
    pub output_dir: PathBuf,

    #[arg(long, global = true, help = "Keep the intermediate background-removed PNG")]
    pub keep_intermediate: bool,

    #[arg(long, global = true, help = "Prompt for the output path when -o is not given")]
    pub ask_output: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Resize/convert an image without removing its background
    Export {
        source: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Run only the background removal step
    Remove {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ResolutionPreset::Original)]
        resolution: ResolutionPreset,
    },
    /// Remove the background, then export
    Process {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Check that the configured backend is available
    Health,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ResolutionPreset::Original)]
    pub resolution: ResolutionPreset,

    #[arg(long, value_enum, default_value_t = ExportFormat::Png)]
    pub format: ExportFormat,

    #[arg(long, help = "1-100, applies to jpg and webp")]
    pub quality: Option<u8>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long, help = "Use --width/--height exactly instead of fitting inside them")]
    pub stretch: bool,
}

impl ExportArgs {
    pub fn to_options(&self) -> ExportOptions {
        ExportOptions {
            resolution: self.resolution,
            format: self.format,
            quality: self.quality,
            width: self.width,
            height: self.height,
            maintain_aspect_ratio: !self.stretch,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(quality) = self.quality {
            validate_range("quality", quality, 1, 100)?;
        }
        if let Some(width) = self.width {
            validate_positive_number("width", width, 1)?;
        }
        if let Some(height) = self.height {
            validate_positive_number("height", height, 1)?;
        }
        Ok(())
    }
}

impl CliConfig {
    pub fn input_path(&self) -> Option<&Path> {
        match &self.command {
            Command::Export { source, .. } => Some(source),
            Command::Remove { input, .. } | Command::Process { input, .. } => Some(input),
            Command::Health => None,
        }
    }

    fn uses_remover(&self) -> bool {
        !matches!(self.command, Command::Export { .. })
    }
}

impl ConfigProvider for CliConfig {
    fn remover_backend(&self) -> RemoverBackend {
        match self.backend {
            BackendKind::Subprocess => RemoverBackend::Subprocess {
                program: self.python.clone(),
                script: self.script.clone(),
                working_dir: self.script_dir.clone(),
            },
            BackendKind::Http => RemoverBackend::Http {
                endpoint: self.endpoint.clone(),
            },
        }
    }

    fn workspace_dir(&self) -> &Path {
        &self.workspace
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn keep_intermediate(&self) -> bool {
        self.keep_intermediate
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.uses_remover() {
            match self.backend {
                BackendKind::Http => validate_url("endpoint", &self.endpoint)?,
                BackendKind::Subprocess => {
                    validate_path("script", &self.script.to_string_lossy())?
                }
            }
        }
        validate_path("workspace", &self.workspace.to_string_lossy())?;
        validate_path("output_dir", &self.output_dir.to_string_lossy())?;

        if let Some(input) = self.input_path() {
            validate_file_extensions("input", std::slice::from_ref(&input), INPUT_IMAGE_EXTENSIONS)?;
        }

        match &self.command {
            Command::Export { export, .. } | Command::Process { export, .. } => export.validate(),
            Command::Remove { .. } | Command::Health => Ok(()),
        }
    }
}
