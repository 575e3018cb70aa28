use crate::core::ConfigProvider;
use crate::domain::model::ExportOptions;
use crate::domain::ports::RemoverBackend;
use crate::utils::error::{ClearcutError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_required_field,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_WORKSPACE: &str = ".clearcut";
const DEFAULT_PROGRAM: &str = "python";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub app: Option<AppConfig>,
    pub remover: RemoverConfig,
    pub export: ExportConfig,
    pub workspace: Option<WorkspaceConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoverConfig {
    pub r#type: String,
    pub program: Option<String>,
    pub script: Option<String>,
    pub working_directory: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: String,
    #[serde(flatten)]
    pub options: ExportOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub directory: String,
    pub keep_intermediate: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| ClearcutError::io(path.as_ref(), e))?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ClearcutError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REMOVER_URL})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ClearcutError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        match self.remover.r#type.as_str() {
            "http" => {
                let endpoint = validate_required_field("remover.endpoint", &self.remover.endpoint)?;
                validate_url("remover.endpoint", endpoint)?;
            }
            "subprocess" => {
                let script = validate_required_field("remover.script", &self.remover.script)?;
                validate_path("remover.script", script)?;
            }
            other => {
                return Err(ClearcutError::InvalidConfigValueError {
                    field: "remover.type".to_string(),
                    value: other.to_string(),
                    reason: "Supported types: subprocess, http".to_string(),
                });
            }
        }

        validate_path("export.output_path", &self.export.output_path)?;
        if let Some(workspace) = &self.workspace {
            validate_path("workspace.directory", &workspace.directory)?;
        }

        let options = &self.export.options;
        if let Some(quality) = options.quality {
            validate_range("export.quality", quality, 1, 100)?;
        }
        if let Some(width) = options.width {
            validate_positive_number("export.width", width, 1)?;
        }
        if let Some(height) = options.height {
            validate_positive_number("export.height", height, 1)?;
        }

        Ok(())
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export.options
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_level.as_deref())
            .unwrap_or("info")
    }

    pub fn log_format(&self) -> LogFormat {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format)
            .unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn remover_backend(&self) -> RemoverBackend {
        if self.remover.r#type == "http" {
            RemoverBackend::Http {
                endpoint: self.remover.endpoint.clone().unwrap_or_default(),
            }
        } else {
            RemoverBackend::Subprocess {
                program: self
                    .remover
                    .program
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
                script: PathBuf::from(self.remover.script.clone().unwrap_or_default()),
                working_dir: self.remover.working_directory.as_ref().map(PathBuf::from),
            }
        }
    }

    fn workspace_dir(&self) -> &Path {
        self.workspace
            .as_ref()
            .map(|w| Path::new(&w.directory))
            .unwrap_or_else(|| Path::new(DEFAULT_WORKSPACE))
    }

    fn output_dir(&self) -> &Path {
        Path::new(&self.export.output_path)
    }

    fn keep_intermediate(&self) -> bool {
        self.workspace
            .as_ref()
            .and_then(|w| w.keep_intermediate)
            .unwrap_or(true)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
