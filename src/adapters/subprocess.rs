use crate::domain::model::RemovalJob;
use crate::domain::ports::BackgroundRemover;
use crate::utils::error::{ClearcutError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const STDERR_TAIL_LINES: usize = 20;

/// 以子行程呼叫去背腳本：`<program> <script> <input> <output> <resolution>`
#[derive(Debug, Clone)]
pub struct SubprocessRemover {
    program: String,
    script: PathBuf,
    working_dir: Option<PathBuf>,
}

impl SubprocessRemover {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            working_dir: None,
        }
    }

    /// 預設在腳本所在目錄執行，模型路徑是相對於那裡
    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    fn working_dir(&self, script: &Path) -> Option<PathBuf> {
        self.working_dir
            .clone()
            .or_else(|| script.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| ClearcutError::io(path, e))
}

fn tail(text: &str, lines: usize) -> String {
    let collected: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = collected.len().saturating_sub(lines);
    collected[start..].join("\n")
}

#[async_trait]
impl BackgroundRemover for SubprocessRemover {
    async fn remove_background(&self, job: &RemovalJob) -> Result<PathBuf> {
        // 子行程的 cwd 不同，所有路徑都先轉成絕對路徑
        let script = absolute(&self.script)?;
        let input = absolute(&job.input)?;
        let output = absolute(&job.output)?;

        tracing::debug!(
            "Running {} {} {} {} {}",
            self.program,
            script.display(),
            input.display(),
            output.display(),
            job.resolution
        );

        let mut command = Command::new(&self.program);
        command
            .arg(&script)
            .arg(&input)
            .arg(&output)
            .arg(job.resolution.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = self.working_dir(&script) {
            command.current_dir(dir);
        }

        let result = command.output().await.map_err(|e| {
            ClearcutError::remover(format!("failed to start '{}': {}", self.program, e))
        })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        let stderr = String::from_utf8_lossy(&result.stderr);
        for line in stdout.lines() {
            tracing::debug!("remover stdout: {}", line);
        }
        for line in stderr.lines() {
            tracing::debug!("remover stderr: {}", line);
        }

        if !result.status.success() {
            let detail = tail(&stderr, STDERR_TAIL_LINES);
            return Err(ClearcutError::remover(if detail.is_empty() {
                format!("{} exited with {}", script.display(), result.status)
            } else {
                format!("{} exited with {}: {}", script.display(), result.status, detail)
            }));
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(ClearcutError::remover(format!(
                "{} reported success but did not write {}",
                script.display(),
                output.display()
            )));
        }

        Ok(output)
    }

    async fn health_check(&self) -> bool {
        match absolute(&self.script) {
            Ok(script) => tokio::fs::metadata(&script)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn name(&self) -> &'static str {
        "subprocess"
    }
}
