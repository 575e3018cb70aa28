use crate::adapters::workspace::LocalWorkspace;
use crate::core::export::export_image;
use crate::domain::model::{ExportOptions, ExportRequest, RemovalJob, RemovalOutcome};
use crate::domain::ports::BackgroundRemover;
use crate::utils::error::{ClearcutError, Result};
use crate::utils::fs::ensure_parent_dir;
use crate::utils::monitor::ResourceMonitor;
use std::path::Path;

/// 上傳 → 去背 → 匯出
pub struct CutoutEngine<R: BackgroundRemover> {
    remover: R,
    workspace: LocalWorkspace,
    monitor: ResourceMonitor,
    keep_intermediate: bool,
}

impl<R: BackgroundRemover> CutoutEngine<R> {
    pub fn new(remover: R, workspace: LocalWorkspace) -> Self {
        Self::new_with_monitoring(remover, workspace, false)
    }

    pub fn new_with_monitoring(remover: R, workspace: LocalWorkspace, monitor_enabled: bool) -> Self {
        Self {
            remover,
            workspace,
            monitor: ResourceMonitor::new(monitor_enabled),
            keep_intermediate: true,
        }
    }

    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    pub fn remover(&self) -> &R {
        &self.remover
    }

    pub fn workspace(&self) -> &LocalWorkspace {
        &self.workspace
    }

    pub async fn run(
        &self,
        upload: &Path,
        options: &ExportOptions,
        destination: &Path,
    ) -> Result<RemovalOutcome> {
        tracing::info!(
            "🚀 Processing {} with {} remover",
            upload.display(),
            self.remover.name()
        );

        // Stage
        self.workspace.ensure()?;
        let staged = self.workspace.stage_upload(upload).await?;
        self.monitor.log_stage("Staging");

        // Remove background
        tracing::info!("✂️ Removing background...");
        let job = RemovalJob::new(
            &staged.path,
            self.workspace.processed_path(&staged.id, upload),
        )
        .with_resolution(options.resolution);
        let removal = self.remover.remove_background(&job).await;

        // 原始上傳檔用完即刪，無論成功與否
        if let Err(e) = self.workspace.discard(&staged.path).await {
            tracing::warn!("Could not remove staged upload: {}", e);
        }
        let processed = removal?;
        self.monitor.log_stage("Background removal");

        // Export
        tracing::info!("💾 Exporting to {}...", destination.display());
        ensure_parent_dir(destination)?;
        let request = ExportRequest::from_options(&processed, destination, options);
        let exported = tokio::task::spawn_blocking(move || export_image(request))
            .await
            .map_err(|e| ClearcutError::ProcessingError {
                message: format!("Export task join error: {}", e),
            })??;
        self.monitor.log_stage("Export");

        if !self.keep_intermediate && processed != exported {
            self.workspace.discard(&processed).await?;
        }

        self.monitor.log_summary();
        tracing::info!("✅ Finished {}", exported.display());

        Ok(RemovalOutcome {
            staged_input: staged.path,
            processed,
            exported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ExportFormat, ResolutionPreset};
    use async_trait::async_trait;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 把左半邊設成透明的假去背器，並記下收到的工作
    struct HalfTransparentRemover {
        jobs: Mutex<Vec<RemovalJob>>,
    }

    impl HalfTransparentRemover {
        fn new() -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BackgroundRemover for HalfTransparentRemover {
        async fn remove_background(&self, job: &RemovalJob) -> Result<PathBuf> {
            self.jobs.lock().unwrap().push(job.clone());
            let mut image = image::open(&job.input).unwrap().to_rgba8();
            let half = image.width() / 2;
            for (x, _, pixel) in image.enumerate_pixels_mut() {
                if x < half {
                    pixel.0[3] = 0;
                }
            }
            image.save(&job.output).unwrap();
            Ok(job.output.clone())
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    struct FailingRemover;

    #[async_trait]
    impl BackgroundRemover for FailingRemover {
        async fn remove_background(&self, _job: &RemovalJob) -> Result<PathBuf> {
            Err(ClearcutError::remover("model not found"))
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn write_photo(path: &Path, width: u32, height: u32) {
        let image = RgbaImage::from_pixel(width, height, Rgba([30, 140, 60, 255]));
        DynamicImage::ImageRgba8(image).save(path).unwrap();
    }

    #[tokio::test]
    async fn test_run_stages_removes_and_exports() {
        let dir = TempDir::new().unwrap();
        let upload = dir.path().join("photo.png");
        write_photo(&upload, 2560, 1440);
        let destination = dir.path().join("exports").join("photo.webp");

        let engine = CutoutEngine::new(
            HalfTransparentRemover::new(),
            LocalWorkspace::new(dir.path().join("ws")),
        );
        let options = ExportOptions {
            resolution: ResolutionPreset::Hd,
            format: ExportFormat::Webp,
            ..ExportOptions::default()
        };

        let outcome = engine.run(&upload, &options, &destination).await.unwrap();

        assert_eq!(outcome.exported, destination);
        assert!(!outcome.staged_input.exists());
        assert!(outcome.processed.exists());

        let exported = image::open(&destination).unwrap();
        assert_eq!(exported.dimensions(), (1280, 720));

        let jobs = engine.remover().jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].resolution, ResolutionPreset::Hd);
    }

    #[tokio::test]
    async fn test_intermediate_can_be_discarded() {
        let dir = TempDir::new().unwrap();
        let upload = dir.path().join("photo.png");
        write_photo(&upload, 64, 64);
        let destination = dir.path().join("out.png");

        let engine = CutoutEngine::new(
            HalfTransparentRemover::new(),
            LocalWorkspace::new(dir.path().join("ws")),
        )
        .keep_intermediate(false);

        let outcome = engine
            .run(&upload, &ExportOptions::default(), &destination)
            .await
            .unwrap();

        assert!(!outcome.processed.exists());
        let exported = image::open(&destination).unwrap().to_rgba8();
        assert_eq!(exported.get_pixel(0, 0).0[3], 0);
        assert_eq!(exported.get_pixel(63, 0).0[3], 255);
    }

    #[tokio::test]
    async fn test_remover_failure_leaves_no_export() {
        let dir = TempDir::new().unwrap();
        let upload = dir.path().join("photo.png");
        write_photo(&upload, 16, 16);
        let destination = dir.path().join("out.png");
        let workspace = LocalWorkspace::new(dir.path().join("ws"));

        let engine = CutoutEngine::new(FailingRemover, workspace.clone());
        let err = engine
            .run(&upload, &ExportOptions::default(), &destination)
            .await
            .unwrap_err();

        assert!(matches!(err, ClearcutError::RemoverError { .. }));
        assert!(!destination.exists());
        assert_eq!(std::fs::read_dir(workspace.uploads_dir()).unwrap().count(), 0);
    }
}
