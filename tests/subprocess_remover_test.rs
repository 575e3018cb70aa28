#![cfg(unix)]

use clearcut::domain::ports::RemoverBackend;
use clearcut::{
    AnyRemover, BackgroundRemover, ClearcutError, CutoutEngine, ExportFormat, ExportOptions,
    LocalWorkspace, RemovalJob, ResolutionPreset, SubprocessRemover,
};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let script = dir.join(name);
    std::fs::write(&script, body).unwrap();
    script
}

fn write_photo(path: &Path, width: u32, height: u32) {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    DynamicImage::ImageRgba8(image).save(path).unwrap();
}

/// 把輸入原封不動複製到輸出，並記下收到的解析度參數
const COPY_SCRIPT: &str = r#"
cp "$1" "$2"
printf '%s' "$3" > resolution.txt
"#;

#[tokio::test]
async fn test_script_receives_paths_and_resolution() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "copy.sh", COPY_SCRIPT);
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 16, 16);
    let output = temp_dir.path().join("processed.png");

    let remover = SubprocessRemover::new("sh", &script);
    let job = RemovalJob::new(&input, &output).with_resolution(ResolutionPreset::FullHd);
    let result = remover.remove_background(&job).await.unwrap();

    assert_eq!(result, std::path::absolute(&output).unwrap());
    assert_eq!(std::fs::read(&input).unwrap(), std::fs::read(&output).unwrap());

    // 預設在腳本所在目錄執行
    let resolution = std::fs::read_to_string(temp_dir.path().join("resolution.txt")).unwrap();
    assert_eq!(resolution, "fullhd");
}

#[tokio::test]
async fn test_explicit_working_directory_is_used() {
    let temp_dir = TempDir::new().unwrap();
    let scripts = temp_dir.path().join("scripts");
    let work = temp_dir.path().join("work");
    std::fs::create_dir_all(&scripts).unwrap();
    std::fs::create_dir_all(&work).unwrap();

    let script = write_script(&scripts, "copy.sh", COPY_SCRIPT);
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 8, 8);
    let output = temp_dir.path().join("processed.png");

    let remover = SubprocessRemover::new("sh", &script).with_working_dir(Some(work.clone()));
    remover
        .remove_background(&RemovalJob::new(&input, &output))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(work.join("resolution.txt")).unwrap(),
        "original"
    );
    assert!(!scripts.join("resolution.txt").exists());
}

#[tokio::test]
async fn test_non_zero_exit_reports_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        temp_dir.path(),
        "fail.sh",
        "echo 'loading model' >&2\necho 'Error: model.onnx not found' >&2\nexit 3\n",
    );
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 8, 8);
    let output = temp_dir.path().join("processed.png");

    let remover = SubprocessRemover::new("sh", &script);
    let error = remover
        .remove_background(&RemovalJob::new(&input, &output))
        .await
        .unwrap_err();

    match error {
        ClearcutError::RemoverError { message } => {
            assert!(message.contains("model.onnx not found"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_success_without_output_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "noop.sh", "exit 0\n");
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 8, 8);
    let output = temp_dir.path().join("processed.png");

    let remover = SubprocessRemover::new("sh", &script);
    let error = remover
        .remove_background(&RemovalJob::new(&input, &output))
        .await
        .unwrap_err();

    assert!(matches!(error, ClearcutError::RemoverError { .. }));
    assert!(error.to_string().contains("did not write"));
}

#[tokio::test]
async fn test_missing_program_is_remover_error() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "copy.sh", COPY_SCRIPT);
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 8, 8);

    let remover = SubprocessRemover::new("clearcut-no-such-interpreter", &script);
    let error = remover
        .remove_background(&RemovalJob::new(&input, temp_dir.path().join("out.png")))
        .await
        .unwrap_err();

    assert!(matches!(error, ClearcutError::RemoverError { .. }));
}

#[tokio::test]
async fn test_any_remover_from_backend() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "copy.sh", COPY_SCRIPT);

    let remover = AnyRemover::from_backend(RemoverBackend::Subprocess {
        program: "sh".to_string(),
        script: script.clone(),
        working_dir: None,
    })
    .unwrap();
    assert_eq!(remover.name(), "subprocess");
    assert!(remover.health_check().await);

    let missing = AnyRemover::from_backend(RemoverBackend::Subprocess {
        program: "sh".to_string(),
        script: temp_dir.path().join("missing.sh"),
        working_dir: None,
    })
    .unwrap();
    assert!(!missing.health_check().await);

    let invalid = AnyRemover::from_backend(RemoverBackend::Http {
        endpoint: "not a url".to_string(),
    });
    assert!(invalid.is_err());
}

#[tokio::test]
async fn test_engine_with_script_remover() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "copy.sh", COPY_SCRIPT);
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 1920, 1080);
    let destination = temp_dir.path().join("exports").join("photo_clearcut.webp");

    let engine = CutoutEngine::new(
        AnyRemover::Subprocess(SubprocessRemover::new("sh", &script)),
        LocalWorkspace::new(temp_dir.path().join("workspace")),
    )
    .keep_intermediate(false);
    let options = ExportOptions {
        resolution: ResolutionPreset::Hd,
        format: ExportFormat::Webp,
        quality: Some(75),
        ..ExportOptions::default()
    };

    let outcome = engine.run(&input, &options, &destination).await.unwrap();

    assert_eq!(outcome.exported, destination);
    assert_eq!(image::open(&destination).unwrap().dimensions(), (1280, 720));
    assert!(!outcome.staged_input.exists());
    assert!(!outcome.processed.exists());
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("resolution.txt")).unwrap(),
        "hd"
    );
}

#[tokio::test]
async fn test_engine_failure_cleans_staged_upload() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "fail.sh", "echo boom >&2\nexit 1\n");
    let input = temp_dir.path().join("photo.png");
    write_photo(&input, 32, 32);
    let destination = temp_dir.path().join("photo_clearcut.png");
    let workspace = LocalWorkspace::new(temp_dir.path().join("workspace"));
    let uploads = workspace.uploads_dir();

    let engine = CutoutEngine::new(SubprocessRemover::new("sh", &script), workspace);
    let result = engine
        .run(&input, &ExportOptions::default(), &destination)
        .await;

    assert!(matches!(result, Err(ClearcutError::RemoverError { .. })));
    assert!(!destination.exists());
    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 0);
    assert!(input.exists());
}
