//! 파일 캡처 싱크.
//!
//! `CaptureSink` 포트 구현. 캡처 결과물을 출력 디렉토리에 이미지 파일 +
//! 메타데이터 JSON으로 저장하고, 위젯 값(`FileData`)은 `value.json`으로 유지한다.

use async_trait::async_trait;
use cardscan_core::error::CoreError;
use cardscan_core::models::artifact::{CapturedArtifact, FileData};
use cardscan_core::ports::capture_sink::CaptureSink;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::watch;
use tracing::{info, warn};

/// 위젯 값 파일 이름
pub const VALUE_FILE_NAME: &str = "value.json";
/// 마지막 캡처 메타데이터 파일 이름
pub const CAPTURE_META_FILE_NAME: &str = "capture.json";

/// 싱크 진행 상황
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkProgress {
    /// 저장 완료된 캡처 수
    pub delivered: u32,
    /// 실패 통지 수
    pub failed: u32,
    /// 마지막으로 저장한 이미지 경로
    pub last_image: Option<PathBuf>,
}

/// 디렉토리 기반 캡처 싱크
pub struct FileCaptureSink {
    output_dir: PathBuf,
    progress: watch::Sender<SinkProgress>,
}

impl FileCaptureSink {
    /// 출력 디렉토리 준비 후 싱크 생성
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        let (progress, _) = watch::channel(SinkProgress::default());
        Ok(Self {
            output_dir,
            progress,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 진행 상황 구독 (캡처 완료 대기용)
    pub fn subscribe(&self) -> watch::Receiver<SinkProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> SinkProgress {
        self.progress.borrow().clone()
    }

    fn value_path(&self) -> PathBuf {
        self.output_dir.join(VALUE_FILE_NAME)
    }
}

#[async_trait]
impl CaptureSink for FileCaptureSink {
    async fn deliver(&self, artifact: CapturedArtifact) -> Result<(), CoreError> {
        let image_path = self.output_dir.join(&artifact.source_name);
        fs::write(&image_path, &artifact.image_bytes).await?;

        let meta = serde_json::to_vec_pretty(&artifact)?;
        fs::write(self.output_dir.join(CAPTURE_META_FILE_NAME), meta).await?;

        info!(
            "캡처 저장: {} ({}x{}, {} bytes, {:?})",
            image_path.display(),
            artifact.width,
            artifact.height,
            artifact.image_bytes.len(),
            artifact.mode
        );
        self.progress.send_modify(|p| {
            p.delivered += 1;
            p.last_image = Some(image_path);
        });
        Ok(())
    }

    async fn capture_failed(&self, error: &CoreError) {
        warn!("캡처 실패 통지: {}", error);
        self.progress.send_modify(|p| p.failed += 1);
    }

    async fn file_changed(&self, value: Option<&FileData>) {
        let path = self.value_path();
        let result = match value {
            Some(data) => match serde_json::to_vec_pretty(data) {
                Ok(json) => fs::write(&path, json).await,
                Err(e) => {
                    warn!("위젯 값 직렬화 실패: {}", e);
                    return;
                }
            },
            None => match fs::remove_file(&path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            warn!("위젯 값 저장 실패: {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardscan_core::models::artifact::CaptureMode;
    use tempfile::TempDir;

    fn artifact(bytes: &[u8]) -> CapturedArtifact {
        let json = serde_json::json!({
            "capture_id": "6f1c1d8e-3c4b-4a57-9d0e-2b7f4a1e9c10",
            "source_name": "camera-capture.jpg",
            "mime_type": "image/jpeg",
            "width": 850,
            "height": 531,
            "mode": "auto",
            "captured_at": "2026-10-19T09:00:00Z"
        });
        let mut artifact: CapturedArtifact = serde_json::from_value(json).unwrap();
        artifact.image_bytes = bytes.to_vec();
        assert_eq!(artifact.mode, CaptureMode::Auto);
        artifact
    }

    #[tokio::test]
    async fn deliver_writes_image_and_metadata() {
        let dir = TempDir::new().unwrap();
        let sink = FileCaptureSink::new(dir.path().join("out")).unwrap();
        let mut rx = sink.subscribe();

        sink.deliver(artifact(b"\xFF\xD8jpeg")).await.unwrap();

        rx.changed().await.unwrap();
        let progress = rx.borrow().clone();
        assert_eq!(progress.delivered, 1);
        let image_path = progress.last_image.unwrap();
        assert_eq!(image_path, sink.output_dir().join("camera-capture.jpg"));
        assert_eq!(std::fs::read(&image_path).unwrap(), b"\xFF\xD8jpeg");

        let meta: serde_json::Value = serde_json::from_slice(
            &std::fs::read(sink.output_dir().join(CAPTURE_META_FILE_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(meta["width"], 850);
        assert_eq!(meta["mode"], "auto");
        assert!(meta.get("image_bytes").is_none());
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let dir = TempDir::new().unwrap();
        let sink = FileCaptureSink::new(dir.path()).unwrap();
        sink.capture_failed(&CoreError::SourceNotReady).await;
        sink.capture_failed(&CoreError::Encoding("x".into())).await;
        assert_eq!(sink.progress().failed, 2);
        assert_eq!(sink.progress().delivered, 0);
    }

    #[tokio::test]
    async fn value_file_follows_widget_value() {
        let dir = TempDir::new().unwrap();
        let sink = FileCaptureSink::new(dir.path()).unwrap();
        let value_path = dir.path().join(VALUE_FILE_NAME);

        let data = FileData::from_bytes(b"abc", "id.png", "image/png");
        sink.file_changed(Some(&data)).await;
        let stored: FileData =
            serde_json::from_slice(&std::fs::read(&value_path).unwrap()).unwrap();
        assert_eq!(stored, data);

        sink.file_changed(None).await;
        assert!(!value_path.exists());

        // 이미 없을 때도 조용히 통과
        sink.file_changed(None).await;
        assert!(!value_path.exists());
    }
}
