//! 캡처 파이프라인.
//!
//! 현재 프레임에서 캡처 가이드 영역(중앙, 너비 85%, 비율 1.6)을 잘라
//! JPEG 결과물로 만든다. 수동/자동 캡처 모두 여기로 모인다.

use crate::encoder::{encode_jpeg, JPEG_MIME};
use crate::sampler::{sample, Sample};
use cardscan_core::config::CaptureConfig;
use cardscan_core::error::CoreError;
use cardscan_core::models::artifact::{CaptureMode, CapturedArtifact};
use cardscan_core::models::frame::GuideRegion;
use cardscan_core::ports::frame_source::FrameSource;
use chrono::Utc;
use image::{DynamicImage, RgbaImage};
use tracing::info;
use uuid::Uuid;

/// 캡처 파이프라인
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    region: GuideRegion,
    quality: u8,
    file_name: String,
}

impl CapturePipeline {
    pub fn new(region: GuideRegion, quality: u8, file_name: impl Into<String>) -> Self {
        Self {
            region,
            quality,
            file_name: file_name.into(),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.guide, config.jpeg_quality, config.file_name.clone())
    }

    /// 현재 프레임 캡처
    ///
    /// 실패 시 부분 결과물 없이 에러만 돌려준다.
    pub fn capture(
        &self,
        source: &dyn FrameSource,
        mode: CaptureMode,
    ) -> Result<CapturedArtifact, CoreError> {
        let buffer = match sample(source, &self.region)? {
            Sample::Pixels(buffer) => buffer,
            Sample::NotReady => return Err(CoreError::SourceNotReady),
        };

        let (width, height) = (buffer.width(), buffer.height());
        let rgba = RgbaImage::from_raw(width, height, buffer.into_raw()).ok_or_else(|| {
            CoreError::Internal(format!("캡처 버퍼 변환 실패: {}x{}", width, height))
        })?;
        let image_bytes = encode_jpeg(&DynamicImage::ImageRgba8(rgba), self.quality)?;

        let artifact = CapturedArtifact {
            capture_id: Uuid::new_v4(),
            image_bytes,
            source_name: self.file_name.clone(),
            mime_type: JPEG_MIME.to_string(),
            width,
            height,
            mode,
            captured_at: Utc::now(),
        };

        info!(
            "캡처 완료: {:?} {}x{} ({} bytes)",
            mode,
            width,
            height,
            artifact.image_bytes.len()
        );
        Ok(artifact)
    }
}

impl Default for CapturePipeline {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}
