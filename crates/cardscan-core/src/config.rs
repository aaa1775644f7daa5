//! 스캐너 설정 구조체.
//!
//! 감지 주기, 안정화 임계값, 카운트다운, 캡처/업로드 인코딩 설정 등
//! 런타임 설정을 정의한다. 임계값은 튜닝된 휴리스틱이라 기본값으로만 둔다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::frame::GuideRegion;

/// 최상위 스캐너 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 자동 캡처 활성화 여부
    #[serde(default = "default_true")]
    pub auto_capture_enabled: bool,
    /// 캡처 성공 후 카메라 세션 종료 여부
    #[serde(default = "default_true")]
    pub close_on_capture: bool,
    /// 프레임 감지 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 카운트다운 설정
    #[serde(default)]
    pub countdown: CountdownConfig,
    /// 캡처 파이프라인 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 파일 업로드 설정
    #[serde(default)]
    pub upload: UploadConfig,
    /// 피드백 메시지 설정
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

// ============================================================
// 감지 설정
// ============================================================

/// 프레임 감지 + 안정화 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 샘플링 주기 (밀리초)
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// 감지 판정 임계값 (종합 점수, 0 ~ 100)
    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f64,
    /// 캡처 트리거에 필요한 연속 양성 판정 수
    #[serde(default = "default_required_stable_frames")]
    pub required_stable_frames: u32,
    /// 자동 캡처 최소 재발동 간격 (밀리초)
    #[serde(default = "default_capture_cooldown_ms")]
    pub capture_cooldown_ms: u64,
    /// 카메라 시작 후 감지 시작까지 대기 (밀리초)
    #[serde(default = "default_warmup_delay_ms")]
    pub warmup_delay_ms: u64,
    /// 카운트다운 중단 후 감지 재개까지 대기 (밀리초)
    #[serde(default = "default_resume_delay_ms")]
    pub resume_delay_ms: u64,
    /// 감지 샘플링 가이드 영역
    #[serde(default = "GuideRegion::detection")]
    pub guide: GuideRegion,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            detection_threshold: default_detection_threshold(),
            required_stable_frames: default_required_stable_frames(),
            capture_cooldown_ms: default_capture_cooldown_ms(),
            warmup_delay_ms: default_warmup_delay_ms(),
            resume_delay_ms: default_resume_delay_ms(),
            guide: GuideRegion::detection(),
        }
    }
}

impl DetectionConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn capture_cooldown(&self) -> Duration {
        Duration::from_millis(self.capture_cooldown_ms)
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

// ============================================================
// 카운트다운 설정
// ============================================================

/// 카운트다운 + 연속 검증 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// 카운트다운 길이 (초)
    #[serde(default = "default_countdown_seconds")]
    pub seconds: u32,
    /// 허용 연속 실패 판정 수 (도달 시 중단)
    #[serde(default = "default_max_failed_detections")]
    pub max_failed_detections: u32,
    /// 카운트 숫자 표시 유지 시간 (밀리초)
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            seconds: default_countdown_seconds(),
            max_failed_detections: default_max_failed_detections(),
            display_ms: default_display_ms(),
        }
    }
}

impl CountdownConfig {
    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display_ms)
    }
}

// ============================================================
// 캡처 설정
// ============================================================

/// 최종 캡처 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 가이드 영역 (중앙 정렬, 너비 85%)
    #[serde(default = "GuideRegion::capture")]
    pub guide: GuideRegion,
    /// JPEG 품질 (1 ~ 100)
    #[serde(default = "default_capture_quality")]
    pub jpeg_quality: u8,
    /// 결과물 파일 이름
    #[serde(default = "default_capture_file_name")]
    pub file_name: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            guide: GuideRegion::capture(),
            jpeg_quality: default_capture_quality(),
            file_name: default_capture_file_name(),
        }
    }
}

// ============================================================
// 업로드 설정
// ============================================================

/// 파일 업로드 전처리 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 이 크기(바이트)를 넘으면 리사이즈 + 재인코딩
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// 리사이즈 시 긴 변 최대 픽셀
    #[serde(default = "default_max_width_or_height")]
    pub max_width_or_height: u32,
    /// 재인코딩 JPEG 품질 (1 ~ 100)
    #[serde(default = "default_upload_quality")]
    pub jpeg_quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_width_or_height: default_max_width_or_height(),
            jpeg_quality: default_upload_quality(),
        }
    }
}

// ============================================================
// 피드백 설정
// ============================================================

/// 피드백 메시지 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// 피드백 자동 소멸 시간 (밀리초)
    #[serde(default = "default_feedback_clear_ms")]
    pub clear_after_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            clear_after_ms: default_feedback_clear_ms(),
        }
    }
}

impl FeedbackConfig {
    pub fn clear_after(&self) -> Duration {
        Duration::from_millis(self.clear_after_ms)
    }
}

// ============================================================
// ScannerConfig impl
// ============================================================

impl ScannerConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            auto_capture_enabled: true,
            close_on_capture: true,
            detection: DetectionConfig::default(),
            countdown: CountdownConfig::default(),
            capture: CaptureConfig::default(),
            upload: UploadConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let d = &self.detection;
        if d.sample_interval_ms == 0 {
            return Err(CoreError::validation(
                "detection.sample_interval_ms",
                "0보다 커야 함",
            ));
        }
        if d.required_stable_frames == 0 {
            return Err(CoreError::validation(
                "detection.required_stable_frames",
                "0보다 커야 함",
            ));
        }
        if !(0.0..=100.0).contains(&d.detection_threshold) {
            return Err(CoreError::validation(
                "detection.detection_threshold",
                "0 ~ 100 범위여야 함",
            ));
        }
        validate_region("detection.guide", &d.guide)?;
        validate_region("capture.guide", &self.capture.guide)?;

        if self.countdown.seconds == 0 {
            return Err(CoreError::validation("countdown.seconds", "0보다 커야 함"));
        }
        if self.countdown.max_failed_detections == 0 {
            return Err(CoreError::validation(
                "countdown.max_failed_detections",
                "0보다 커야 함",
            ));
        }
        validate_quality("capture.jpeg_quality", self.capture.jpeg_quality)?;
        validate_quality("upload.jpeg_quality", self.upload.jpeg_quality)?;
        if self.upload.max_width_or_height == 0 {
            return Err(CoreError::validation(
                "upload.max_width_or_height",
                "0보다 커야 함",
            ));
        }
        Ok(())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn validate_region(field: &str, region: &GuideRegion) -> Result<(), CoreError> {
    if !(region.width_fraction > 0.0 && region.width_fraction <= 1.0) {
        return Err(CoreError::validation(
            format!("{field}.width_fraction"),
            "(0, 1] 범위여야 함",
        ));
    }
    if region.aspect_ratio <= 0.0 {
        return Err(CoreError::validation(
            format!("{field}.aspect_ratio"),
            "0보다 커야 함",
        ));
    }
    Ok(())
}

fn validate_quality(field: &str, quality: u8) -> Result<(), CoreError> {
    if !(1..=100).contains(&quality) {
        return Err(CoreError::validation(field, "1 ~ 100 범위여야 함"));
    }
    Ok(())
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_sample_interval_ms() -> u64 {
    300
}

fn default_detection_threshold() -> f64 {
    50.0
}

fn default_required_stable_frames() -> u32 {
    3
}

fn default_capture_cooldown_ms() -> u64 {
    3_000
}

fn default_warmup_delay_ms() -> u64 {
    2_000
}

fn default_resume_delay_ms() -> u64 {
    100
}

fn default_countdown_seconds() -> u32 {
    3
}

fn default_max_failed_detections() -> u32 {
    3
}

fn default_display_ms() -> u64 {
    1_000
}

fn default_capture_quality() -> u8 {
    92
}

fn default_capture_file_name() -> String {
    "camera-capture.jpg".to_string()
}

fn default_max_file_size() -> usize {
    100_000 // 100KB
}

fn default_max_width_or_height() -> u32 {
    1280
}

fn default_upload_quality() -> u8 {
    80
}

fn default_feedback_clear_ms() -> u64 {
    3_000
}
