//! 프레임 판정 모델.
//!
//! 휴리스틱 점수기의 세부 점수와 틱마다 새로 생성되는 판정 결과.

use serde::{Deserialize, Serialize};

/// 카드 감지 시 안내 문구
pub const GUIDANCE_DETECTED: &str = "ID card detected! Hold steady for capture...";
/// 텍스트 점수가 낮을 때 안내 문구
pub const GUIDANCE_TEXT_UNCLEAR: &str = "Ensure ID text and details are clear";
/// 그 외 미감지 안내 문구
pub const GUIDANCE_ADJUST_POSITION: &str = "Adjust position for clearer ID features";
/// 픽셀 접근 실패 시 안내 문구
pub const GUIDANCE_TRY_AGAIN: &str = "Please try again";
/// 샘플링 영역이 퇴화했을 때 안내 문구
pub const GUIDANCE_NOT_READY: &str = "Camera not ready";

/// 텍스트 점수가 이 값 미만이면 "텍스트 선명도" 안내
pub const TEXT_GUIDANCE_THRESHOLD: f64 = 30.0;

/// 판정 품질 라벨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionQuality {
    /// ID 카드로 판정
    IdDetected,
    /// ID 카드 아님
    NotAnIdCard,
    /// 샘플링 영역이 유효하지 않음
    InvalidArea,
    /// 픽셀 접근 실패
    DetectionError,
}

impl DetectionQuality {
    /// 사람이 읽는 라벨
    pub fn label(&self) -> &'static str {
        match self {
            DetectionQuality::IdDetected => "ID detected",
            DetectionQuality::NotAnIdCard => "Not an ID card",
            DetectionQuality::InvalidArea => "Invalid area",
            DetectionQuality::DetectionError => "Detection error",
        }
    }
}

/// 세 가지 세부 점수 (각 0 ~ 100)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// 텍스트 패턴 대비 점수
    pub text: f64,
    /// 공식 색상 점수
    pub color: f64,
    /// 레이아웃 활동량 점수
    pub layout: f64,
}

impl ScoreBreakdown {
    /// 세부 점수의 산술 평균
    pub fn aggregate(&self) -> f64 {
        (self.text + self.color + self.layout) / 3.0
    }
}

/// 한 틱의 판정 결과 (값 타입, 생성 후 변경 없음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionVerdict {
    /// 카드 감지 여부 (`score >= threshold`)
    pub detected: bool,
    /// 종합 점수 (0 ~ 100)
    pub score: f64,
    /// 사용자 안내 문구
    pub guidance: String,
    /// 품질 라벨
    pub quality: DetectionQuality,
    /// 세부 점수 (실패 판정에서는 None)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub breakdown: Option<ScoreBreakdown>,
}

impl DetectionVerdict {
    /// 세부 점수로부터 판정 생성
    ///
    /// 안내 문구 우선순위: 감지 → 텍스트 불명확 → 위치 조정.
    pub fn from_breakdown(breakdown: ScoreBreakdown, threshold: f64) -> Self {
        let score = breakdown.aggregate().clamp(0.0, 100.0);
        let detected = score >= threshold;

        let guidance = if detected {
            GUIDANCE_DETECTED
        } else if breakdown.text < TEXT_GUIDANCE_THRESHOLD {
            GUIDANCE_TEXT_UNCLEAR
        } else {
            GUIDANCE_ADJUST_POSITION
        };

        Self {
            detected,
            score,
            guidance: guidance.to_string(),
            quality: if detected {
                DetectionQuality::IdDetected
            } else {
                DetectionQuality::NotAnIdCard
            },
            breakdown: Some(breakdown),
        }
    }

    /// 픽셀 접근 실패 판정 (점수 0, 재시도 안내)
    pub fn failed() -> Self {
        Self {
            detected: false,
            score: 0.0,
            guidance: GUIDANCE_TRY_AGAIN.to_string(),
            quality: DetectionQuality::DetectionError,
            breakdown: None,
        }
    }

    /// 샘플링 영역 퇴화 판정
    pub fn invalid_area() -> Self {
        Self {
            detected: false,
            score: 0.0,
            guidance: GUIDANCE_NOT_READY.to_string(),
            quality: DetectionQuality::InvalidArea,
            breakdown: None,
        }
    }
}
