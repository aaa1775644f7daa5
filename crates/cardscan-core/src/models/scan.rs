//! 스캔 세션 알림 모델.
//!
//! 카운트다운 표시, 피드백 메시지, 안내 문구, 오버레이 상태 등
//! 코어가 주입된 싱크로 내보내는 메시지.

use serde::{Deserialize, Serialize};

/// 피드백 메시지 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSeverity {
    Success,
    Warning,
    Error,
    Info,
}

/// 가이드 오버레이 상태
///
/// `ready`는 `analyzing` 없이 참이 될 수 없다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverlayState {
    /// 연속 양성 판정 누적 중
    pub analyzing: bool,
    /// 캡처 트리거됨 (카운트다운 진행 중)
    pub ready: bool,
}

/// 스캔 세션 이벤트 (채널 기반 싱크용)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanEvent {
    /// 카운트다운 숫자 표시
    CountdownShown { count: u32 },
    /// 카운트다운 표시 제거
    CountdownHidden,
    /// 피드백 메시지
    Feedback {
        message: String,
        severity: FeedbackSeverity,
    },
    /// 안내 문구 갱신 (빈 문자열이면 기본 안내)
    Guidance { text: String, overlay: OverlayState },
}
