//! 스캔 알림 포트.
//!
//! 구현: `cardscan-vision::channel_notifier` (mpsc 메시지 전달),
//! `cardscan-app::display` (터미널 오버레이)

use crate::models::scan::{FeedbackSeverity, OverlayState};

/// 카운트다운/피드백/안내 문구 싱크
///
/// 전역 브로드캐스트 대신 생성 시점에 주입된다. 모든 호출은 즉시 반환해야 한다.
pub trait ScanNotifier: Send + Sync {
    /// 카운트다운 숫자 표시
    fn show_countdown(&self, count: u32);

    /// 카운트다운 표시 제거
    fn hide_countdown(&self);

    /// 피드백 메시지 표시 (자동 소멸은 싱크 책임)
    fn show_feedback(&self, message: &str, severity: FeedbackSeverity);

    /// 안내 문구 + 오버레이 상태 갱신
    fn update_guidance(&self, text: &str, overlay: OverlayState);
}
