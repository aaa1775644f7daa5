//! 채널 기반 알림 싱크.
//!
//! `ScanNotifier` 포트 구현. 알림을 `ScanEvent`로 바꿔 mpsc 채널로 보낸다.
//! 수신측이 닫혀 있으면 조용히 버린다.

use cardscan_core::models::scan::{FeedbackSeverity, OverlayState, ScanEvent};
use cardscan_core::ports::notifier::ScanNotifier;
use tokio::sync::mpsc;
use tracing::trace;

/// mpsc 채널 알림 싱크
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        Self { tx }
    }

    /// 싱크와 수신측을 함께 생성
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: ScanEvent) {
        if self.tx.send(event).is_err() {
            trace!("알림 수신측 닫힘: 이벤트 버림");
        }
    }
}

impl ScanNotifier for ChannelNotifier {
    fn show_countdown(&self, count: u32) {
        self.send(ScanEvent::CountdownShown { count });
    }

    fn hide_countdown(&self) {
        self.send(ScanEvent::CountdownHidden);
    }

    fn show_feedback(&self, message: &str, severity: FeedbackSeverity) {
        self.send(ScanEvent::Feedback {
            message: message.to_string(),
            severity,
        });
    }

    fn update_guidance(&self, text: &str, overlay: OverlayState) {
        self.send(ScanEvent::Guidance {
            text: text.to_string(),
            overlay,
        });
    }
}
