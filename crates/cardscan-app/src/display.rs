//! 터미널 오버레이 표시.
//!
//! `ScanNotifier` 포트 구현. 카운트다운 숫자는 `display_ms` 뒤에, 피드백
//! 메시지는 `clear_after_ms` 뒤에 자동으로 지운다. 새 표시가 오면 이전
//! 소멸 타이머는 취소되고 세대 번호가 바뀌어, 이미 깨어난 타이머도
//! 새 표시를 지우지 못한다.

use cardscan_core::config::ScannerConfig;
use cardscan_core::models::scan::{FeedbackSeverity, OverlayState};
use cardscan_core::ports::notifier::ScanNotifier;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// 현재 화면 상태
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    /// 표시 중인 카운트다운 숫자
    pub countdown: Option<u32>,
    /// 표시 중인 피드백 메시지
    pub feedback: Option<(String, FeedbackSeverity)>,
    /// 안내 문구 (빈 문자열이면 기본 안내)
    pub guidance: String,
    pub overlay: OverlayState,
}

/// 자동 소멸 타이머 한 칸
#[derive(Default)]
struct ClearTimer {
    generation: Arc<AtomicU64>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ClearTimer {
    /// 이전 타이머를 취소하고 새 세대 번호 반환
    fn cancel(&self) -> u64 {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// `delay` 뒤에 `clear` 실행 (그 사이 세대가 바뀌면 무시)
    fn arm<F>(&self, delay: Duration, clear: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.cancel();
        let Ok(runtime) = Handle::try_current() else {
            trace!("런타임 밖 호출, 자동 소멸 생략");
            return;
        };

        let current = self.generation.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::Acquire) == generation {
                clear();
            }
        });
        *self.handle.lock() = Some(handle);
    }
}

/// 터미널 오버레이
pub struct TerminalDisplay {
    state: Arc<Mutex<DisplayState>>,
    countdown_timer: ClearTimer,
    feedback_timer: ClearTimer,
    countdown_hold: Duration,
    feedback_hold: Duration,
    echo: bool,
}

impl TerminalDisplay {
    pub fn new(countdown_hold: Duration, feedback_hold: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(DisplayState::default())),
            countdown_timer: ClearTimer::default(),
            feedback_timer: ClearTimer::default(),
            countdown_hold,
            feedback_hold,
            echo: true,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.countdown.display_duration(),
            config.feedback.clear_after(),
        )
    }

    /// 표준 출력 없이 상태만 기록 (테스트/헤드리스)
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// 현재 화면 상태 복제
    pub fn snapshot(&self) -> DisplayState {
        self.state.lock().clone()
    }

    fn print(&self, line: &str) {
        if self.echo {
            println!("{line}");
        }
    }
}

impl ScanNotifier for TerminalDisplay {
    fn show_countdown(&self, count: u32) {
        self.state.lock().countdown = Some(count);
        self.print(&format!("  ⏱  {count}"));

        let state = self.state.clone();
        self.countdown_timer.arm(self.countdown_hold, move || {
            let mut state = state.lock();
            if state.countdown == Some(count) {
                state.countdown = None;
            }
        });
    }

    fn hide_countdown(&self) {
        self.countdown_timer.cancel();
        self.state.lock().countdown = None;
    }

    fn show_feedback(&self, message: &str, severity: FeedbackSeverity) {
        debug!("피드백 표시: {} ({:?})", message, severity);
        self.state.lock().feedback = Some((message.to_string(), severity));
        self.print(&format!("{} {}", severity_icon(severity), message));

        let state = self.state.clone();
        self.feedback_timer.arm(self.feedback_hold, move || {
            state.lock().feedback = None;
        });
    }

    fn update_guidance(&self, text: &str, overlay: OverlayState) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.guidance != text || state.overlay != overlay;
            state.guidance = text.to_string();
            state.overlay = overlay;
            changed
        };
        if changed && !text.is_empty() {
            self.print(&format!("{} {}", overlay_marker(overlay), text));
        }
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        self.countdown_timer.cancel();
        self.feedback_timer.cancel();
    }
}

fn severity_icon(severity: FeedbackSeverity) -> &'static str {
    match severity {
        FeedbackSeverity::Success => "✅",
        FeedbackSeverity::Warning => "⚠️ ",
        FeedbackSeverity::Error => "❌",
        FeedbackSeverity::Info => "ℹ️ ",
    }
}

fn overlay_marker(overlay: OverlayState) -> &'static str {
    match (overlay.analyzing, overlay.ready) {
        (_, true) => "[■]",
        (true, false) => "[▣]",
        _ => "[□]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn display() -> TerminalDisplay {
        TerminalDisplay::new(Duration::from_millis(1000), Duration::from_millis(3000)).quiet()
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_clears_after_hold() {
        let display = display();
        display.show_countdown(3);
        assert_eq!(display.snapshot().countdown, Some(3));

        sleep(Duration::from_millis(999)).await;
        assert_eq!(display.snapshot().countdown, Some(3));

        sleep(Duration::from_millis(2)).await;
        assert_eq!(display.snapshot().countdown, None);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_countdown_is_not_cleared_by_old_timer() {
        let display = display();
        display.show_countdown(3);
        sleep(Duration::from_millis(900)).await;
        display.show_countdown(2);

        // 첫 번째 타이머 만료 시각 (1000ms) 이후에도 2는 남아 있어야 함
        sleep(Duration::from_millis(200)).await;
        assert_eq!(display.snapshot().countdown, Some(2));

        sleep(Duration::from_millis(801)).await;
        assert_eq!(display.snapshot().countdown, None);
    }

    #[tokio::test(start_paused = true)]
    async fn hide_cancels_pending_clear() {
        let display = display();
        display.show_countdown(1);
        display.hide_countdown();
        assert_eq!(display.snapshot().countdown, None);

        display.show_countdown(3);
        sleep(Duration::from_millis(500)).await;
        assert_eq!(display.snapshot().countdown, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_auto_clears() {
        let display = display();
        display.show_feedback("Capture failed", FeedbackSeverity::Error);
        assert_eq!(
            display.snapshot().feedback,
            Some(("Capture failed".to_string(), FeedbackSeverity::Error))
        );

        sleep(Duration::from_millis(3001)).await;
        assert_eq!(display.snapshot().feedback, None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_feedback_restarts_timer() {
        let display = display();
        display.show_feedback("Upload failed", FeedbackSeverity::Error);
        sleep(Duration::from_millis(2000)).await;
        display.show_feedback("ID uploaded successfully!", FeedbackSeverity::Success);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            display.snapshot().feedback.map(|(m, _)| m),
            Some("ID uploaded successfully!".to_string())
        );

        sleep(Duration::from_millis(1501)).await;
        assert_eq!(display.snapshot().feedback, None);
    }

    #[test]
    fn works_without_runtime() {
        let display = display();
        display.show_countdown(3);
        display.show_feedback("Auto-capture failed", FeedbackSeverity::Error);
        assert_eq!(display.snapshot().countdown, Some(3));
        assert!(display.snapshot().feedback.is_some());
    }

    #[test]
    fn guidance_and_overlay_recorded() {
        let display = display();
        let overlay = OverlayState {
            analyzing: true,
            ready: false,
        };
        display.update_guidance("ID detected! Hold steady... (2 more frames)", overlay);

        let state = display.snapshot();
        assert_eq!(state.guidance, "ID detected! Hold steady... (2 more frames)");
        assert_eq!(state.overlay, overlay);

        display.update_guidance("", OverlayState::default());
        assert_eq!(display.snapshot().guidance, "");
        assert_eq!(display.snapshot().overlay, OverlayState::default());
    }
}
