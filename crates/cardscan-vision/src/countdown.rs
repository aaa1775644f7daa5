//! 카운트다운 감독자.
//!
//! 트리거 후 초 단위 카운트다운을 표시하면서 샘플링 주기마다 프레임을 다시
//! 검증한다. 두 타이머는 같은 태스크의 `select!` 안에서 돌기 때문에 한쪽이
//! 에피소드를 끝내면 다른 쪽은 더 이상 발화하지 않는다.

use cardscan_core::config::{CountdownConfig, DetectionConfig};
use cardscan_core::ports::notifier::ScanNotifier;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// 검증 타이머 최소 주기 (0 주기 interval 방지)
const MIN_TICK: Duration = Duration::from_millis(1);

/// 카운트다운 중단 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// 연속 실패 판정이 허용치에 도달
    ValidationFailed,
    /// 카메라 세션 종료
    SessionClosed,
}

/// 카운트다운 에피소드 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum CountdownOutcome {
    Succeeded,
    Aborted(AbortReason),
}

/// 에피소드 하나의 상태 (에피소드가 끝나면 버려진다)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    pub remaining_seconds: u32,
    pub consecutive_failures: u32,
    pub cancelled: bool,
}

impl CountdownState {
    fn new(seconds: u32) -> Self {
        Self {
            remaining_seconds: seconds,
            consecutive_failures: 0,
            cancelled: false,
        }
    }
}

/// 카운트다운 감독자
pub struct CountdownSupervisor {
    seconds: u32,
    tick: Duration,
    max_failures: u32,
    notifier: Arc<dyn ScanNotifier>,
}

impl CountdownSupervisor {
    pub fn new(
        seconds: u32,
        tick: Duration,
        max_failures: u32,
        notifier: Arc<dyn ScanNotifier>,
    ) -> Self {
        Self {
            seconds,
            tick: tick.max(MIN_TICK),
            max_failures: max_failures.max(1),
            notifier,
        }
    }

    pub fn from_config(
        countdown: &CountdownConfig,
        detection: &DetectionConfig,
        notifier: Arc<dyn ScanNotifier>,
    ) -> Self {
        Self::new(
            countdown.seconds,
            detection.sample_interval(),
            countdown.max_failed_detections,
            notifier,
        )
    }

    /// 에피소드 실행
    ///
    /// `validate`는 검증 틱마다 호출되며 양성 판정이면 `true`.
    /// `shutdown` 신호가 오거나 송신측이 사라지면 세션 종료로 중단한다.
    pub async fn run<F>(
        &self,
        mut validate: F,
        shutdown: &mut watch::Receiver<bool>,
    ) -> CountdownOutcome
    where
        F: FnMut() -> bool,
    {
        if *shutdown.borrow() {
            return CountdownOutcome::Aborted(AbortReason::SessionClosed);
        }

        let mut state = CountdownState::new(self.seconds);
        info!("카운트다운 시작: {}초", self.seconds);

        if state.remaining_seconds == 0 {
            return CountdownOutcome::Succeeded;
        }
        self.notifier.show_countdown(state.remaining_seconds);

        let start = Instant::now();
        let second = Duration::from_secs(1);
        let mut second_timer = interval_at(start + second, second);
        let mut validation_timer = interval_at(start + self.tick, self.tick);

        let outcome = loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    state.cancelled = true;
                    break CountdownOutcome::Aborted(AbortReason::SessionClosed);
                }

                _ = second_timer.tick() => {
                    state.remaining_seconds = state.remaining_seconds.saturating_sub(1);
                    if state.remaining_seconds == 0 {
                        break CountdownOutcome::Succeeded;
                    }
                    self.notifier.show_countdown(state.remaining_seconds);
                }

                _ = validation_timer.tick() => {
                    if validate() {
                        state.consecutive_failures = 0;
                    } else {
                        state.consecutive_failures += 1;
                        debug!(
                            "카운트다운 검증 실패 {}/{}",
                            state.consecutive_failures, self.max_failures
                        );
                        if state.consecutive_failures >= self.max_failures {
                            state.cancelled = true;
                            break CountdownOutcome::Aborted(AbortReason::ValidationFailed);
                        }
                    }
                }
            }
        };

        self.notifier.hide_countdown();
        info!("카운트다운 종료: {:?} ({:?})", outcome, start.elapsed());
        outcome
    }
}
