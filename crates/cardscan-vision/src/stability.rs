//! 안정화 추적기.
//!
//! 틱마다 들어오는 판정을 받아 "연속 N회 양성"을 1회성 캡처 트리거로 바꾼다.
//! 음성 판정 하나면 처음부터 다시 센다. 트리거 후에는 캡처 사이클이 끝나
//! `reset`/`complete_capture`가 호출될 때까지 새 판정을 무시한다.
//!
//! 자동 캡처 직후에는 쿨다운 동안 다시 트리거하지 않는다.

use cardscan_core::config::DetectionConfig;
use cardscan_core::models::scan::OverlayState;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// 추적기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilityState {
    /// 대기
    #[default]
    Idle,
    /// 연속 양성 누적 중
    Accumulating { count: u32 },
    /// 트리거됨: 캡처 사이클 진행 중
    Armed,
}

/// 판정 한 번을 반영한 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityEvent {
    /// 캡처 사이클 진행 중이라 무시
    Ignored,
    /// 음성 판정으로 초기화 (`was_tracking`: 누적 중이었는지)
    Reset { was_tracking: bool },
    /// 누적 진행
    Progress { count: u32, remaining: u32 },
    /// 연속 조건은 채웠지만 쿨다운 중
    CoolingDown { remaining: Duration },
    /// 캡처 트리거 (1회성)
    Triggered,
}

/// 외부 노출용 상태 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilitySnapshot {
    pub consecutive_positive: u32,
    pub analyzing: bool,
    pub ready: bool,
    pub pending_capture: bool,
}

/// 안정화 추적기
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    state: StabilityState,
    required_frames: u32,
    cooldown: Duration,
    /// 마지막 자동 캡처 시각 (세션이 바뀌어도 유지)
    last_capture: Option<Instant>,
}

impl StabilityTracker {
    pub fn new(required_frames: u32, cooldown: Duration) -> Self {
        Self {
            state: StabilityState::Idle,
            required_frames: required_frames.max(1),
            cooldown,
            last_capture: None,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.required_stable_frames, config.capture_cooldown())
    }

    /// 판정 반영 (단일 전이 함수)
    pub fn observe(&mut self, detected: bool, now: Instant) -> StabilityEvent {
        match (self.state, detected) {
            (StabilityState::Armed, _) => StabilityEvent::Ignored,
            (state, false) => {
                self.state = StabilityState::Idle;
                StabilityEvent::Reset {
                    was_tracking: state != StabilityState::Idle,
                }
            }
            (state, true) => {
                let previous = match state {
                    StabilityState::Accumulating { count } => count,
                    _ => 0,
                };
                let count = (previous + 1).min(self.required_frames);

                if count < self.required_frames {
                    self.state = StabilityState::Accumulating { count };
                    return StabilityEvent::Progress {
                        count,
                        remaining: self.required_frames - count,
                    };
                }

                if let Some(remaining) = self.cooldown_remaining(now) {
                    self.state = StabilityState::Accumulating { count };
                    debug!("자동 캡처 쿨다운: {:?} 남음", remaining);
                    return StabilityEvent::CoolingDown { remaining };
                }

                self.state = StabilityState::Armed;
                info!("안정 프레임 {}회 연속: 캡처 트리거", self.required_frames);
                StabilityEvent::Triggered
            }
        }
    }

    /// 대기 상태로 초기화 (멱등)
    pub fn reset(&mut self) {
        self.state = StabilityState::Idle;
    }

    /// 캡처 사이클 종료: 쿨다운 시각 기록 후 초기화
    pub fn complete_capture(&mut self, now: Instant) {
        self.last_capture = Some(now);
        self.reset();
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == StabilityState::Armed
    }

    pub fn last_capture(&self) -> Option<Instant> {
        self.last_capture
    }

    pub fn snapshot(&self) -> StabilitySnapshot {
        match self.state {
            StabilityState::Idle => StabilitySnapshot::default(),
            StabilityState::Accumulating { count } => StabilitySnapshot {
                consecutive_positive: count,
                analyzing: true,
                ready: false,
                pending_capture: false,
            },
            // 트리거 시 카운터는 0으로 돌아간다
            StabilityState::Armed => StabilitySnapshot {
                consecutive_positive: 0,
                analyzing: true,
                ready: true,
                pending_capture: true,
            },
        }
    }

    /// 가이드 오버레이 상태
    pub fn overlay(&self) -> OverlayState {
        let s = self.snapshot();
        OverlayState {
            analyzing: s.analyzing,
            ready: s.ready,
        }
    }

    fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_capture?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.cooldown {
            Some(self.cooldown - elapsed)
        } else {
            None
        }
    }
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}
