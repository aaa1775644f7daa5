//! 카메라 스캔 세션.
//!
//! 카메라 한 번 열림 = 세션 하나. 워밍업 후 샘플링 주기마다 프레임을 판정해
//! 안정화 추적기에 넣고, 트리거되면 카운트다운 → 자동 캡처까지 진행한다.
//!
//! 모든 대기는 `shutdown` 신호와 함께 `select!` 되며, 틱마다 세션 epoch를
//! 확인해 이미 닫힌 세션의 타이머가 새 상태에 끼어들지 못하게 한다.

use crate::capture::CapturePipeline;
use crate::countdown::{AbortReason, CountdownOutcome, CountdownSupervisor};
use crate::detector::{FrameDetector, FrameEvaluation};
use crate::scanner::{FEEDBACK_UPLOAD_FAILED, FEEDBACK_UPLOAD_SUCCESS};
use crate::stability::{StabilityEvent, StabilityTracker};
use crate::upload::prepare_upload;
use cardscan_core::config::{ScannerConfig, UploadConfig};
use cardscan_core::error::CoreError;
use cardscan_core::models::artifact::{CaptureMode, CapturedArtifact, FileData};
use cardscan_core::models::scan::{FeedbackSeverity, OverlayState};
use cardscan_core::ports::capture_sink::CaptureSink;
use cardscan_core::ports::frame_source::FrameSource;
use cardscan_core::ports::notifier::ScanNotifier;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// 트리거 시 안내 문구
pub const GUIDANCE_AUTO_CAPTURING: &str = "Perfect! Auto-capturing...";
/// 자동 캡처 실패 피드백
pub const FEEDBACK_AUTO_CAPTURE_FAILED: &str = "Auto-capture failed";

/// 누적 중 안내 문구
pub fn hold_steady_guidance(remaining: u32) -> String {
    format!("ID detected! Hold steady... ({} more frames)", remaining)
}

/// 세션 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// 자동 캡처 성공 후 종료 (`close_on_capture`)
    Captured,
    /// 외부 종료 또는 세션 교체
    Closed,
}

/// 캡처 결과물 인계
///
/// 싱크에는 원본 결과물을 넘기고, 위젯 값은 업로드 전처리를 거친
/// (크기 초과 시 축소 + 재인코딩) 파일 데이터로 갱신한다.
#[derive(Clone)]
pub struct CaptureHandoff {
    sink: Arc<dyn CaptureSink>,
    upload: UploadConfig,
    value: Arc<Mutex<Option<FileData>>>,
}

impl CaptureHandoff {
    pub fn new(sink: Arc<dyn CaptureSink>, upload: UploadConfig) -> Self {
        Self {
            sink,
            upload,
            value: Arc::new(Mutex::new(None)),
        }
    }

    pub fn sink(&self) -> &Arc<dyn CaptureSink> {
        &self.sink
    }

    /// 현재 위젯 값
    pub fn value(&self) -> Option<FileData> {
        self.value.lock().clone()
    }

    /// 위젯 값 교체 (싱크 알림 없음)
    pub fn set_value(&self, value: Option<FileData>) {
        *self.value.lock() = value;
    }

    /// 위젯 값 교체 + 싱크 알림
    pub async fn change_value(&self, value: Option<FileData>) {
        self.set_value(value.clone());
        self.sink.file_changed(value.as_ref()).await;
    }

    /// 캡처 결과물 전달: 위젯 값으로 쓸 파일 데이터를 돌려준다
    pub async fn deliver(&self, artifact: CapturedArtifact) -> Result<FileData, CoreError> {
        let data = prepare_upload(
            &artifact.image_bytes,
            &artifact.source_name,
            &artifact.mime_type,
            &self.upload,
        )?;
        self.set_value(Some(data.clone()));
        self.sink.deliver(artifact).await?;
        self.sink.file_changed(Some(&data)).await;
        Ok(data)
    }
}

/// 스캔 세션
pub struct ScanSession {
    auto_capture: bool,
    close_on_capture: bool,
    warmup: Duration,
    tick: Duration,
    resume_delay: Duration,
    source: Arc<dyn FrameSource>,
    detector: FrameDetector,
    countdown: CountdownSupervisor,
    capture: CapturePipeline,
    tracker: Arc<Mutex<StabilityTracker>>,
    notifier: Arc<dyn ScanNotifier>,
    handoff: CaptureHandoff,
    epoch: Arc<AtomicU64>,
    session_epoch: u64,
}

impl ScanSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &ScannerConfig,
        source: Arc<dyn FrameSource>,
        tracker: Arc<Mutex<StabilityTracker>>,
        notifier: Arc<dyn ScanNotifier>,
        handoff: CaptureHandoff,
        epoch: Arc<AtomicU64>,
        session_epoch: u64,
    ) -> Self {
        Self {
            auto_capture: config.auto_capture_enabled,
            close_on_capture: config.close_on_capture,
            warmup: config.detection.warmup_delay(),
            tick: config.detection.sample_interval().max(Duration::from_millis(1)),
            resume_delay: config.detection.resume_delay(),
            source,
            detector: FrameDetector::from_config(&config.detection),
            countdown: CountdownSupervisor::from_config(
                &config.countdown,
                &config.detection,
                notifier.clone(),
            ),
            capture: CapturePipeline::from_config(&config.capture),
            tracker,
            notifier,
            handoff,
            epoch,
            session_epoch,
        }
    }

    fn is_current(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.session_epoch
    }

    fn push_guidance(&self, text: &str, overlay: OverlayState) {
        self.notifier.update_guidance(text, overlay);
    }

    /// 세션 실행: 종료 신호, 세션 교체, 또는 캡처 후 종료까지
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> SessionExit {
        info!("스캔 세션 시작 (epoch {})", self.session_epoch);

        if !self.auto_capture {
            // 수동 캡처 전용: 종료만 기다린다
            let _ = shutdown.changed().await;
            return SessionExit::Closed;
        }

        if !sleep_or_shutdown(self.warmup, &mut shutdown).await {
            return SessionExit::Closed;
        }
        debug!("워밍업 완료: 감지 시작");

        loop {
            if !self.detect_until_triggered(&mut shutdown).await {
                return SessionExit::Closed;
            }

            let outcome = self
                .countdown
                .run(
                    || {
                        self.is_current()
                            && self.detector.evaluate(self.source.as_ref()).is_positive()
                    },
                    &mut shutdown,
                )
                .await;

            match outcome {
                CountdownOutcome::Succeeded => {
                    if !self.is_current() {
                        return SessionExit::Closed;
                    }
                    let captured = self.auto_capture().await;
                    if captured && self.close_on_capture {
                        info!("자동 캡처 완료: 세션 종료");
                        return SessionExit::Captured;
                    }
                }
                CountdownOutcome::Aborted(AbortReason::ValidationFailed) => {
                    info!("카운트다운 중단: 감지 재개");
                    self.tracker.lock().reset();
                    self.push_guidance("", OverlayState::default());
                }
                CountdownOutcome::Aborted(AbortReason::SessionClosed) => {
                    return SessionExit::Closed;
                }
            }

            let resumed = sleep_or_shutdown(self.resume_delay, &mut shutdown).await;
            if !resumed || !self.is_current() {
                return SessionExit::Closed;
            }
        }
    }

    /// 트리거될 때까지 샘플링. 세션이 닫히면 `false`.
    async fn detect_until_triggered(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let mut ticker = interval_at(Instant::now() + self.tick, self.tick);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => return false,

                _ = ticker.tick() => {
                    if !self.is_current() {
                        debug!("이전 세션 틱 무시 (epoch {})", self.session_epoch);
                        return false;
                    }

                    // 점수 계산을 끝낸 뒤에 추적기에 반영
                    let verdict = match self.detector.evaluate(self.source.as_ref()) {
                        FrameEvaluation::NotReady => continue,
                        FrameEvaluation::Scored(verdict) => verdict,
                    };

                    let (event, overlay) = {
                        let mut tracker = self.tracker.lock();
                        let event = tracker.observe(verdict.detected, Instant::now());
                        (event, tracker.overlay())
                    };

                    match event {
                        StabilityEvent::Ignored => {}
                        StabilityEvent::Reset { .. } => {
                            self.push_guidance(&verdict.guidance, overlay);
                        }
                        StabilityEvent::Progress { remaining, .. } => {
                            self.push_guidance(&hold_steady_guidance(remaining), overlay);
                        }
                        StabilityEvent::CoolingDown { .. } => {
                            // 카운터는 임계값에서 멈추므로 남은 프레임은 0
                            self.push_guidance(&hold_steady_guidance(0), overlay);
                        }
                        StabilityEvent::Triggered => {
                            self.push_guidance(GUIDANCE_AUTO_CAPTURING, overlay);
                            return true;
                        }
                    }
                }
            }
        }
    }

    /// 자동 캡처: 성공 여부 반환
    async fn auto_capture(&self) -> bool {
        let result = self.capture.capture(self.source.as_ref(), CaptureMode::Auto);

        let captured = match result {
            Ok(artifact) => match self.handoff.deliver(artifact).await {
                Ok(_) => {
                    self.notifier
                        .show_feedback(FEEDBACK_UPLOAD_SUCCESS, FeedbackSeverity::Success);
                    true
                }
                Err(e) => {
                    warn!("캡처 결과물 전달 실패: {}", e);
                    self.notifier
                        .show_feedback(FEEDBACK_UPLOAD_FAILED, FeedbackSeverity::Error);
                    false
                }
            },
            Err(e) => {
                warn!("자동 캡처 실패: {}", e);
                self.notifier
                    .show_feedback(FEEDBACK_AUTO_CAPTURE_FAILED, FeedbackSeverity::Error);
                self.handoff.sink().capture_failed(&e).await;
                false
            }
        };

        // 성공/실패 모두 쿨다운 기준 시각으로 기록
        self.tracker.lock().complete_capture(Instant::now());
        self.push_guidance("", OverlayState::default());
        captured
    }
}

/// 지정 시간 대기. 그 사이 종료 신호가 오면 `false`.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.changed() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
