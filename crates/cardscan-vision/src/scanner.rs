//! ID 카드 스캐너 위젯 컨트롤러.
//!
//! 파일 업로드와 카메라 캡처 두 경로로 위젯 값(`FileData`)을 채운다.
//! 카메라 리소스는 한 번에 한 세션만 소유하며, 새 세션을 열기 전에 이전
//! 세션을 멈추고 소스를 해제한다.
//!
//! 세션 시작/종료/교체마다 epoch를 올려서 이미 발화 대기 중인 이전
//! 세션의 타이머가 새 상태를 건드리지 못하게 한다.

use crate::capture::CapturePipeline;
use crate::session::{CaptureHandoff, ScanSession, SessionExit};
use crate::stability::StabilityTracker;
use crate::upload::prepare_upload;
use cardscan_core::config::ScannerConfig;
use cardscan_core::error::CoreError;
use cardscan_core::models::artifact::{CaptureMode, FileData};
use cardscan_core::models::scan::{FeedbackSeverity, OverlayState};
use cardscan_core::ports::capture_sink::CaptureSink;
use cardscan_core::ports::frame_source::FrameSource;
use cardscan_core::ports::notifier::ScanNotifier;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 수동 캡처 실패 피드백
pub const FEEDBACK_CAPTURE_FAILED: &str = "Capture failed";
/// 업로드 성공 피드백
pub const FEEDBACK_UPLOAD_SUCCESS: &str = "ID uploaded successfully!";
/// 업로드 실패 피드백
pub const FEEDBACK_UPLOAD_FAILED: &str = "Upload failed";

/// 다시 찍기: 카메라를 닫고 다시 열기까지의 지연
pub const RETAKE_DELAY: Duration = Duration::from_millis(100);

/// 열린 카메라 세션
struct ActiveCamera {
    epoch: u64,
    source: Arc<dyn FrameSource>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

/// 카메라 세션 슬롯 + epoch (세션 태스크와 공유)
struct CameraSlot {
    active: Mutex<Option<ActiveCamera>>,
    epoch: Arc<AtomicU64>,
}

impl CameraSlot {
    /// 세션 정지. `only_epoch`가 주어지면 그 세션일 때만 정지한다.
    fn stop(&self, only_epoch: Option<u64>) -> bool {
        let camera = {
            let mut active = self.active.lock();
            let matches = match (active.as_ref(), only_epoch) {
                (None, _) => false,
                (Some(cam), Some(epoch)) => cam.epoch == epoch,
                (Some(_), None) => true,
            };
            if !matches {
                return false;
            }
            active.take()
        };
        let Some(camera) = camera else {
            return false;
        };

        self.epoch.fetch_add(1, Ordering::AcqRel);
        let _ = camera.shutdown.send(true);
        if only_epoch.is_none() {
            if let Some(task) = camera.task {
                task.abort();
            }
        }
        camera.source.release();
        info!("카메라 세션 종료 (epoch {})", camera.epoch);
        true
    }
}

/// ID 카드 스캐너
pub struct CardScanner {
    config: ScannerConfig,
    notifier: Arc<dyn ScanNotifier>,
    handoff: CaptureHandoff,
    tracker: Arc<Mutex<StabilityTracker>>,
    camera: Arc<CameraSlot>,
    disabled: AtomicBool,
}

impl CardScanner {
    /// 스캐너 생성. 설정 검증에 실패하면 세션을 하나도 만들지 않는다.
    pub fn new(
        config: ScannerConfig,
        notifier: Arc<dyn ScanNotifier>,
        sink: Arc<dyn CaptureSink>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let tracker = Arc::new(Mutex::new(StabilityTracker::from_config(&config.detection)));
        Ok(Self {
            handoff: CaptureHandoff::new(sink, config.upload.clone()),
            config,
            notifier,
            tracker,
            camera: Arc::new(CameraSlot {
                active: Mutex::new(None),
                epoch: Arc::new(AtomicU64::new(0)),
            }),
            disabled: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    fn ensure_enabled(&self) -> Result<(), CoreError> {
        if self.is_disabled() {
            return Err(CoreError::validation("scanner", "비활성화 상태"));
        }
        Ok(())
    }

    // ============================================================
    // 카메라 세션
    // ============================================================

    /// 카메라 세션 시작
    ///
    /// 이전 세션이 있으면 먼저 정지한다. tokio 런타임 안에서 호출해야 한다.
    pub fn open_camera(&self, source: Arc<dyn FrameSource>) -> Result<(), CoreError> {
        self.ensure_enabled()?;
        self.close_camera();

        self.tracker.lock().reset();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut active = self.camera.active.lock();
        let epoch = self.camera.epoch.fetch_add(1, Ordering::AcqRel) + 1;

        let session = ScanSession::new(
            &self.config,
            source.clone(),
            self.tracker.clone(),
            self.notifier.clone(),
            self.handoff.clone(),
            self.camera.epoch.clone(),
            epoch,
        );

        let slot = self.camera.clone();
        let task = tokio::spawn(async move {
            if session.run(shutdown_rx).await == SessionExit::Captured {
                slot.stop(Some(epoch));
            }
        });

        *active = Some(ActiveCamera {
            epoch,
            source,
            shutdown: shutdown_tx,
            task: Some(task),
        });
        info!(
            "카메라 세션 시작 (epoch {}, 자동 캡처 {})",
            epoch, self.config.auto_capture_enabled
        );
        Ok(())
    }

    /// 카메라 세션 종료 (열려 있지 않으면 no-op)
    pub fn close_camera(&self) {
        if self.camera.stop(None) {
            self.tracker.lock().reset();
            self.notifier.hide_countdown();
            self.notifier.update_guidance("", OverlayState::default());
        }
    }

    pub fn is_camera_open(&self) -> bool {
        self.camera.active.lock().is_some()
    }

    /// 현재 세션 epoch
    pub fn session_epoch(&self) -> u64 {
        self.camera.epoch.load(Ordering::Acquire)
    }

    /// 자동 캡처 쿨다운 기준 시각이 기록됐는지
    pub fn has_recent_capture(&self) -> bool {
        self.tracker.lock().last_capture().is_some()
    }

    /// 수동 캡처: 안정화/카운트다운을 거치지 않고 즉시 캡처
    pub async fn manual_capture(&self) -> Result<(), CoreError> {
        self.ensure_enabled()?;
        let source = self
            .camera
            .active
            .lock()
            .as_ref()
            .map(|cam| cam.source.clone())
            .ok_or(CoreError::SessionClosed)?;

        let pipeline = CapturePipeline::from_config(&self.config.capture);
        let result = match pipeline.capture(source.as_ref(), CaptureMode::Manual) {
            Ok(artifact) => self.handoff.deliver(artifact).await,
            Err(e) => {
                self.handoff.sink().capture_failed(&e).await;
                Err(e)
            }
        };

        match result {
            Ok(_) => {
                self.notifier
                    .show_feedback(FEEDBACK_UPLOAD_SUCCESS, FeedbackSeverity::Success);
                if self.config.close_on_capture {
                    self.close_camera();
                }
                Ok(())
            }
            Err(e) => {
                warn!("수동 캡처 실패: {}", e);
                self.notifier
                    .show_feedback(FEEDBACK_CAPTURE_FAILED, FeedbackSeverity::Error);
                Err(e)
            }
        }
    }

    /// 다시 찍기: 캡처 값을 지우고 잠시 뒤 새 소스로 카메라를 다시 연다
    pub async fn retake(&self, source: Arc<dyn FrameSource>) -> Result<(), CoreError> {
        self.ensure_enabled()?;
        self.close_camera();
        self.handoff.change_value(None).await;

        tokio::time::sleep(RETAKE_DELAY).await;
        self.open_camera(source)
    }

    // ============================================================
    // 업로드 / 위젯 값
    // ============================================================

    /// 파일 업로드
    pub async fn upload_file(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
    ) -> Result<FileData, CoreError> {
        self.ensure_enabled()?;
        match prepare_upload(bytes, name, mime_type, &self.config.upload) {
            Ok(data) => {
                self.handoff.change_value(Some(data.clone())).await;
                self.notifier
                    .show_feedback(FEEDBACK_UPLOAD_SUCCESS, FeedbackSeverity::Success);
                Ok(data)
            }
            Err(e) => {
                warn!("업로드 실패: {}: {}", name, e);
                self.notifier
                    .show_feedback(FEEDBACK_UPLOAD_FAILED, FeedbackSeverity::Error);
                Err(e)
            }
        }
    }

    pub fn value(&self) -> Option<FileData> {
        self.handoff.value()
    }

    /// 값 설정 (싱크 알림 없음)
    pub fn set_value(&self, value: Option<FileData>) {
        self.handoff.set_value(value);
    }

    /// 값 초기화
    pub fn reset(&self) {
        self.handoff.set_value(None);
        debug!("위젯 값 초기화");
    }

    /// 파일 제거: 값 초기화 + 싱크 알림
    pub async fn remove_file(&self) {
        self.handoff.change_value(None).await;
    }

    // ============================================================
    // 활성화 / 정리
    // ============================================================

    /// 비활성화: 열린 카메라도 닫는다
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Release);
        self.close_camera();
    }

    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Release);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// 위젯 정리: 세션과 타이머를 모두 정지
    pub fn destroy(&self) {
        self.close_camera();
        self.tracker.lock().reset();
        info!("스캐너 정리 완료");
    }
}

impl Drop for CardScanner {
    fn drop(&mut self) {
        self.camera.stop(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_notifier::ChannelNotifier;
    use crate::session::test_support::*;
    use crate::source::ImageFrameSource;
    use cardscan_core::models::scan::ScanEvent;
    use tokio::sync::mpsc;

    fn scanner(
        config: ScannerConfig,
    ) -> (
        CardScanner,
        Arc<RecordingSink>,
        mpsc::UnboundedReceiver<ScanEvent>,
    ) {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, rx) = ChannelNotifier::channel();
        (
            CardScanner::new(config, Arc::new(notifier), sink.clone()).unwrap(),
            sink,
            rx,
        )
    }

    fn feedback(rx: &mut mpsc::UnboundedReceiver<ScanEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let ScanEvent::Feedback { message, .. } = ev {
                out.push(message);
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn auto_capture_closes_camera_and_sets_value() {
        let (scanner, sink, _rx) = scanner(ScannerConfig::default());
        let source = Arc::new(ImageFrameSource::with_frame(striped_frame(640, 480)));

        scanner.open_camera(source.clone()).unwrap();
        assert!(scanner.is_camera_open());

        tokio::time::sleep(Duration::from_millis(6000)).await;

        assert_eq!(sink.artifacts.lock().len(), 1);
        assert!(!scanner.is_camera_open());
        assert!(source.is_released());
        let value = scanner.value().unwrap();
        assert_eq!(value.name, "camera-capture.jpg");
        assert_eq!(value.mime_type, "image/jpeg");
        assert_eq!(sink.changes.lock().last().cloned().flatten(), Some(value));
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_releases_previous_source() {
        let (scanner, _sink, _rx) = scanner(ScannerConfig::default());
        let first = Arc::new(ImageFrameSource::with_frame(gray_frame(64, 64)));
        let second = Arc::new(ImageFrameSource::with_frame(gray_frame(64, 64)));

        scanner.open_camera(first.clone()).unwrap();
        let epoch = scanner.session_epoch();
        scanner.open_camera(second.clone()).unwrap();

        assert!(first.is_released());
        assert!(!second.is_released());
        assert!(scanner.session_epoch() > epoch);
        assert!(scanner.is_camera_open());
    }

    #[tokio::test(start_paused = true)]
    async fn second_cycle_waits_for_cooldown_across_sessions() {
        let mut config = ScannerConfig::default();
        config.detection.warmup_delay_ms = 0;
        let (scanner, sink, _rx) = scanner(config);

        // 트리거 900ms → 캡처 3900ms
        scanner
            .open_camera(Arc::new(ImageFrameSource::with_frame(striped_frame(640, 480))))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(sink.artifacts.lock().len(), 1);
        assert!(!scanner.is_camera_open());

        // 재오픈 4000ms → 4900ms에 연속 3회지만 쿨다운(6900ms까지)으로 트리거 보류
        scanner
            .open_camera(Arc::new(ImageFrameSource::with_frame(striped_frame(640, 480))))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(sink.artifacts.lock().len(), 1);

        // 쿨다운 뒤 첫 틱 7000ms 트리거 → 10000ms 캡처
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(sink.artifacts.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_capture_bypasses_stability() {
        let (scanner, sink, _rx) = scanner(ScannerConfig::default());
        scanner
            .open_camera(Arc::new(ImageFrameSource::with_frame(gray_frame(640, 480))))
            .unwrap();

        scanner.manual_capture().await.unwrap();
        assert_eq!(sink.artifacts.lock().len(), 1);
        assert_eq!(sink.artifacts.lock()[0].mode, CaptureMode::Manual);
        assert!(!scanner.is_camera_open());
        assert!(!scanner.has_recent_capture());
    }

    #[tokio::test(start_paused = true)]
    async fn large_capture_value_goes_through_upload_limits() {
        let (scanner, sink, mut rx) = scanner(ScannerConfig::default());
        scanner
            .open_camera(Arc::new(ImageFrameSource::with_frame(noisy_frame(1920, 1080))))
            .unwrap();

        scanner.manual_capture().await.unwrap();

        // 싱크에는 원본 크롭 (1632x1020, q92)
        let artifact = sink.artifacts.lock()[0].clone();
        assert_eq!((artifact.width, artifact.height), (1632, 1020));
        assert!(artifact.image_bytes.len() > scanner.config().upload.max_file_size);

        // 위젯 값은 긴 변 1280으로 축소된 JPEG
        let value = scanner.value().unwrap();
        assert_eq!(value.name, "camera-capture.jpg");
        assert_eq!(value.mime_type, "image/jpeg");
        let bytes = value.decode().unwrap();
        assert!(bytes.len() < artifact.image_bytes.len());
        let decoded = crate::encoder::decode_image(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1280, 800));

        assert_eq!(sink.changes.lock().as_slice(), &[Some(value)]);
        assert_eq!(feedback(&mut rx), vec![FEEDBACK_UPLOAD_SUCCESS.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn retake_clears_value_and_reopens_after_delay() {
        let (scanner, sink, _rx) = scanner(ScannerConfig::default());
        let first = Arc::new(ImageFrameSource::with_frame(gray_frame(640, 480)));
        scanner.open_camera(first.clone()).unwrap();
        scanner.manual_capture().await.unwrap();
        assert!(scanner.value().is_some());
        assert!(!scanner.is_camera_open());

        let second = Arc::new(ImageFrameSource::with_frame(gray_frame(640, 480)));
        let start = tokio::time::Instant::now();
        scanner.retake(second.clone()).await.unwrap();

        assert!(start.elapsed() >= RETAKE_DELAY);
        assert_eq!(scanner.value(), None);
        assert_eq!(sink.changes.lock().last(), Some(&None));
        assert!(scanner.is_camera_open());
        assert!(first.is_released());
        assert!(!second.is_released());
        scanner.destroy();
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = ScannerConfig::default();
        config.detection.sample_interval_ms = 0;
        let (notifier, _rx) = ChannelNotifier::channel();

        let result = CardScanner::new(
            config,
            Arc::new(notifier),
            Arc::new(RecordingSink::default()),
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_capture_failure_reports_feedback() {
        let (scanner, sink, mut rx) = scanner(ScannerConfig::default());
        scanner
            .open_camera(Arc::new(ImageFrameSource::new()))
            .unwrap();

        let err = scanner.manual_capture().await.unwrap_err();
        assert!(matches!(err, CoreError::SourceNotReady));
        assert_eq!(sink.failures.lock().len(), 1);
        assert!(sink.artifacts.lock().is_empty());
        assert_eq!(feedback(&mut rx), vec![FEEDBACK_CAPTURE_FAILED.to_string()]);
        assert!(scanner.is_camera_open());
    }

    #[tokio::test]
    async fn manual_capture_without_camera_is_session_closed() {
        let (scanner, _sink, _rx) = scanner(ScannerConfig::default());
        let err = scanner.manual_capture().await.unwrap_err();
        assert!(matches!(err, CoreError::SessionClosed));
    }

    #[tokio::test]
    async fn upload_sets_value_and_feedback() {
        let (scanner, sink, mut rx) = scanner(ScannerConfig::default());

        let data = scanner
            .upload_file(b"small file", "id.png", "image/png")
            .await
            .unwrap();
        assert_eq!(scanner.value(), Some(data.clone()));
        assert_eq!(sink.changes.lock().as_slice(), &[Some(data)]);
        assert_eq!(feedback(&mut rx), vec![FEEDBACK_UPLOAD_SUCCESS.to_string()]);

        scanner.remove_file().await;
        assert_eq!(scanner.value(), None);
        assert_eq!(sink.changes.lock().last(), Some(&None));
    }

    #[tokio::test]
    async fn upload_failure_reports_feedback() {
        let mut config = ScannerConfig::default();
        config.upload.max_file_size = 4;
        let (scanner, _sink, mut rx) = scanner(config);

        assert!(scanner
            .upload_file(b"not an image", "x.jpg", "image/jpeg")
            .await
            .is_err());
        assert_eq!(scanner.value(), None);
        assert_eq!(feedback(&mut rx), vec![FEEDBACK_UPLOAD_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn disabled_scanner_rejects_actions() {
        let (scanner, _sink, _rx) = scanner(ScannerConfig::default());
        scanner.disable();

        let err = scanner
            .open_camera(Arc::new(ImageFrameSource::new()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(scanner.upload_file(b"x", "a", "b").await.is_err());

        scanner.enable();
        assert!(scanner.open_camera(Arc::new(ImageFrameSource::new())).is_ok());
        scanner.destroy();
        assert!(!scanner.is_camera_open());
    }

    #[test]
    fn set_value_and_reset_do_not_notify() {
        let (scanner, sink, _rx) = scanner(ScannerConfig::default());
        let data = FileData::from_bytes(b"abc", "a.jpg", "image/jpeg");
        scanner.set_value(Some(data.clone()));
        assert_eq!(scanner.value(), Some(data));
        scanner.reset();
        assert_eq!(scanner.value(), None);
        assert!(sink.changes.lock().is_empty());
    }
}
