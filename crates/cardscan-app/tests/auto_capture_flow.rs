//! 자동 캡처 흐름 통합 테스트.
//!
//! 프레임 소스 → 감지 → 안정화 → 카운트다운 → 캡처 → 싱크 cross-crate 연동.
//! 모든 타이밍은 tokio 가상 시계로 진행한다.

use async_trait::async_trait;
use cardscan_core::config::ScannerConfig;
use cardscan_core::error::CoreError;
use cardscan_core::models::artifact::{CaptureMode, CapturedArtifact, FileData};
use cardscan_core::models::scan::ScanEvent;
use cardscan_core::models::verdict::GUIDANCE_TEXT_UNCLEAR;
use cardscan_core::ports::capture_sink::CaptureSink;
use cardscan_vision::channel_notifier::ChannelNotifier;
use cardscan_vision::encoder::decode_image;
use cardscan_vision::scanner::CardScanner;
use cardscan_vision::session::GUIDANCE_AUTO_CAPTURING;
use cardscan_vision::source::ImageFrameSource;
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};

/// 캡처 결과물을 채널로 넘기는 싱크
struct ChannelSink {
    artifacts: mpsc::UnboundedSender<CapturedArtifact>,
}

#[async_trait]
impl CaptureSink for ChannelSink {
    async fn deliver(&self, artifact: CapturedArtifact) -> Result<(), CoreError> {
        let _ = self.artifacts.send(artifact);
        Ok(())
    }

    async fn capture_failed(&self, _error: &CoreError) {}

    async fn file_changed(&self, _value: Option<&FileData>) {}
}

/// 세로 줄무늬 (텍스트 대비 + 파란 계열): 카드로 판정되는 프레임
fn card_frame(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, _| {
        if x % 4 < 2 {
            Rgba([0, 0, 200, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

fn blank_frame(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255]))
}

struct Rig {
    scanner: CardScanner,
    source: Arc<ImageFrameSource>,
    events: mpsc::UnboundedReceiver<ScanEvent>,
    artifacts: mpsc::UnboundedReceiver<CapturedArtifact>,
}

fn rig(config: ScannerConfig, frame: RgbaImage) -> Rig {
    let (notifier, events) = ChannelNotifier::channel();
    let (tx, artifacts) = mpsc::unbounded_channel();
    let scanner = CardScanner::new(
        config,
        Arc::new(notifier),
        Arc::new(ChannelSink { artifacts: tx }),
    )
    .unwrap();
    Rig {
        scanner,
        source: Arc::new(ImageFrameSource::with_frame(frame)),
        events,
        artifacts,
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// 안정된 카드 프레임 → 워밍업 + 3틱 + 3초 카운트다운 뒤 자동 캡처
#[tokio::test(start_paused = true)]
async fn stable_card_is_captured_automatically() {
    let mut rig = rig(ScannerConfig::default_config(), card_frame(640, 480));
    let started = Instant::now();
    rig.scanner.open_camera(rig.source.clone()).unwrap();

    let artifact = timeout(Duration::from_secs(10), rig.artifacts.recv())
        .await
        .expect("10초 안에 캡처되어야 함")
        .unwrap();
    let elapsed = started.elapsed();

    // 워밍업 2000 + 틱 3회 900 + 카운트다운 3000
    assert!(
        elapsed >= Duration::from_millis(5800) && elapsed <= Duration::from_millis(6100),
        "캡처 시각: {:?}",
        elapsed
    );
    assert_eq!(artifact.mode, CaptureMode::Auto);
    assert_eq!(artifact.mime_type, "image/jpeg");
    assert_eq!((artifact.width, artifact.height), (544, 340));

    let decoded = decode_image(&artifact.image_bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (544, 340));

    let events = drain(&mut rig.events);
    let countdown: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::CountdownShown { count } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(countdown, vec![3, 2, 1]);
    assert!(events.iter().any(|e| matches!(
        e,
        ScanEvent::Guidance { text, overlay } if text == GUIDANCE_AUTO_CAPTURING && overlay.ready
    )));

    // 캡처 후 세션 종료 + 소스 해제
    sleep(Duration::from_millis(50)).await;
    assert!(!rig.scanner.is_camera_open());
    assert!(rig.source.is_released());
}

/// 카드가 아닌 프레임 → 카운트다운 없이 안내 문구만
#[tokio::test(start_paused = true)]
async fn blank_frame_never_triggers() {
    let mut rig = rig(ScannerConfig::default_config(), blank_frame(640, 480));
    rig.scanner.open_camera(rig.source.clone()).unwrap();

    sleep(Duration::from_secs(10)).await;
    assert!(rig.artifacts.try_recv().is_err());
    assert!(rig.scanner.is_camera_open());

    let events = drain(&mut rig.events);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ScanEvent::CountdownShown { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        ScanEvent::Guidance { text, overlay } if text == GUIDANCE_TEXT_UNCLEAR && !overlay.analyzing
    )));

    rig.scanner.destroy();
    assert!(rig.source.is_released());
}

/// 카운트다운 중 카드를 치우면 중단되고, 다시 놓으면 재시도 후 캡처
#[tokio::test(start_paused = true)]
async fn card_removed_during_countdown_then_recaptured() {
    let mut rig = rig(ScannerConfig::default_config(), card_frame(640, 480));
    rig.scanner.open_camera(rig.source.clone()).unwrap();

    // 첫 카운트다운 시작까지 대기
    loop {
        let event = timeout(Duration::from_secs(5), rig.events.recv())
            .await
            .expect("카운트다운이 시작되어야 함")
            .unwrap();
        if event == (ScanEvent::CountdownShown { count: 3 }) {
            break;
        }
    }

    rig.source.set_frame(blank_frame(640, 480));
    sleep(Duration::from_millis(1500)).await;

    let events = drain(&mut rig.events);
    assert!(events.contains(&ScanEvent::CountdownHidden));
    assert!(rig.artifacts.try_recv().is_err());

    rig.source.set_frame(card_frame(640, 480));
    let artifact = timeout(Duration::from_secs(10), rig.artifacts.recv())
        .await
        .expect("카드를 다시 놓으면 캡처되어야 함")
        .unwrap();
    assert_eq!(artifact.mode, CaptureMode::Auto);
}

/// 세션을 닫으면 대기 중인 카운트다운도 캡처하지 않는다
#[tokio::test(start_paused = true)]
async fn closing_during_countdown_cancels_capture() {
    let mut rig = rig(ScannerConfig::default_config(), card_frame(640, 480));
    rig.scanner.open_camera(rig.source.clone()).unwrap();

    sleep(Duration::from_millis(3500)).await;
    assert!(drain(&mut rig.events)
        .iter()
        .any(|e| matches!(e, ScanEvent::CountdownShown { .. })));

    rig.scanner.close_camera();
    sleep(Duration::from_secs(10)).await;
    assert!(rig.artifacts.try_recv().is_err());
    assert!(rig.source.is_released());
}

/// 캡처 후에도 세션을 유지하면 쿨다운 동안 재캡처하지 않는다
#[tokio::test(start_paused = true)]
async fn keep_open_respects_cooldown() {
    let mut config = ScannerConfig::default_config();
    config.close_on_capture = false;
    let mut rig = rig(config, card_frame(640, 480));
    rig.scanner.open_camera(rig.source.clone()).unwrap();

    timeout(Duration::from_secs(10), rig.artifacts.recv())
        .await
        .unwrap()
        .unwrap();
    let first = Instant::now();
    assert!(rig.scanner.is_camera_open());
    assert!(rig.scanner.has_recent_capture());

    timeout(Duration::from_secs(20), rig.artifacts.recv())
        .await
        .unwrap()
        .unwrap();
    // 쿨다운 3000 + 카운트다운 3000 이상 간격
    assert!(first.elapsed() >= Duration::from_millis(6000));

    rig.scanner.destroy();
}
