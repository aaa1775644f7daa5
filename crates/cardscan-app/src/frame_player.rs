//! 이미지 시퀀스 플레이어.
//!
//! 디렉토리의 이미지 파일을 이름순으로 읽어 일정 간격으로
//! `ImageFrameSource`에 밀어 넣는다. 카메라 스트림 대역.

use cardscan_core::error::CoreError;
use cardscan_vision::source::ImageFrameSource;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// 지원 확장자
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

/// 재생이 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// 종료 신호
    Shutdown,
    /// 소스가 해제됨 (카메라 세션 종료)
    SourceReleased,
    /// 반복 없이 마지막 프레임까지 재생
    Finished,
}

/// 프레임 시퀀스 플레이어
pub struct FramePlayer {
    frames: Vec<RgbaImage>,
    frame_interval: Duration,
    looping: bool,
}

impl FramePlayer {
    pub fn new(frames: Vec<RgbaImage>, frame_interval: Duration) -> Self {
        Self {
            frames,
            frame_interval,
            looping: true,
        }
    }

    /// 디렉토리의 이미지 파일을 이름순으로 로드
    pub fn load_dir(dir: &Path, frame_interval: Duration) -> Result<Self, CoreError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CoreError::validation(
                "frames",
                format!("이미지 파일 없음: {}", dir.display()),
            ));
        }

        let frames = paths
            .iter()
            .map(|p| {
                image::open(p)
                    .map(|img| img.to_rgba8())
                    .map_err(|e| CoreError::Decoding(format!("{}: {}", p.display(), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("프레임 {}개 로드: {}", frames.len(), dir.display());
        Ok(Self::new(frames, frame_interval))
    }

    /// 마지막 프레임에서 멈춤 (반복 안 함)
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 종료 신호 또는 소스 해제까지 프레임 공급
    pub async fn run(
        self,
        source: Arc<ImageFrameSource>,
        mut shutdown: watch::Receiver<bool>,
    ) -> PlaybackEnd {
        if self.frames.is_empty() {
            return PlaybackEnd::Finished;
        }

        let mut ticker = interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut index = 0usize;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!("프레임 플레이어 종료 신호");
                    return PlaybackEnd::Shutdown;
                }
                _ = ticker.tick() => {
                    if source.is_released() {
                        debug!("소스 해제됨, 재생 중지");
                        return PlaybackEnd::SourceReleased;
                    }
                    if index >= self.frames.len() {
                        if !self.looping {
                            return PlaybackEnd::Finished;
                        }
                        index = 0;
                    }
                    source.set_frame(self.frames[index].clone());
                    index += 1;
                }
            }
        }
    }
}
