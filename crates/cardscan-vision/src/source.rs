//! 인메모리 프레임 소스.
//!
//! `FrameSource` 포트 구현. 외부(카메라 드라이버, 이미지 시퀀스 플레이어)가
//! 최신 프레임을 밀어 넣고, 코어는 틱마다 영역을 읽는다.

use cardscan_core::error::CoreError;
use cardscan_core::models::frame::{PixelBuffer, PixelRect};
use cardscan_core::ports::frame_source::FrameSource;
use image::RgbaImage;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// 최신 프레임 하나를 보관하는 소스: `FrameSource` 포트 구현
#[derive(Debug, Default)]
pub struct ImageFrameSource {
    frame: RwLock<Option<RgbaImage>>,
    released: AtomicBool,
}

impl ImageFrameSource {
    /// 빈 소스 생성 (첫 프레임 전까지 크기 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 프레임으로 생성
    pub fn with_frame(frame: RgbaImage) -> Self {
        Self {
            frame: RwLock::new(Some(frame)),
            released: AtomicBool::new(false),
        }
    }

    /// 현재 프레임 교체
    pub fn set_frame(&self, frame: RgbaImage) {
        if self.is_released() {
            return;
        }
        *self.frame.write() = Some(frame);
    }

    /// 프레임 제거 (소스는 열린 채 준비 안 됨 상태로)
    pub fn clear(&self) {
        *self.frame.write() = None;
    }

    /// 해제 여부
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl FrameSource for ImageFrameSource {
    fn dimensions(&self) -> (u32, u32) {
        if self.is_released() {
            return (0, 0);
        }
        self.frame
            .read()
            .as_ref()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0))
    }

    fn read_region(&self, rect: PixelRect) -> Result<PixelBuffer, CoreError> {
        let guard = self.frame.read();
        let frame = guard
            .as_ref()
            .ok_or_else(|| CoreError::PixelAccess("프레임 없음".to_string()))?;

        let (w, h) = frame.dimensions();
        if !rect.fits_within(w, h) {
            return Err(CoreError::PixelAccess(format!(
                "영역이 프레임 밖: {:?} (프레임 {}x{})",
                rect, w, h
            )));
        }

        let region = image::imageops::crop_imm(
            frame,
            rect.x as u32,
            rect.y as u32,
            rect.width,
            rect.height,
        )
        .to_image();

        PixelBuffer::new(rect.width, rect.height, region.into_raw())
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
        *self.frame.write() = None;
        debug!("프레임 소스 해제");
    }
}
