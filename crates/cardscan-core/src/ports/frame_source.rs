//! 프레임 소스 포트.
//!
//! 구현: `cardscan-app` (이미지 시퀀스 플레이어), 테스트용 고정 프레임

use crate::error::CoreError;
use crate::models::frame::{PixelBuffer, PixelRect};

/// 라이브 픽셀 소스 (카메라 영상 대역)
///
/// 한 번에 하나의 카메라 세션만 소스를 소유한다.
pub trait FrameSource: Send + Sync {
    /// 현재 프레임 크기 `(width, height)`. 준비 전이면 `(0, 0)`.
    fn dimensions(&self) -> (u32, u32);

    /// 현재 순간의 프레임에서 사각형 영역 RGBA 픽셀 읽기.
    ///
    /// `rect`는 항상 프레임 범위 안쪽으로 전달된다.
    fn read_region(&self, rect: PixelRect) -> Result<PixelBuffer, CoreError>;

    /// 소스 해제 (카메라 트랙 정지). 기본 구현은 no-op.
    fn release(&self) {}
}
