//! 프레임 샘플러.
//!
//! 가이드 영역을 현재 프레임 크기에 맞춰 픽셀 사각형으로 바꾸고
//! 해당 영역의 RGBA 버퍼를 읽는다. 프레임 밖으로 걸친 부분은
//! 투명 검정(0)으로 채운다.

use cardscan_core::error::CoreError;
use cardscan_core::models::frame::{GuideRegion, PixelBuffer, PixelRect, BYTES_PER_PIXEL};
use cardscan_core::ports::frame_source::FrameSource;
use tracing::trace;

/// 샘플링 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    /// 소스 준비 안 됨 (크기 0 또는 퇴화 영역): 이번 틱은 건너뛴다
    NotReady,
    /// 영역 픽셀 버퍼
    Pixels(PixelBuffer),
}

/// 가이드 영역 샘플링
pub fn sample(source: &dyn FrameSource, region: &GuideRegion) -> Result<Sample, CoreError> {
    let (w, h) = source.dimensions();
    if w == 0 || h == 0 {
        return Ok(Sample::NotReady);
    }
    sample_rect(source, region.to_rect(w, h))
}

/// 픽셀 사각형 샘플링
///
/// 사각형이 프레임 안이면 그대로 읽고, 걸쳐 있으면 교집합만 읽어
/// 0으로 채운 버퍼의 해당 위치에 복사한다.
pub fn sample_rect(source: &dyn FrameSource, rect: PixelRect) -> Result<Sample, CoreError> {
    if rect.is_degenerate() {
        return Ok(Sample::NotReady);
    }

    let (w, h) = source.dimensions();
    if w == 0 || h == 0 {
        return Ok(Sample::NotReady);
    }

    if rect.fits_within(w, h) {
        let buffer = source.read_region(rect)?;
        check_dimensions(&buffer, rect)?;
        return Ok(Sample::Pixels(buffer));
    }

    let row_bytes = rect.width as usize * BYTES_PER_PIXEL;
    let mut data = vec![0u8; row_bytes * rect.height as usize];

    if let Some(inner) = rect.intersect_frame(w, h) {
        trace!("샘플 영역 클리핑: {:?} → {:?}", rect, inner);
        let part = source.read_region(inner)?;
        check_dimensions(&part, inner)?;

        let dx = (inner.x - rect.x) as usize;
        let dy = (inner.y - rect.y) as usize;
        let inner_row = inner.width as usize * BYTES_PER_PIXEL;
        let src = part.as_bytes();

        for row in 0..inner.height as usize {
            let src_off = row * inner_row;
            let dst_off = (dy + row) * row_bytes + dx * BYTES_PER_PIXEL;
            data[dst_off..dst_off + inner_row].copy_from_slice(&src[src_off..src_off + inner_row]);
        }
    }

    Ok(Sample::Pixels(PixelBuffer::new(
        rect.width,
        rect.height,
        data,
    )?))
}

fn check_dimensions(buffer: &PixelBuffer, rect: PixelRect) -> Result<(), CoreError> {
    if buffer.width() != rect.width || buffer.height() != rect.height {
        return Err(CoreError::PixelAccess(format!(
            "요청 {}x{}, 반환 {}x{}",
            rect.width,
            rect.height,
            buffer.width(),
            buffer.height()
        )));
    }
    Ok(())
}
