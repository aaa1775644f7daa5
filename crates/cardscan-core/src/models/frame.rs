//! 프레임 픽셀 모델.
//!
//! 샘플링된 RGBA 픽셀 버퍼, 픽셀 좌표 사각형, 프레임 비율 기반 가이드 영역.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// RGBA 픽셀당 바이트 수
pub const BYTES_PER_PIXEL: usize = 4;

/// 불변 RGBA 픽셀 버퍼 (row-major)
///
/// 샘플링 틱마다 생성되고 점수 계산 후 폐기된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// 원시 RGBA 바이트로 버퍼 생성 (길이 검증)
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(CoreError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// 단색 버퍼 생성
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// 좌표 함수로 버퍼 생성
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 원시 RGBA 바이트
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// 원시 바이트 소유권 반환
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// 픽셀 조회 (범위 밖이면 None)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let p = &self.data[idx..idx + BYTES_PER_PIXEL];
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 프레임 픽셀 좌표 사각형
///
/// 원점은 음수일 수 있다 (프레임 밖으로 걸친 가이드 영역).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 너비 또는 높이가 0인 퇴화 사각형 여부
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 프레임 범위 (0, 0, frame_w, frame_h)와의 교집합
    pub fn intersect_frame(&self, frame_w: u32, frame_h: u32) -> Option<PixelRect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(frame_w as i64);
        let y1 = (self.y + self.height as i64).min(frame_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// 프레임 안에 완전히 포함되는지 여부
    pub fn fits_within(&self, frame_w: u32, frame_h: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width as i64 <= frame_w as i64
            && self.y + self.height as i64 <= frame_h as i64
    }
}

/// 가이드 영역 배치 방식
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "anchor", rename_all = "snake_case")]
pub enum GuideAnchor {
    /// 프레임 비율 기준 좌상단 오프셋
    Offset { x: f64, y: f64 },
    /// 프레임 중앙 정렬
    Centered,
}

/// 가이드 오버레이 영역: 프레임 크기에 대한 비율로 정의
///
/// 높이는 항상 `width / aspect_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuideRegion {
    #[serde(flatten)]
    pub anchor: GuideAnchor,
    /// 프레임 너비 대비 가이드 너비 (0.0 ~ 1.0)
    pub width_fraction: f64,
    /// 너비 / 높이 비율 (ID 카드 1.6)
    pub aspect_ratio: f64,
}

impl GuideRegion {
    /// 감지 샘플링 영역: x=10%, y=30%, 너비 80%
    pub fn detection() -> Self {
        Self {
            anchor: GuideAnchor::Offset { x: 0.10, y: 0.30 },
            width_fraction: 0.80,
            aspect_ratio: 1.6,
        }
    }

    /// 최종 캡처 영역: 중앙 정렬, 너비 85%
    pub fn capture() -> Self {
        Self {
            anchor: GuideAnchor::Centered,
            width_fraction: 0.85,
            aspect_ratio: 1.6,
        }
    }

    /// 프레임 크기에 맞춰 픽셀 사각형 계산 (소수점 이하 버림)
    pub fn to_rect(&self, frame_w: u32, frame_h: u32) -> PixelRect {
        let width = (frame_w as f64 * self.width_fraction).floor().max(0.0);
        let height = if self.aspect_ratio > 0.0 {
            (width / self.aspect_ratio).floor().max(0.0)
        } else {
            0.0
        };

        let (x, y) = match self.anchor {
            GuideAnchor::Offset { x, y } => (
                (frame_w as f64 * x).floor(),
                (frame_h as f64 * y).floor(),
            ),
            GuideAnchor::Centered => (
                ((frame_w as f64 - width) / 2.0).floor(),
                ((frame_h as f64 - height) / 2.0).floor(),
            ),
        };

        PixelRect::new(x as i64, y as i64, width as u32, height as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_rejects_wrong_length() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidBuffer {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn filled_buffer_pixels() {
        let buf = PixelBuffer::filled(3, 2, [10, 20, 30, 255]);
        assert_eq!(buf.as_bytes().len(), 24);
        assert_eq!(buf.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(buf.pixel(3, 0), None);
    }

    #[test]
    fn detection_region_on_hd_frame() {
        let rect = GuideRegion::detection().to_rect(1280, 720);
        assert_eq!(rect, PixelRect::new(128, 216, 1024, 640));
        // 16:9 프레임에서는 아래쪽이 프레임 밖으로 나간다
        assert!(!rect.fits_within(1280, 720));
    }

    #[test]
    fn capture_region_is_centered() {
        let rect = GuideRegion::capture().to_rect(1000, 800);
        assert_eq!(rect.width, 850);
        assert_eq!(rect.height, 531);
        assert_eq!(rect.x, 75);
        assert_eq!(rect.y, 134);
    }

    #[test]
    fn zero_sized_frame_degenerates() {
        assert!(GuideRegion::detection().to_rect(0, 0).is_degenerate());
        assert!(GuideRegion::capture().to_rect(1, 1).is_degenerate());
    }

    #[test]
    fn intersect_clips_to_frame() {
        let rect = PixelRect::new(-10, 5, 50, 100);
        let clipped = rect.intersect_frame(30, 40).unwrap();
        assert_eq!(clipped, PixelRect::new(0, 5, 30, 35));
        assert!(PixelRect::new(40, 0, 10, 10).intersect_frame(30, 40).is_none());
    }

    #[test]
    fn guide_region_serde_shape() {
        let json = serde_json::to_value(GuideRegion::detection()).unwrap();
        assert_eq!(json["anchor"], "offset");
        assert_eq!(json["width_fraction"], 0.8);
        let back: GuideRegion = serde_json::from_value(json).unwrap();
        assert_eq!(back, GuideRegion::detection());
    }
}
